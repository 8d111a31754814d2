use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Top-level configuration for the committee.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CommitteeConfig {
    pub quotes: QuoteConfig,
    pub agents: AgentsConfig,
}

/// Configuration for the quote fetcher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QuoteConfig {
    /// Yahoo Finance chart endpoint (price, 52-week range, volume).
    pub chart_url: String,
    /// Yahoo Finance search endpoint (news headlines).
    pub search_url: String,
    /// Yahoo Finance quote summary endpoint (P/E, market cap). Best effort.
    pub summary_url: String,
    /// Maximum number of headlines kept on a snapshot.
    pub headline_limit: usize,
    /// HTTP timeout for every provider request.
    pub timeout_seconds: u64,
    /// Exchange-suffix corrections, evaluated in order.
    pub suffix_rules: Vec<SuffixRule>,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            chart_url: "https://query1.finance.yahoo.com/v8/finance/chart".to_string(),
            search_url: "https://query1.finance.yahoo.com/v1/finance/search".to_string(),
            summary_url: "https://query2.finance.yahoo.com/v10/finance/quoteSummary".to_string(),
            headline_limit: 5,
            timeout_seconds: 20,
            suffix_rules: vec![SuffixRule {
                pattern: SymbolPattern::ShareClass,
                suffix: ".ST".to_string(),
                market: "Stockholm".to_string(),
            }],
        }
    }
}

/// Maps a bare-symbol shape to the exchange suffix tried when the bare lookup fails.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuffixRule {
    pub pattern: SymbolPattern,
    /// Appended verbatim, including the leading dot (e.g. ".ST").
    pub suffix: String,
    /// Human-readable exchange name, only used in logs.
    pub market: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SymbolPattern {
    /// Base symbol, one hyphen, share class letters: `SAAB-B`, `ERIC-B`.
    ShareClass,
    /// Digits only: `7203`.
    Numeric,
    /// Letters only: `NOKIA`.
    Alphabetic,
}

impl SymbolPattern {
    pub fn matches(self, symbol: &str) -> bool {
        if symbol.is_empty() {
            return false;
        }
        match self {
            SymbolPattern::ShareClass => match symbol.split_once('-') {
                Some((base, class)) => {
                    !base.is_empty()
                        && !class.is_empty()
                        && base.chars().all(|c| c.is_ascii_alphanumeric())
                        && class.chars().all(|c| c.is_ascii_alphabetic())
                }
                None => false,
            },
            SymbolPattern::Numeric => symbol.chars().all(|c| c.is_ascii_digit()),
            SymbolPattern::Alphabetic => symbol.chars().all(|c| c.is_ascii_alphabetic()),
        }
    }
}

/// Which reasoning service a persona talks to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Anthropic,
    #[serde(rename = "openai")]
    OpenAi,
    ClaudeCli,
}

impl ProviderKind {
    /// Environment variable holding the API key, if the provider needs one.
    pub fn api_key_var(self) -> Option<&'static str> {
        match self {
            ProviderKind::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderKind::OpenAi => Some("OPENAI_API_KEY"),
            ProviderKind::ClaudeCli => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::OpenAi => "openai",
            ProviderKind::ClaudeCli => "claude_cli",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" => Ok(ProviderKind::Anthropic),
            "openai" => Ok(ProviderKind::OpenAi),
            "claude_cli" | "claude-cli" => Ok(ProviderKind::ClaudeCli),
            other => Err(format!(
                "unknown provider '{other}' (expected anthropic, openai or claude_cli)"
            )),
        }
    }
}

/// Configuration for the persona agents and their backends.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentsConfig {
    /// Timeout for a single reasoning call in seconds.
    pub call_timeout_seconds: u64,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Default models per provider; a persona may override.
    pub anthropic_model: String,
    pub openai_model: String,
    pub claude_cli_model: String,
    pub anthropic_url: String,
    pub openai_url: String,
    pub bull: PersonaConfig,
    pub bear: PersonaConfig,
    pub decision: PersonaConfig,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            call_timeout_seconds: 90,
            max_tokens: 2000,
            temperature: 0.7,
            anthropic_model: "claude-3-5-sonnet-20241022".to_string(),
            openai_model: "gpt-4-turbo-preview".to_string(),
            claude_cli_model: "claude-3-5-haiku-latest".to_string(),
            anthropic_url: "https://api.anthropic.com/v1/messages".to_string(),
            openai_url: "https://api.openai.com/v1/chat/completions".to_string(),
            bull: PersonaConfig::new(ProviderKind::Anthropic),
            bear: PersonaConfig::new(ProviderKind::Anthropic),
            decision: PersonaConfig::new(ProviderKind::OpenAi),
        }
    }
}

impl AgentsConfig {
    /// The model a persona will use: its override, else the provider default.
    pub fn model_for(&self, persona: &PersonaConfig) -> String {
        if let Some(model) = &persona.model {
            return model.clone();
        }
        match persona.provider {
            ProviderKind::Anthropic => self.anthropic_model.clone(),
            ProviderKind::OpenAi => self.openai_model.clone(),
            ProviderKind::ClaudeCli => self.claude_cli_model.clone(),
        }
    }

    /// Providers in use across all three personas, deduplicated.
    pub fn providers_in_use(&self) -> Vec<ProviderKind> {
        let mut kinds = Vec::new();
        for persona in [&self.bull, &self.bear, &self.decision] {
            if !kinds.contains(&persona.provider) {
                kinds.push(persona.provider);
            }
        }
        kinds
    }
}

/// Backend binding for one persona.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonaConfig {
    pub provider: ProviderKind,
    /// Override model for this persona. Falls back to the provider default.
    #[serde(default)]
    pub model: Option<String>,
}

impl PersonaConfig {
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            provider,
            model: None,
        }
    }
}
