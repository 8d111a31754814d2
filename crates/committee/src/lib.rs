//! Investment Committee
//!
//! Runs a structured debate about a stock ticker: a Bull and a Bear persona
//! argue from live market data, rebut each other, and a Portfolio Manager
//! persona issues a BUY, SELL or HOLD verdict.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use committee::models::{CommitteeConfig, DebateSession, Decision};
//! use committee::agents::{DebateOrchestrator, NoopObserver};
//! use committee::{build_orchestrator, run_batch, Credentials};
//! ```

pub use committee_agents as agents;
pub use committee_models as models;
pub use committee_quotes as quotes;

pub mod render;

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use committee_agents::{
    build_backend, AdvocateAgent, DebateFailure, DebateObserver, DebateOrchestrator, DecisionAgent,
};
use committee_models::config::{AgentsConfig, CommitteeConfig, PersonaConfig, ProviderKind};
use committee_models::DebateSession;
use committee_quotes::{QuoteFetcher, YahooProvider};
use tracing::{debug, info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "config/committee.toml";

/// Load configuration from `path`.
///
/// A missing file is only an error when the path was given explicitly;
/// otherwise the built-in defaults are used.
pub fn load_config(path: &Path, explicit: bool) -> anyhow::Result<CommitteeConfig> {
    if !explicit && !path.exists() {
        debug!(path = %path.display(), "No config file, using defaults");
        return Ok(CommitteeConfig::default());
    }

    let config_str = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let config: CommitteeConfig = toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse config: {}", path.display()))?;
    Ok(config)
}

/// Apply the provider and model environment overrides.
///
/// `env` is the variable lookup, usually `|k| std::env::var(k).ok()`.
pub fn apply_env_overrides<F>(config: &mut CommitteeConfig, env: F) -> anyhow::Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let agents = &mut config.agents;

    for (var, persona) in [
        ("BULL_PROVIDER", &mut agents.bull),
        ("BEAR_PROVIDER", &mut agents.bear),
        ("PM_PROVIDER", &mut agents.decision),
    ] {
        if let Some(value) = env(var).filter(|v| !v.trim().is_empty()) {
            persona.provider = value
                .parse::<ProviderKind>()
                .map_err(|e| anyhow::anyhow!("{var}: {e}"))?;
        }
    }

    if let Some(model) = env("ANTHROPIC_MODEL").filter(|v| !v.trim().is_empty()) {
        agents.anthropic_model = model;
    }
    if let Some(model) = env("OPENAI_MODEL").filter(|v| !v.trim().is_empty()) {
        agents.openai_model = model;
    }
    Ok(())
}

/// API keys for the HTTP providers. Read from the environment only.
#[derive(Clone, Default)]
pub struct Credentials {
    pub anthropic: Option<String>,
    pub openai: Option<String>,
}

impl Credentials {
    pub fn from_env<F>(env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |kind: ProviderKind| {
            kind.api_key_var()
                .and_then(&env)
                .filter(|k| !k.trim().is_empty())
        };
        Self {
            anthropic: read(ProviderKind::Anthropic),
            openai: read(ProviderKind::OpenAi),
        }
    }

    pub fn key_for(&self, kind: ProviderKind) -> Option<String> {
        match kind {
            ProviderKind::Anthropic => self.anthropic.clone(),
            ProviderKind::OpenAi => self.openai.clone(),
            ProviderKind::ClaudeCli => None,
        }
    }

    /// Fail unless every HTTP provider bound to a persona has a key.
    pub fn validate(&self, agents: &AgentsConfig) -> anyhow::Result<()> {
        for kind in agents.providers_in_use() {
            let Some(var) = kind.api_key_var() else {
                continue;
            };
            if self.key_for(kind).is_none() {
                let roles: Vec<&str> = role_personas(agents)
                    .into_iter()
                    .filter(|(_, persona)| persona.provider == kind)
                    .map(|(role, _)| role)
                    .collect();
                bail!(
                    "{var} is not set but the {} persona{} use{} the {kind} provider",
                    roles.join(" and "),
                    if roles.len() > 1 { "s" } else { "" },
                    if roles.len() > 1 { "" } else { "s" },
                );
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("anthropic", &self.anthropic.as_ref().map(|_| "<set>"))
            .field("openai", &self.openai.as_ref().map(|_| "<set>"))
            .finish()
    }
}

fn role_personas(agents: &AgentsConfig) -> [(&'static str, &PersonaConfig); 3] {
    [
        ("Bull", &agents.bull),
        ("Bear", &agents.bear),
        ("Portfolio Manager", &agents.decision),
    ]
}

/// `(role, "provider/model")` for each persona, in debate order.
pub fn role_bindings(agents: &AgentsConfig) -> Vec<(&'static str, String)> {
    role_personas(agents)
        .into_iter()
        .map(|(role, persona)| {
            (
                role,
                format!("{}/{}", persona.provider, agents.model_for(persona)),
            )
        })
        .collect()
}

/// Build a DebateOrchestrator from configuration.
///
/// Credentials are validated first so a missing key fails before any ticker runs.
pub fn build_orchestrator(
    config: &CommitteeConfig,
    credentials: &Credentials,
) -> anyhow::Result<DebateOrchestrator> {
    credentials.validate(&config.agents)?;

    let provider = YahooProvider::new(config.quotes.clone())
        .context("Failed to build quote provider")?;
    let fetcher = QuoteFetcher::new(Arc::new(provider), config.quotes.suffix_rules.clone());

    let agents = &config.agents;
    let backend_for = |role: &str, persona: &PersonaConfig| {
        build_backend(agents, persona, credentials.key_for(persona.provider))
            .with_context(|| format!("Failed to build the {role} backend"))
    };

    let bull = AdvocateAgent::bull(backend_for("Bull", &agents.bull)?);
    let bear = AdvocateAgent::bear(backend_for("Bear", &agents.bear)?);
    let decision = DecisionAgent::new(backend_for("Portfolio Manager", &agents.decision)?);

    for (role, binding) in role_bindings(agents) {
        info!(role, backend = %binding, "Persona bound");
    }

    Ok(DebateOrchestrator::new(
        fetcher,
        Arc::new(bull),
        Arc::new(bear),
        Arc::new(decision),
    ))
}

/// Run one debate per ticker, in order.
///
/// A failed ticker never stops the batch. `on_result` sees each outcome as
/// soon as it is known.
pub async fn run_batch<F>(
    orchestrator: &DebateOrchestrator,
    tickers: &[String],
    observer: &dyn DebateObserver,
    mut on_result: F,
) -> Vec<Result<DebateSession, DebateFailure>>
where
    F: FnMut(&Result<DebateSession, DebateFailure>),
{
    let mut results = Vec::with_capacity(tickers.len());
    for ticker in tickers {
        let result = orchestrator.run(ticker, observer).await;
        on_result(&result);
        results.push(result);
    }

    let failed = results.iter().filter(|r| r.is_err()).count();
    info!(total = results.len(), failed, "Batch complete");
    results
}

/// Run one debate unless `interrupt` resolves first.
///
/// `None` means the debate was abandoned mid-flight; its in-flight reasoning
/// calls are dropped and no verdict exists.
pub async fn run_interruptible<I>(
    orchestrator: &DebateOrchestrator,
    ticker: &str,
    observer: &dyn DebateObserver,
    interrupt: I,
) -> Option<Result<DebateSession, DebateFailure>>
where
    I: Future<Output = ()>,
{
    tokio::select! {
        biased;
        _ = interrupt => {
            warn!(ticker, "Debate interrupted");
            None
        }
        result = orchestrator.run(ticker, observer) => Some(result),
    }
}

/// Process exit status for a set of outcomes: 0 only if every debate produced a verdict.
pub fn exit_status(results: &[Result<DebateSession, DebateFailure>]) -> u8 {
    if results.iter().all(|r| r.is_ok()) {
        0
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use committee_agents::test_support::{
        advocate_response, ScriptedBackend, ScriptedCommittee, StubQuoteProvider,
    };
    use committee_agents::{FailureKind, NoopObserver};
    use committee_models::{Decision, Stance};
    use committee_quotes::QuoteFetcher;
    use std::collections::HashMap;
    use std::io::Write;
    use std::time::Duration;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_default_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("committee.toml");

        let config = load_config(&path, false).unwrap();
        assert_eq!(config, CommitteeConfig::default());
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");

        let err = load_config(&path, true).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }

    #[test]
    fn config_file_is_parsed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[quotes]
headline_limit = 2

[agents.bear]
provider = "claude_cli"
"#
        )
        .unwrap();

        let config = load_config(file.path(), true).unwrap();
        assert_eq!(config.quotes.headline_limit, 2);
        assert_eq!(config.agents.bear.provider, ProviderKind::ClaudeCli);
        assert_eq!(config.agents.bull.provider, ProviderKind::Anthropic);
    }

    #[test]
    fn invalid_config_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[agents]\ncall_timeout_seconds = \"soon\"").unwrap();

        let err = load_config(file.path(), true).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn env_overrides_switch_providers_and_models() {
        let mut config = CommitteeConfig::default();
        let env = env_of(&[
            ("BULL_PROVIDER", "openai"),
            ("PM_PROVIDER", "Anthropic"),
            ("ANTHROPIC_MODEL", "claude-3-opus-20240229"),
            ("OPENAI_MODEL", ""),
        ]);

        apply_env_overrides(&mut config, env).unwrap();

        assert_eq!(config.agents.bull.provider, ProviderKind::OpenAi);
        assert_eq!(config.agents.bear.provider, ProviderKind::Anthropic);
        assert_eq!(config.agents.decision.provider, ProviderKind::Anthropic);
        assert_eq!(config.agents.anthropic_model, "claude-3-opus-20240229");
        assert_eq!(config.agents.openai_model, "gpt-4-turbo-preview");
    }

    #[test]
    fn unknown_provider_override_is_an_error() {
        let mut config = CommitteeConfig::default();
        let err = apply_env_overrides(&mut config, env_of(&[("BEAR_PROVIDER", "gemini")]))
            .unwrap_err();
        assert!(err.to_string().contains("BEAR_PROVIDER"));
        assert!(err.to_string().contains("gemini"));
    }

    #[test]
    fn credentials_ignore_blank_keys() {
        let creds = Credentials::from_env(env_of(&[
            ("ANTHROPIC_API_KEY", "sk-ant-test"),
            ("OPENAI_API_KEY", "   "),
        ]));
        assert_eq!(creds.anthropic.as_deref(), Some("sk-ant-test"));
        assert!(creds.openai.is_none());
        assert!(!format!("{creds:?}").contains("sk-ant-test"));
    }

    #[test]
    fn missing_key_names_variable_and_roles() {
        let agents = AgentsConfig::default();
        let creds = Credentials {
            anthropic: None,
            openai: Some("sk-test".to_string()),
        };

        let err = creds.validate(&agents).unwrap_err().to_string();
        assert!(err.contains("ANTHROPIC_API_KEY"));
        assert!(err.contains("Bull and Bear personas use the anthropic provider"));
    }

    #[test]
    fn claude_cli_needs_no_key() {
        let mut agents = AgentsConfig::default();
        agents.bull.provider = ProviderKind::ClaudeCli;
        agents.bear.provider = ProviderKind::ClaudeCli;
        agents.decision.provider = ProviderKind::ClaudeCli;

        assert!(Credentials::default().validate(&agents).is_ok());
    }

    #[test]
    fn build_orchestrator_validates_before_building() {
        let err = build_orchestrator(&CommitteeConfig::default(), &Credentials::default())
            .err()
            .unwrap();
        assert!(err.to_string().contains("is not set"));

        let creds = Credentials {
            anthropic: Some("sk-ant-test".to_string()),
            openai: Some("sk-test".to_string()),
        };
        assert!(build_orchestrator(&CommitteeConfig::default(), &creds).is_ok());
    }

    #[test]
    fn role_bindings_reflect_overrides() {
        let mut agents = AgentsConfig::default();
        agents.bear.model = Some("claude-3-haiku-20240307".to_string());

        let bindings = role_bindings(&agents);
        assert_eq!(bindings[0], ("Bull", "anthropic/claude-3-5-sonnet-20241022".to_string()));
        assert_eq!(bindings[1], ("Bear", "anthropic/claude-3-haiku-20240307".to_string()));
        assert_eq!(
            bindings[2],
            ("Portfolio Manager", "openai/gpt-4-turbo-preview".to_string())
        );
    }

    #[tokio::test]
    async fn batch_continues_past_failures() {
        let committee = ScriptedCommittee::new("BUY");
        let orchestrator =
            committee.orchestrator(Arc::new(StubQuoteProvider::with_symbols(&["AAPL"])));
        let tickers = vec!["FAKESTOCK".to_string(), "AAPL".to_string()];
        let mut seen = Vec::new();

        let results = run_batch(&orchestrator, &tickers, &NoopObserver, |r| {
            seen.push(r.is_ok());
        })
        .await;

        assert_eq!(seen, vec![false, true]);
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0].as_ref().unwrap_err().kind(),
            FailureKind::TickerNotFound
        );
        assert_eq!(
            results[1].as_ref().unwrap().verdict.decision,
            Decision::Buy
        );
        assert_eq!(exit_status(&results), 1);
        assert_eq!(exit_status(&results[1..]), 0);
    }

    #[tokio::test]
    async fn interrupt_abandons_debate_before_verdict() {
        let committee = ScriptedCommittee::new("BUY");
        let slow_bull = Arc::new(
            ScriptedBackend::new(vec![advocate_response(
                Stance::Bull,
                "Growth.",
                "- Growth",
                "0.7",
            )])
            .with_delay(Duration::from_secs(5)),
        );
        let orchestrator = DebateOrchestrator::new(
            QuoteFetcher::new(Arc::new(StubQuoteProvider::with_symbols(&["AAPL"])), vec![]),
            Arc::new(AdvocateAgent::bull(slow_bull.clone())),
            Arc::new(AdvocateAgent::bear(committee.bear.clone())),
            Arc::new(DecisionAgent::new(committee.decision.clone())),
        );

        let outcome = run_interruptible(
            &orchestrator,
            "AAPL",
            &NoopObserver,
            tokio::time::sleep(Duration::from_millis(20)),
        )
        .await;

        assert!(outcome.is_none());
        assert_eq!(slow_bull.calls().len(), 1);
        assert!(committee.decision.calls().is_empty());

        // The same orchestrator keeps serving later tickers
        let committee = ScriptedCommittee::new("HOLD");
        let orchestrator =
            committee.orchestrator(Arc::new(StubQuoteProvider::with_symbols(&["AAPL"])));
        let outcome = run_interruptible(
            &orchestrator,
            "AAPL",
            &NoopObserver,
            std::future::pending::<()>(),
        )
        .await;
        assert_eq!(
            outcome.unwrap().unwrap().verdict.decision,
            Decision::Hold
        );
    }
}
