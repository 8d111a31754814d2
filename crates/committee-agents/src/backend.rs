use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use committee_models::config::{AgentsConfig, PersonaConfig, ProviderKind};
use serde_json::Value;
use tracing::{debug, warn};

use crate::claude_cli::{ClaudeCliBackend, ClaudeCliConfig};
use crate::error::AgentError;

/// A stateless text-completion service. Mockable for testing.
#[async_trait]
pub trait ReasoningBackend: Send + Sync {
    /// `provider/model`, for logs and the terminal banner.
    fn describe(&self) -> String;

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AgentError>;
}

/// Sampling and timeout settings shared by the HTTP backends.
#[derive(Debug, Clone)]
pub struct CallSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl CallSettings {
    pub fn for_persona(config: &AgentsConfig, persona: &PersonaConfig) -> Self {
        Self {
            model: config.model_for(persona),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout: Duration::from_secs(config.call_timeout_seconds),
        }
    }
}

/// Build the backend a persona is bound to.
///
/// `api_key` must be present for the HTTP providers.
pub fn build_backend(
    config: &AgentsConfig,
    persona: &PersonaConfig,
    api_key: Option<String>,
) -> Result<Arc<dyn ReasoningBackend>, AgentError> {
    let settings = CallSettings::for_persona(config, persona);
    let require_key = |key: Option<String>| {
        key.filter(|k| !k.trim().is_empty()).ok_or_else(|| {
            AgentError::Backend(format!(
                "{} is not set",
                persona.provider.api_key_var().unwrap_or("API key")
            ))
        })
    };

    let backend: Arc<dyn ReasoningBackend> = match persona.provider {
        ProviderKind::Anthropic => Arc::new(AnthropicBackend::new(
            require_key(api_key)?,
            config.anthropic_url.clone(),
            settings,
        )?),
        ProviderKind::OpenAi => Arc::new(OpenAiBackend::new(
            require_key(api_key)?,
            config.openai_url.clone(),
            settings,
        )?),
        ProviderKind::ClaudeCli => Arc::new(ClaudeCliBackend::new(ClaudeCliConfig {
            model: settings.model,
            timeout: settings.timeout,
        })),
    };
    Ok(backend)
}

/// Bound a reasoning call by the configured timeout.
pub(crate) async fn with_timeout<F>(timeout: Duration, call: F) -> Result<String, AgentError>
where
    F: Future<Output = Result<String, AgentError>>,
{
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| AgentError::Timeout(timeout))?
}

fn http_client() -> Result<reqwest::Client, AgentError> {
    Ok(reqwest::Client::builder().build()?)
}

async fn read_json(response: reqwest::Response, provider: &str) -> Result<Value, AgentError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        warn!(provider, status = %status, "Reasoning API returned an error");
        return Err(AgentError::Backend(format!(
            "{provider} API error ({status}): {body}"
        )));
    }
    Ok(response.json().await?)
}

/// Anthropic Messages API.
pub struct AnthropicBackend {
    api_key: String,
    url: String,
    settings: CallSettings,
    client: reqwest::Client,
}

impl AnthropicBackend {
    pub fn new(api_key: String, url: String, settings: CallSettings) -> Result<Self, AgentError> {
        Ok(Self {
            api_key,
            url,
            settings,
            client: http_client()?,
        })
    }

    fn request_body(&self, system_prompt: &str, user_prompt: &str) -> Value {
        serde_json::json!({
            "model": self.settings.model,
            "max_tokens": self.settings.max_tokens,
            "temperature": self.settings.temperature,
            "system": system_prompt,
            "messages": [{
                "role": "user",
                "content": user_prompt
            }]
        })
    }
}

#[async_trait]
impl ReasoningBackend for AnthropicBackend {
    fn describe(&self) -> String {
        format!("anthropic/{}", self.settings.model)
    }

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AgentError> {
        debug!(model = %self.settings.model, "Calling Anthropic Messages API");
        let body = self.request_body(system_prompt, user_prompt);

        with_timeout(self.settings.timeout, async {
            let response = self
                .client
                .post(&self.url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", "2023-06-01")
                .header("content-type", "application/json")
                .json(&body)
                .send()
                .await?;
            let json = read_json(response, "Anthropic").await?;
            anthropic_text(&json)
        })
        .await
    }
}

/// OpenAI Chat Completions API.
pub struct OpenAiBackend {
    api_key: String,
    url: String,
    settings: CallSettings,
    client: reqwest::Client,
}

impl OpenAiBackend {
    pub fn new(api_key: String, url: String, settings: CallSettings) -> Result<Self, AgentError> {
        Ok(Self {
            api_key,
            url,
            settings,
            client: http_client()?,
        })
    }

    fn request_body(&self, system_prompt: &str, user_prompt: &str) -> Value {
        serde_json::json!({
            "model": self.settings.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt}
            ],
            "max_tokens": self.settings.max_tokens,
            "temperature": self.settings.temperature
        })
    }
}

#[async_trait]
impl ReasoningBackend for OpenAiBackend {
    fn describe(&self) -> String {
        format!("openai/{}", self.settings.model)
    }

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AgentError> {
        debug!(model = %self.settings.model, "Calling OpenAI Chat Completions API");
        let body = self.request_body(system_prompt, user_prompt);

        with_timeout(self.settings.timeout, async {
            let response = self
                .client
                .post(&self.url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await?;
            let json = read_json(response, "OpenAI").await?;
            openai_text(&json)
        })
        .await
    }
}

/// Concatenated text blocks of a Messages API response.
pub fn anthropic_text(response: &Value) -> Result<String, AgentError> {
    let text: String = response["content"]
        .as_array()
        .map(|blocks| {
            blocks
                .iter()
                .filter(|b| b["type"].as_str().map_or(true, |t| t == "text"))
                .filter_map(|b| b["text"].as_str())
                .collect()
        })
        .unwrap_or_default();
    non_empty(text, "Anthropic")
}

/// First choice's message content of a Chat Completions response.
pub fn openai_text(response: &Value) -> Result<String, AgentError> {
    let text = response["choices"][0]["message"]["content"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    non_empty(text, "OpenAI")
}

fn non_empty(text: String, provider: &str) -> Result<String, AgentError> {
    if text.trim().is_empty() {
        return Err(AgentError::Backend(format!(
            "{provider} returned empty response"
        )));
    }
    Ok(text)
}
