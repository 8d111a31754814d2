//! Test support module providing scripted reasoning backends.
//!
//! `ScriptedBackend` replays canned model answers in call order and records
//! every prompt it receives, so tests can drive the real persona agents and
//! orchestrator without any network access.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use committee_models::config::QuoteConfig;
use committee_models::Stance;
use committee_quotes::QuoteFetcher;

use crate::backend::ReasoningBackend;
use crate::error::AgentError;
use crate::orchestrator::DebateOrchestrator;
use crate::persona::{AdvocateAgent, DecisionAgent};
use crate::prompts::thesis_tag;

pub use committee_quotes::test_support::{snapshot_for, StubQuoteProvider};

/// One prompt pair seen by a scripted backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub system_prompt: String,
    pub user_prompt: String,
}

pub struct ScriptedBackend {
    name: String,
    script: Mutex<VecDeque<Result<String, AgentError>>>,
    delay: Duration,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedBackend {
    /// Answers with `responses` in order; further calls fail.
    pub fn new(responses: Vec<String>) -> Self {
        Self::with_results(responses.into_iter().map(Ok).collect())
    }

    pub fn with_results(results: Vec<Result<String, AgentError>>) -> Self {
        Self {
            name: "scripted".to_string(),
            script: Mutex::new(results.into()),
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with a backend error.
    pub fn failing(message: &str) -> Self {
        Self::with_results(vec![Err(AgentError::Backend(message.to_string()))])
    }

    /// Sleep before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ReasoningBackend for ScriptedBackend {
    fn describe(&self) -> String {
        format!("scripted/{}", self.name)
    }

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AgentError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                system_prompt: system_prompt.to_string(),
                user_prompt: user_prompt.to_string(),
            });
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let next = self
            .script
            .lock()
            .map_err(|e| AgentError::Backend(format!("script lock poisoned: {e}")))?
            .pop_front();

        match next {
            Some(result) => result,
            None => Err(AgentError::Backend(format!(
                "{} script exhausted",
                self.describe()
            ))),
        }
    }
}

/// A fully tagged opening answer for `stance`.
pub fn advocate_response(stance: Stance, thesis: &str, key_points: &str, confidence: &str) -> String {
    let tag = thesis_tag(stance);
    format!(
        "<key_points>\n{key_points}\n</key_points>\n\n<{tag}>\n{thesis}\n</{tag}>\n\n\
         <confidence>{confidence}</confidence>"
    )
}

pub fn rebuttal_response(text: &str) -> String {
    format!("<rebuttal>\n{text}\n</rebuttal>")
}

pub fn decision_response(decision: &str, justification: &str) -> String {
    format!("<decision>{decision}</decision>\n<justification>\n{justification}\n</justification>")
}

/// Backends for one full debate that ends in `decision`.
pub struct ScriptedCommittee {
    pub bull: Arc<ScriptedBackend>,
    pub bear: Arc<ScriptedBackend>,
    pub decision: Arc<ScriptedBackend>,
}

impl ScriptedCommittee {
    pub fn new(decision: &str) -> Self {
        Self {
            bull: Arc::new(
                ScriptedBackend::new(vec![
                    advocate_response(
                        Stance::Bull,
                        "Demand for the core product keeps outrunning supply.",
                        "- Demand outruns supply\n- Expanding margins",
                        "0.8",
                    ),
                    rebuttal_response("Regulatory noise has never dented earnings."),
                ])
                .named("bull"),
            ),
            bear: Arc::new(
                ScriptedBackend::new(vec![
                    advocate_response(
                        Stance::Bear,
                        "The multiple already prices in a decade of perfect execution.",
                        "- Stretched valuation\n- Regulatory inquiry",
                        "0.65",
                    ),
                    rebuttal_response("Supply catches up and margins mean-revert."),
                ])
                .named("bear"),
            ),
            decision: Arc::new(
                ScriptedBackend::new(vec![decision_response(
                    decision,
                    "The growth case outweighs the valuation concerns for now.",
                )])
                .named("decision"),
            ),
        }
    }

    /// Orchestrator over these backends and `provider`, with the default suffix table.
    pub fn orchestrator(&self, provider: Arc<StubQuoteProvider>) -> DebateOrchestrator {
        DebateOrchestrator::new(
            QuoteFetcher::new(provider, QuoteConfig::default().suffix_rules),
            Arc::new(AdvocateAgent::bull(self.bull.clone())),
            Arc::new(AdvocateAgent::bear(self.bear.clone())),
            Arc::new(DecisionAgent::new(self.decision.clone())),
        )
    }
}
