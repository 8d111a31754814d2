use std::sync::Arc;

use async_trait::async_trait;
use committee_models::{QuoteSnapshot, Rebuttal, Stance, Thesis, Verdict};
use tracing::debug;

use crate::backend::ReasoningBackend;
use crate::error::AgentError;
use crate::parser::{parse_rebuttal, parse_thesis, parse_verdict};
use crate::prompts::{
    advocate_system_prompt, analysis_prompt, decision_prompt, decision_system_prompt,
    rebuttal_prompt,
};

/// One side of the debate. Mockable for testing.
#[async_trait]
pub trait Advocate: Send + Sync {
    fn stance(&self) -> Stance;

    /// Opening argument from the market data alone.
    async fn analyze(&self, snapshot: &QuoteSnapshot) -> Result<Thesis, AgentError>;

    /// Counter-argument once both opening theses exist.
    async fn rebut(&self, own: &Thesis, opposing: &Thesis) -> Result<Rebuttal, AgentError>;
}

/// The persona that turns the debate into a verdict. Mockable for testing.
#[async_trait]
pub trait Arbiter: Send + Sync {
    async fn decide(
        &self,
        snapshot: &QuoteSnapshot,
        bull_thesis: &Thesis,
        bear_thesis: &Thesis,
        bull_rebuttal: &Rebuttal,
        bear_rebuttal: &Rebuttal,
    ) -> Result<Verdict, AgentError>;
}

/// Bull or Bear persona: the stance selects the prompt templates, the backend
/// is whatever the persona was bound to at startup. Holds no memory between calls.
pub struct AdvocateAgent {
    stance: Stance,
    system_prompt: String,
    backend: Arc<dyn ReasoningBackend>,
}

impl AdvocateAgent {
    pub fn new(stance: Stance, backend: Arc<dyn ReasoningBackend>) -> Self {
        Self {
            stance,
            system_prompt: advocate_system_prompt(stance),
            backend,
        }
    }

    pub fn bull(backend: Arc<dyn ReasoningBackend>) -> Self {
        Self::new(Stance::Bull, backend)
    }

    pub fn bear(backend: Arc<dyn ReasoningBackend>) -> Self {
        Self::new(Stance::Bear, backend)
    }

    pub fn backend(&self) -> &Arc<dyn ReasoningBackend> {
        &self.backend
    }
}

#[async_trait]
impl Advocate for AdvocateAgent {
    fn stance(&self) -> Stance {
        self.stance
    }

    async fn analyze(&self, snapshot: &QuoteSnapshot) -> Result<Thesis, AgentError> {
        debug!(stance = %self.stance, ticker = %snapshot.ticker, backend = %self.backend.describe(), "Requesting thesis");
        let user_prompt = analysis_prompt(self.stance, snapshot);
        let raw = self.backend.complete(&self.system_prompt, &user_prompt).await?;
        parse_thesis(self.stance, &raw)
    }

    async fn rebut(&self, own: &Thesis, opposing: &Thesis) -> Result<Rebuttal, AgentError> {
        debug!(stance = %self.stance, backend = %self.backend.describe(), "Requesting rebuttal");
        let user_prompt = rebuttal_prompt(own, opposing);
        let raw = self.backend.complete(&self.system_prompt, &user_prompt).await?;
        parse_rebuttal(self.stance, &raw)
    }
}

/// The Portfolio Manager persona.
pub struct DecisionAgent {
    system_prompt: String,
    backend: Arc<dyn ReasoningBackend>,
}

impl DecisionAgent {
    pub fn new(backend: Arc<dyn ReasoningBackend>) -> Self {
        Self {
            system_prompt: decision_system_prompt(),
            backend,
        }
    }

    pub fn backend(&self) -> &Arc<dyn ReasoningBackend> {
        &self.backend
    }
}

#[async_trait]
impl Arbiter for DecisionAgent {
    async fn decide(
        &self,
        snapshot: &QuoteSnapshot,
        bull_thesis: &Thesis,
        bear_thesis: &Thesis,
        bull_rebuttal: &Rebuttal,
        bear_rebuttal: &Rebuttal,
    ) -> Result<Verdict, AgentError> {
        debug!(ticker = %snapshot.ticker, backend = %self.backend.describe(), "Requesting verdict");
        let user_prompt = decision_prompt(
            snapshot,
            bull_thesis,
            bear_thesis,
            bull_rebuttal,
            bear_rebuttal,
        );
        let raw = self.backend.complete(&self.system_prompt, &user_prompt).await?;
        parse_verdict(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        advocate_response, decision_response, rebuttal_response, ScriptedBackend,
    };
    use committee_models::Decision;
    use committee_quotes::test_support::snapshot_for;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn bull_analyze_sends_snapshot_and_parses_thesis() {
        let backend = Arc::new(ScriptedBackend::new(vec![advocate_response(
            Stance::Bull,
            "Ecosystem lock-in keeps margins high.",
            "- Lock-in",
            "0.7",
        )]));
        let agent = AdvocateAgent::bull(backend.clone());
        let snapshot = snapshot_for("AAPL");

        let thesis = agent.analyze(&snapshot).await.unwrap();
        assert_eq!(thesis.stance, Stance::Bull);
        assert_eq!(thesis.stance_text, "Ecosystem lock-in keeps margins high.");
        assert_eq!(thesis.confidence, Some(dec!(0.7)));

        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].system_prompt.contains("The Bull"));
        assert!(calls[0].user_prompt.contains(&snapshot.prompt_block()));
    }

    #[tokio::test]
    async fn bear_rebut_uses_bear_templates() {
        let backend = Arc::new(ScriptedBackend::new(vec![rebuttal_response(
            "Services growth is slowing.",
        )]));
        let agent = AdvocateAgent::bear(backend.clone());
        let own = Thesis {
            stance: Stance::Bear,
            stance_text: "Hardware cycle is saturated.".to_string(),
            key_points: None,
            confidence: None,
        };
        let opposing = Thesis {
            stance: Stance::Bull,
            stance_text: "Services will carry growth.".to_string(),
            key_points: None,
            confidence: None,
        };

        let rebuttal = agent.rebut(&own, &opposing).await.unwrap();
        assert_eq!(rebuttal.stance, Stance::Bear);
        assert_eq!(rebuttal.counter_text, "Services growth is slowing.");

        let calls = backend.calls();
        assert!(calls[0].system_prompt.contains("The Bear"));
        assert!(calls[0].user_prompt.contains("Hardware cycle is saturated."));
        assert!(calls[0].user_prompt.contains("Services will carry growth."));
    }

    #[tokio::test]
    async fn decide_parses_verdict() {
        let backend = Arc::new(ScriptedBackend::new(vec![decision_response(
            "BUY",
            "Upside outweighs valuation risk.",
        )]));
        let agent = DecisionAgent::new(backend.clone());
        let snapshot = snapshot_for("AAPL");
        let bull = Thesis {
            stance: Stance::Bull,
            stance_text: "bull".to_string(),
            key_points: None,
            confidence: None,
        };
        let bear = Thesis {
            stance: Stance::Bear,
            ..bull.clone()
        };
        let rebuttal = Rebuttal {
            stance: Stance::Bull,
            counter_text: "counter".to_string(),
        };

        let verdict = agent
            .decide(&snapshot, &bull, &bear, &rebuttal, &rebuttal)
            .await
            .unwrap();
        assert_eq!(verdict.decision, Decision::Buy);
        assert_eq!(verdict.rationale, "Upside outweighs valuation risk.");
        assert!(backend.calls()[0].system_prompt.contains("Portfolio Manager"));
    }

    #[tokio::test]
    async fn backend_failure_propagates() {
        let backend = Arc::new(ScriptedBackend::failing("401 Unauthorized"));
        let agent = AdvocateAgent::bull(backend);

        let err = agent.analyze(&snapshot_for("AAPL")).await.unwrap_err();
        assert!(matches!(err, AgentError::Backend(_)));
    }
}
