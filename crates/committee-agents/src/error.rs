use std::time::Duration;

use committee_models::DebatePhase;
use committee_quotes::QuoteError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Reasoning backend error: {0}")]
    Backend(String),

    #[error("Reasoning call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for AgentError {
    fn from(e: reqwest::Error) -> Self {
        AgentError::Backend(e.to_string())
    }
}

/// Anything that can stop a debate.
#[derive(Error, Debug)]
pub enum DebateError {
    #[error(transparent)]
    Quote(#[from] QuoteError),

    #[error(transparent)]
    Agent(#[from] AgentError),
}

/// User-facing failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    TickerNotFound,
    DataProviderError,
    ReasoningBackendError,
    MalformedResponse,
}

impl DebateError {
    pub fn kind(&self) -> FailureKind {
        match self {
            DebateError::Quote(QuoteError::InvalidTicker(_))
            | DebateError::Quote(QuoteError::TickerNotFound { .. }) => FailureKind::TickerNotFound,
            DebateError::Quote(QuoteError::DataProvider(_)) => FailureKind::DataProviderError,
            DebateError::Agent(AgentError::MalformedResponse(_)) => FailureKind::MalformedResponse,
            DebateError::Agent(_) => FailureKind::ReasoningBackendError,
        }
    }
}

/// A debate that ended in the `Failed` state. No verdict is attached.
#[derive(Error, Debug)]
#[error("{ticker}: debate failed while {phase}: {error}")]
pub struct DebateFailure {
    pub ticker: String,
    /// The phase that was running when the error surfaced.
    pub phase: DebatePhase,
    #[source]
    pub error: DebateError,
}

impl DebateFailure {
    pub fn kind(&self) -> FailureKind {
        self.error.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_kinds() {
        let not_found = DebateError::from(QuoteError::TickerNotFound {
            ticker: "FAKESTOCK".to_string(),
            tried: vec!["FAKESTOCK".to_string()],
        });
        assert_eq!(not_found.kind(), FailureKind::TickerNotFound);

        let invalid = DebateError::from(QuoteError::InvalidTicker(String::new()));
        assert_eq!(invalid.kind(), FailureKind::TickerNotFound);

        let provider = DebateError::from(QuoteError::DataProvider("503".to_string()));
        assert_eq!(provider.kind(), FailureKind::DataProviderError);

        let timeout = DebateError::from(AgentError::Timeout(Duration::from_secs(90)));
        assert_eq!(timeout.kind(), FailureKind::ReasoningBackendError);

        let malformed = DebateError::from(AgentError::MalformedResponse("no tag".to_string()));
        assert_eq!(malformed.kind(), FailureKind::MalformedResponse);
    }

    #[test]
    fn failure_message_names_phase() {
        let failure = DebateFailure {
            ticker: "NVDA".to_string(),
            phase: DebatePhase::Rebutting,
            error: AgentError::Backend("401 Unauthorized".to_string()).into(),
        };
        let message = failure.to_string();
        assert!(message.starts_with("NVDA: debate failed while rebutting"));
        assert!(message.contains("401 Unauthorized"));
    }
}
