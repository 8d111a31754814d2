pub mod backend;
pub mod claude_cli;
pub mod error;
pub mod orchestrator;
pub mod parser;
pub mod persona;
pub mod prompts;

pub mod test_support;

pub use backend::{build_backend, AnthropicBackend, OpenAiBackend, ReasoningBackend};
pub use claude_cli::ClaudeCliBackend;
pub use error::{AgentError, DebateError, DebateFailure, FailureKind};
pub use orchestrator::{DebateObserver, DebateOrchestrator, NoopObserver};
pub use persona::{AdvocateAgent, Advocate, Arbiter, DecisionAgent};
