pub mod config;
pub mod debate;
pub mod quote;

pub use config::{
    AgentsConfig, CommitteeConfig, PersonaConfig, ProviderKind, QuoteConfig, SuffixRule,
    SymbolPattern,
};
pub use debate::{DebatePhase, DebateSession, Decision, Rebuttal, Stance, Thesis, Verdict};
pub use quote::{QuoteSnapshot, NO_NEWS_HEADLINE};
