use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::quote::QuoteSnapshot;

/// Key-point summaries fall back to this many characters of the full stance.
const SUMMARY_FALLBACK_CHARS: usize = 500;

/// Which side of the debate an advocate argues.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    Bull,
    Bear,
}

impl Stance {
    pub fn opponent(self) -> Stance {
        match self {
            Stance::Bull => Stance::Bear,
            Stance::Bear => Stance::Bull,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stance::Bull => "Bull",
            Stance::Bear => "Bear",
        }
    }
}

impl fmt::Display for Stance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An advocate's opening argument.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Thesis {
    pub stance: Stance,
    pub stance_text: String,
    /// Short bullet summary, when the advocate supplied one.
    pub key_points: Option<String>,
    /// 0.0 to 1.0 self-reported conviction.
    pub confidence: Option<Decimal>,
}

impl Thesis {
    /// Key points if present, otherwise a bounded prefix of the stance text.
    pub fn summary(&self) -> String {
        if let Some(points) = &self.key_points {
            return points.clone();
        }
        if self.stance_text.chars().count() > SUMMARY_FALLBACK_CHARS {
            let cut: String = self.stance_text.chars().take(SUMMARY_FALLBACK_CHARS).collect();
            format!("{cut}...")
        } else {
            self.stance_text.clone()
        }
    }
}

/// An advocate's counter-argument against the opposing thesis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rebuttal {
    pub stance: Stance,
    pub counter_text: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Buy,
    Sell,
    Hold,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Buy => "BUY",
            Decision::Sell => "SELL",
            Decision::Hold => "HOLD",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = String;

    /// Accepts exactly BUY, SELL or HOLD, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Decision::Buy),
            "SELL" => Ok(Decision::Sell),
            "HOLD" => Ok(Decision::Hold),
            other => Err(format!("'{other}' is not one of BUY, SELL, HOLD")),
        }
    }
}

/// The decision-maker's final call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Verdict {
    pub decision: Decision,
    pub rationale: String,
}

/// Workflow states of one debate run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DebatePhase {
    Fetching,
    Analyzing,
    Rebutting,
    Deciding,
    Done,
    Failed,
}

impl DebatePhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, DebatePhase::Done | DebatePhase::Failed)
    }
}

impl fmt::Display for DebatePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DebatePhase::Fetching => "fetching",
            DebatePhase::Analyzing => "analyzing",
            DebatePhase::Rebutting => "rebutting",
            DebatePhase::Deciding => "deciding",
            DebatePhase::Done => "done",
            DebatePhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Everything one completed debate produced. Only built once the verdict exists,
/// so a session never carries a partial result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DebateSession {
    pub id: Uuid,
    /// The ticker as requested by the user.
    pub ticker: String,
    pub snapshot: QuoteSnapshot,
    pub bull_thesis: Thesis,
    pub bear_thesis: Thesis,
    pub bull_rebuttal: Rebuttal,
    pub bear_rebuttal: Rebuttal,
    pub verdict: Verdict,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}
