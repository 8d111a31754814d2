use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use committee_models::{DebatePhase, DebateSession, QuoteSnapshot, Stance};
use committee_quotes::QuoteFetcher;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{DebateError, DebateFailure};
use crate::persona::{Advocate, Arbiter};

/// Progress hooks for the presentation layer. All methods default to no-ops.
pub trait DebateObserver: Send + Sync {
    fn phase_entered(&self, _ticker: &str, _phase: DebatePhase) {}

    fn snapshot_fetched(&self, _snapshot: &QuoteSnapshot) {}
}

pub struct NoopObserver;

impl DebateObserver for NoopObserver {}

/// Runs the four-phase debate for one ticker at a time:
/// fetch the quote, both opening theses, both rebuttals, then the verdict.
///
/// Each phase waits for every call in the previous one. The two calls inside
/// the analysis and rebuttal phases run concurrently.
pub struct DebateOrchestrator {
    fetcher: QuoteFetcher,
    bull: Arc<dyn Advocate>,
    bear: Arc<dyn Advocate>,
    arbiter: Arc<dyn Arbiter>,
}

impl DebateOrchestrator {
    pub fn new(
        fetcher: QuoteFetcher,
        bull: Arc<dyn Advocate>,
        bear: Arc<dyn Advocate>,
        arbiter: Arc<dyn Arbiter>,
    ) -> Self {
        debug_assert_eq!(bull.stance(), Stance::Bull);
        debug_assert_eq!(bear.stance(), Stance::Bear);
        Self {
            fetcher,
            bull,
            bear,
            arbiter,
        }
    }

    /// Run one debate to `Done` or `Failed`. A failure carries the phase it
    /// happened in and never a partial verdict.
    pub async fn run(
        &self,
        ticker: &str,
        observer: &dyn DebateObserver,
    ) -> Result<DebateSession, DebateFailure> {
        let started_at = Utc::now();
        let start = Instant::now();
        info!(ticker, "Starting debate");

        let fail = |phase: DebatePhase, error: DebateError| {
            warn!(ticker, phase = %phase, kind = ?error.kind(), error = %error, "Debate failed");
            observer.phase_entered(ticker, DebatePhase::Failed);
            DebateFailure {
                ticker: ticker.to_string(),
                phase,
                error,
            }
        };

        // 1. Fetching
        observer.phase_entered(ticker, DebatePhase::Fetching);
        let snapshot = self
            .fetcher
            .fetch(ticker)
            .await
            .map_err(|e| fail(DebatePhase::Fetching, e.into()))?;
        info!(ticker, resolved = %snapshot.ticker, price = %snapshot.price, "Quote fetched");
        observer.snapshot_fetched(&snapshot);

        // 2. Analyzing: both theses are independent of each other
        observer.phase_entered(ticker, DebatePhase::Analyzing);
        let (bull_thesis, bear_thesis) =
            tokio::try_join!(self.bull.analyze(&snapshot), self.bear.analyze(&snapshot))
                .map_err(|e| fail(DebatePhase::Analyzing, e.into()))?;

        // 3. Rebutting: each side needs both theses
        observer.phase_entered(ticker, DebatePhase::Rebutting);
        let (bull_rebuttal, bear_rebuttal) = tokio::try_join!(
            self.bull.rebut(&bull_thesis, &bear_thesis),
            self.bear.rebut(&bear_thesis, &bull_thesis)
        )
        .map_err(|e| fail(DebatePhase::Rebutting, e.into()))?;

        // 4. Deciding
        observer.phase_entered(ticker, DebatePhase::Deciding);
        let verdict = self
            .arbiter
            .decide(
                &snapshot,
                &bull_thesis,
                &bear_thesis,
                &bull_rebuttal,
                &bear_rebuttal,
            )
            .await
            .map_err(|e| fail(DebatePhase::Deciding, e.into()))?;

        observer.phase_entered(ticker, DebatePhase::Done);
        let elapsed_ms = start.elapsed().as_millis() as u64;
        info!(
            ticker,
            decision = %verdict.decision,
            elapsed_ms,
            "Debate complete"
        );

        Ok(DebateSession {
            id: Uuid::new_v4(),
            ticker: ticker.trim().to_string(),
            snapshot,
            bull_thesis,
            bear_thesis,
            bull_rebuttal,
            bear_rebuttal,
            verdict,
            started_at,
            completed_at: Utc::now(),
            elapsed_ms,
        })
    }
}
