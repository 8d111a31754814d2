//! In-memory quote provider for exercising the fetcher and the debate
//! workflow without network access.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use committee_models::QuoteSnapshot;
use rust_decimal::Decimal;

use crate::error::QuoteError;
use crate::provider::QuoteProvider;

/// A deterministic snapshot for `symbol`.
pub fn snapshot_for(symbol: &str) -> QuoteSnapshot {
    QuoteSnapshot {
        ticker: symbol.to_string(),
        price: Decimal::new(18_250, 2),
        pe_ratio: Some(Decimal::new(2_840, 2)),
        week52_high: Decimal::new(19_912, 2),
        week52_low: Decimal::new(12_403, 2),
        market_cap: Some(Decimal::from(2_810_000_000_000u64)),
        volume: Some(48_200_000),
        avg_volume: Some(55_100_000),
        headlines: vec![
            format!("{symbol} beats quarterly revenue estimates"),
            format!("Regulators open inquiry into {symbol} pricing"),
        ],
        fetched_at: Utc::now(),
    }
}

/// Serves fixed snapshots by exact symbol and records every lookup.
pub struct StubQuoteProvider {
    snapshots: HashMap<String, QuoteSnapshot>,
    failure: Option<String>,
    lookups: Mutex<Vec<String>>,
}

impl StubQuoteProvider {
    pub fn new(snapshots: Vec<QuoteSnapshot>) -> Self {
        Self {
            snapshots: snapshots
                .into_iter()
                .map(|s| (s.ticker.clone(), s))
                .collect(),
            failure: None,
            lookups: Mutex::new(Vec::new()),
        }
    }

    /// Knows each of `symbols`, with a generic snapshot.
    pub fn with_symbols(symbols: &[&str]) -> Self {
        Self::new(symbols.iter().map(|s| snapshot_for(s)).collect())
    }

    /// Every lookup fails with a transport-style error.
    pub fn failing(message: &str) -> Self {
        let mut stub = Self::new(vec![]);
        stub.failure = Some(message.to_string());
        stub
    }

    /// Symbols looked up so far, in call order.
    pub fn lookups(&self) -> Vec<String> {
        self.lookups
            .lock()
            .map(|l| l.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl QuoteProvider for StubQuoteProvider {
    fn name(&self) -> &str {
        "stub"
    }

    async fn lookup(&self, symbol: &str) -> Result<Option<QuoteSnapshot>, QuoteError> {
        if let Ok(mut lookups) = self.lookups.lock() {
            lookups.push(symbol.to_string());
        }
        if let Some(message) = &self.failure {
            return Err(QuoteError::DataProvider(message.clone()));
        }
        Ok(self.snapshots.get(symbol).cloned())
    }
}
