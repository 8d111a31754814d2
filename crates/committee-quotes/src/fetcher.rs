use std::sync::Arc;

use committee_models::config::SuffixRule;
use committee_models::QuoteSnapshot;
use tracing::{debug, info};

use crate::error::QuoteError;
use crate::provider::QuoteProvider;

/// Fetches quote snapshots, retrying once with an exchange suffix for bare
/// symbols that match one of the configured foreign-market patterns.
pub struct QuoteFetcher {
    provider: Arc<dyn QuoteProvider>,
    suffix_rules: Vec<SuffixRule>,
}

impl QuoteFetcher {
    pub fn new(provider: Arc<dyn QuoteProvider>, suffix_rules: Vec<SuffixRule>) -> Self {
        Self {
            provider,
            suffix_rules,
        }
    }

    pub async fn fetch(&self, ticker: &str) -> Result<QuoteSnapshot, QuoteError> {
        let symbol = normalize_symbol(ticker)?;
        let mut tried = vec![symbol.clone()];

        debug!(symbol = %symbol, provider = self.provider.name(), "Looking up quote");
        if let Some(snapshot) = self.provider.lookup(&symbol).await? {
            return Ok(snapshot);
        }

        if let Some((corrected, rule)) = self.corrected_symbol(&symbol) {
            info!(
                symbol = %symbol,
                corrected = %corrected,
                market = %rule.market,
                "Bare symbol not found, retrying with exchange suffix"
            );
            tried.push(corrected.clone());
            if let Some(snapshot) = self.provider.lookup(&corrected).await? {
                return Ok(snapshot);
            }
        }

        Err(QuoteError::TickerNotFound {
            ticker: symbol,
            tried,
        })
    }

    /// The single retry candidate for a bare symbol, from the first matching rule.
    /// Symbols that already carry a market suffix get no correction.
    pub fn corrected_symbol(&self, symbol: &str) -> Option<(String, &SuffixRule)> {
        if symbol.contains('.') {
            return None;
        }
        self.suffix_rules
            .iter()
            .find(|rule| rule.pattern.matches(symbol))
            .map(|rule| (format!("{symbol}{}", rule.suffix), rule))
    }
}

/// Trim and upper-case a user-supplied ticker. Lookups are case-insensitive.
///
/// Only letters, digits and `.-^=` are accepted (`BRK-B`, `SAAB-B.ST`, `^GSPC`,
/// `EURUSD=X`), so the symbol is always a single URL path segment.
pub fn normalize_symbol(ticker: &str) -> Result<String, QuoteError> {
    let symbol = ticker.trim().to_ascii_uppercase();
    let valid = !symbol.is_empty()
        && !symbol.contains("..")
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='));
    if !valid {
        return Err(QuoteError::InvalidTicker(ticker.to_string()));
    }
    Ok(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{snapshot_for, StubQuoteProvider};
    use committee_models::config::{QuoteConfig, SymbolPattern};

    fn fetcher(provider: Arc<StubQuoteProvider>) -> QuoteFetcher {
        QuoteFetcher::new(provider, QuoteConfig::default().suffix_rules)
    }

    #[tokio::test]
    async fn direct_hit_needs_one_lookup() {
        let provider = Arc::new(StubQuoteProvider::with_symbols(&["AAPL"]));
        let snapshot = fetcher(Arc::clone(&provider)).fetch("aapl").await.unwrap();

        assert_eq!(snapshot.ticker, "AAPL");
        assert_eq!(provider.lookups(), vec!["AAPL"]);
    }

    #[tokio::test]
    async fn share_class_symbol_retries_with_stockholm_suffix() {
        let provider = Arc::new(StubQuoteProvider::with_symbols(&["SAAB-B.ST"]));
        let snapshot = fetcher(Arc::clone(&provider)).fetch("SAAB-B").await.unwrap();

        assert_eq!(snapshot.ticker, "SAAB-B.ST");
        assert_eq!(provider.lookups(), vec!["SAAB-B", "SAAB-B.ST"]);
    }

    #[tokio::test]
    async fn unknown_plain_symbol_is_not_found_without_retry() {
        let provider = Arc::new(StubQuoteProvider::with_symbols(&["AAPL"]));
        let err = fetcher(Arc::clone(&provider))
            .fetch("FAKESTOCK")
            .await
            .unwrap_err();

        match err {
            QuoteError::TickerNotFound { ticker, tried } => {
                assert_eq!(ticker, "FAKESTOCK");
                assert_eq!(tried, vec!["FAKESTOCK"]);
            }
            other => panic!("expected TickerNotFound, got {other:?}"),
        }
        assert_eq!(provider.lookups().len(), 1);
    }

    #[tokio::test]
    async fn failed_correction_reports_both_attempts() {
        let provider = Arc::new(StubQuoteProvider::with_symbols(&[]));
        let err = fetcher(Arc::clone(&provider))
            .fetch("NOPE-B")
            .await
            .unwrap_err();

        match err {
            QuoteError::TickerNotFound { tried, .. } => {
                assert_eq!(tried, vec!["NOPE-B", "NOPE-B.ST"]);
            }
            other => panic!("expected TickerNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn suffixed_symbol_is_never_corrected() {
        let provider = Arc::new(StubQuoteProvider::with_symbols(&[]));
        let result = fetcher(Arc::clone(&provider)).fetch("SAAB-B.ST").await;

        assert!(matches!(result, Err(QuoteError::TickerNotFound { .. })));
        assert_eq!(provider.lookups(), vec!["SAAB-B.ST"]);
    }

    #[tokio::test]
    async fn provider_error_is_not_retried() {
        let provider = Arc::new(StubQuoteProvider::failing("connection reset"));
        let err = fetcher(Arc::clone(&provider))
            .fetch("SAAB-B")
            .await
            .unwrap_err();

        assert!(matches!(err, QuoteError::DataProvider(_)));
        assert_eq!(provider.lookups().len(), 1);
    }

    #[tokio::test]
    async fn blank_ticker_is_invalid() {
        let provider = Arc::new(StubQuoteProvider::with_symbols(&["AAPL"]));
        let err = fetcher(Arc::clone(&provider)).fetch("   ").await.unwrap_err();

        assert!(matches!(err, QuoteError::InvalidTicker(_)));
        assert!(provider.lookups().is_empty());
    }

    #[tokio::test]
    async fn symbols_that_would_escape_the_path_are_invalid() {
        let provider = Arc::new(StubQuoteProvider::with_symbols(&["AAPL"]));
        let fetcher = fetcher(Arc::clone(&provider));

        for raw in ["AAPL#X", "ZZZZ/../AAPL", "AAPL?range=5d&", "AA PL", "..", "AAPL%2F"] {
            let err = fetcher.fetch(raw).await.unwrap_err();
            assert!(
                matches!(err, QuoteError::InvalidTicker(ref t) if t == raw),
                "{raw}: got {err:?}"
            );
        }
        assert!(provider.lookups().is_empty());
    }

    #[test]
    fn index_currency_and_class_symbols_are_accepted() {
        assert_eq!(normalize_symbol(" ^gspc ").unwrap(), "^GSPC");
        assert_eq!(normalize_symbol("eurusd=x").unwrap(), "EURUSD=X");
        assert_eq!(normalize_symbol("saab-b.st").unwrap(), "SAAB-B.ST");
    }

    #[test]
    fn first_matching_rule_wins() {
        let rules = vec![
            SuffixRule {
                pattern: SymbolPattern::Numeric,
                suffix: ".T".to_string(),
                market: "Tokyo".to_string(),
            },
            SuffixRule {
                pattern: SymbolPattern::Numeric,
                suffix: ".HK".to_string(),
                market: "Hong Kong".to_string(),
            },
        ];
        let provider = Arc::new(StubQuoteProvider::with_symbols(&[]));
        let fetcher = QuoteFetcher::new(provider, rules);

        let (corrected, rule) = fetcher.corrected_symbol("7203").unwrap();
        assert_eq!(corrected, "7203.T");
        assert_eq!(rule.market, "Tokyo");
        assert!(fetcher.corrected_symbol("AAPL").is_none());
    }

    #[test]
    fn snapshot_helper_uses_requested_symbol() {
        assert_eq!(snapshot_for("MSFT").ticker, "MSFT");
    }
}
