use async_trait::async_trait;
use committee_models::QuoteSnapshot;

use crate::error::QuoteError;

/// A source of quote snapshots. Mockable for testing.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Look up one exact symbol.
    ///
    /// `Ok(None)` means the provider does not know the symbol; transport and
    /// decoding failures are `Err(QuoteError::DataProvider)`.
    async fn lookup(&self, symbol: &str) -> Result<Option<QuoteSnapshot>, QuoteError>;
}
