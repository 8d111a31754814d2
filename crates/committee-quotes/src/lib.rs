pub mod error;
pub mod fetcher;
pub mod provider;
pub mod yahoo;

pub mod test_support;

pub use error::QuoteError;
pub use fetcher::QuoteFetcher;
pub use provider::QuoteProvider;
pub use yahoo::YahooProvider;
