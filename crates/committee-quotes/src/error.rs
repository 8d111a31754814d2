use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuoteError {
    #[error("Invalid ticker symbol: {0:?}")]
    InvalidTicker(String),

    #[error("Ticker '{ticker}' not found (tried: {})", .tried.join(", "))]
    TickerNotFound { ticker: String, tried: Vec<String> },

    #[error("Data provider error: {0}")]
    DataProvider(String),
}

impl From<reqwest::Error> for QuoteError {
    fn from(e: reqwest::Error) -> Self {
        QuoteError::DataProvider(e.to_string())
    }
}
