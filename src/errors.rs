use thiserror::Error;

/// Error type shared by the record model, the local store, and the sync engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuoteError {
    #[error("Malformed record: {0}")]
    MalformedRecord(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Gateway error: {0}")]
    Gateway(String),
    #[error("Invalid input: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, QuoteError>;

impl From<std::io::Error> for QuoteError {
    fn from(err: std::io::Error) -> Self {
        QuoteError::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for QuoteError {
    fn from(err: serde_json::Error) -> Self {
        QuoteError::Persistence(err.to_string())
    }
}

impl From<reqwest::Error> for QuoteError {
    fn from(err: reqwest::Error) -> Self {
        QuoteError::Gateway(err.to_string())
    }
}
