use thiserror::Error;

/// Errors returned by gateways, codecs and configuration.
///
/// These never reach the presentation layer directly: the unlock machine
/// folds them into an [`ErrorCode`](crate::session::ErrorCode).
#[derive(Debug, Error)]
pub enum X402Error {
    #[error("wallet error: {0}")]
    Wallet(String),

    #[error("ledger error: {0}")]
    Ledger(String),

    #[error("http error: {0}")]
    Http(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
