//! Error types shared across the blocklist crates

use thiserror::Error;

/// Result type alias for common operations
pub type Result<T> = std::result::Result<T, CommonError>;

/// Errors raised by the shared types
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("Invalid feed identifier '{0}': use 1-64 ASCII letters, digits, '-' or '_'")]
    InvalidFeedId(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
