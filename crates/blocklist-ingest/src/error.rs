//! Error types for blocklist ingestion

use blocklist_common::CommonError;
use thiserror::Error;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Errors raised while fetching, transforming or storing blocklists
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Store connection is closed")]
    StoreClosed,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No documents to insert")]
    EmptyBatch,

    #[error(transparent)]
    Common(#[from] CommonError),
}
