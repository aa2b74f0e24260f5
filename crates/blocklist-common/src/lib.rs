//! Blocklist Common Library
//!
//! Shared types, error handling and logging for the blocklist ingestion workspace.
//!
//! # Overview
//!
//! - **Types**: feed identifiers, stored documents and store statistics
//! - **Error Handling**: the shared error and result types
//! - **Logging**: `tracing` subscriber setup shared by every binary
//!
//! # Example
//!
//! ```no_run
//! use blocklist_common::types::FeedId;
//! use blocklist_common::Result;
//!
//! fn parse_feeds(raw: &str) -> Result<Vec<FeedId>> {
//!     raw.split(',').map(|id| id.trim().parse()).collect()
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{CommonError, Result};
