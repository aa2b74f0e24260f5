//! Blocklist Ingest Library
//!
//! Downloads plaintext IP blocklists (one address per line, `#` comments) and
//! loads them into a document store, one document per address.
//!
//! # Stores
//!
//! - **MongoDB**: `mongodb://` URIs
//! - **PostgreSQL**: `postgres://` URIs, one table per collection
//! - **Memory**: `memory://`, for tests and dry runs
//!
//! # Example
//!
//! ```no_run
//! use blocklist_common::types::FeedId;
//! use blocklist_ingest::{BlocklistConnector, IngestConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = IngestConfig::from_env()?;
//!     let mut connector = BlocklistConnector::connect(&config).await?;
//!
//!     let report = connector.run(&FeedId::defaults()).await;
//!     println!("loaded {} addresses", report.total_loaded);
//!
//!     connector.close().await?;
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod config;
pub mod connector;
pub mod error;
pub mod feed;
pub mod store;
pub mod transform;

pub use config::IngestConfig;
pub use connector::{BlocklistConnector, FeedOutcome, FeedReport, RunReport};
pub use error::{IngestError, Result};
pub use feed::{FeedClient, FeedProbe};
pub use store::DocumentStore;
