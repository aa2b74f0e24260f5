//! Document store backends
//!
//! The connector talks to storage only through [`DocumentStore`]. The backend
//! is picked from the scheme of the configured URI:
//!
//! | Scheme | Backend |
//! |--------|---------|
//! | `mongodb://`, `mongodb+srv://` | [`MongoStore`] |
//! | `postgres://`, `postgresql://` | [`PostgresStore`] |
//! | `memory://` | [`MemoryStore`] |

pub mod memory;
pub mod mongo;
pub mod postgres;

pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use postgres::PostgresStore;

use crate::config::StoreSettings;
use crate::error::{IngestError, Result};
use async_trait::async_trait;
use blocklist_common::types::BlocklistDocument;
use std::collections::BTreeMap;

/// Storage operations needed by the ingestion connector.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short human-readable location, e.g. `mongodb security_data.blocklist_raw`.
    fn describe(&self) -> String;

    /// Unordered bulk insert. Returns the number of documents written.
    async fn insert_many(&self, documents: &[BlocklistDocument]) -> Result<u64>;

    /// Number of documents in the whole collection.
    async fn count_documents(&self) -> Result<u64>;

    /// Document counts grouped by category over the whole collection.
    async fn count_by_category(&self) -> Result<BTreeMap<String, u64>>;

    /// Round-trip to the server.
    async fn ping(&self) -> Result<()>;

    /// Databases visible to the connection.
    async fn list_databases(&self) -> Result<Vec<String>>;

    /// Release the connection. Calling it again is a no-op.
    async fn close(&mut self) -> Result<()>;
}

/// Backend selected by a store URI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Mongo,
    Postgres,
    Memory,
}

impl StoreKind {
    pub fn from_uri(uri: &str) -> Result<Self> {
        let scheme = uri
            .split_once("://")
            .map(|(scheme, _)| scheme.to_ascii_lowercase())
            .ok_or_else(|| IngestError::Config(format!("Store URI has no scheme: '{}'", uri)))?;

        match scheme.as_str() {
            "mongodb" | "mongodb+srv" => Ok(StoreKind::Mongo),
            "postgres" | "postgresql" => Ok(StoreKind::Postgres),
            "memory" => Ok(StoreKind::Memory),
            other => Err(IngestError::Config(format!(
                "Unsupported store scheme '{}' (expected mongodb, postgres or memory)",
                other
            ))),
        }
    }
}

/// Open the store named by `settings.uri`.
pub async fn connect(settings: &StoreSettings) -> Result<Box<dyn DocumentStore>> {
    let store: Box<dyn DocumentStore> = match StoreKind::from_uri(&settings.uri)? {
        StoreKind::Mongo => Box::new(MongoStore::connect(settings).await?),
        StoreKind::Postgres => Box::new(PostgresStore::connect(settings).await?),
        StoreKind::Memory => Box::new(MemoryStore::new()),
    };

    Ok(store)
}
