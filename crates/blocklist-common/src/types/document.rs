//! Stored blocklist documents

use super::FeedId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Field names as they appear in the document store.
pub mod fields {
    pub const ADDRESS: &str = "ip_address";
    pub const CATEGORY: &str = "attack_type";
    pub const ORIGIN: &str = "source";
    pub const RETRIEVED_AT: &str = "retrieved_at";
    pub const INGESTED_AT: &str = "ingestion_timestamp";
}

/// One blocklisted address as persisted.
///
/// Documents are written once and never updated; repeated runs insert
/// duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlocklistDocument {
    /// Address text exactly as it appeared in the feed (not validated)
    #[serde(rename = "ip_address")]
    pub address: String,

    /// Feed the address was fetched from
    #[serde(rename = "attack_type")]
    pub category: FeedId,

    /// URL the line was fetched from
    #[serde(rename = "source")]
    pub origin: String,

    pub retrieved_at: DateTime<Utc>,

    /// Always equal to `retrieved_at`
    #[serde(rename = "ingestion_timestamp")]
    pub ingested_at: DateTime<Utc>,
}

impl BlocklistDocument {
    pub fn new(
        address: impl Into<String>,
        category: FeedId,
        origin: impl Into<String>,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            address: address.into(),
            category,
            origin: origin.into(),
            retrieved_at: captured_at,
            ingested_at: captured_at,
        }
    }
}
