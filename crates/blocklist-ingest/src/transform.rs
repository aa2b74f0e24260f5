//! Feed entries to stored documents

use blocklist_common::types::{BlocklistDocument, FeedId};
use chrono::{DateTime, Utc};

/// Map feed entries to documents, one per entry, in input order.
///
/// All documents share the category, origin and a single capture instant, so
/// `retrieved_at` and `ingested_at` are identical across the batch.
pub fn to_documents<I>(
    addresses: I,
    feed: &FeedId,
    origin: &str,
    captured_at: DateTime<Utc>,
) -> Vec<BlocklistDocument>
where
    I: IntoIterator<Item = String>,
{
    addresses
        .into_iter()
        .map(|address| BlocklistDocument::new(address, feed.clone(), origin, captured_at))
        .collect()
}
