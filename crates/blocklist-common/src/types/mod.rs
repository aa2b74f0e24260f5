//! Domain types shared by the connector and the store backends

mod document;
mod feed;
mod statistics;

pub use document::{fields, BlocklistDocument};
pub use feed::{FeedId, DEFAULT_FEEDS, MAX_FEED_ID_LEN};
pub use statistics::StoreStatistics;
