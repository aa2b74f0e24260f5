//! Feed identifiers

use crate::error::{CommonError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Feeds processed when the caller does not name any.
pub const DEFAULT_FEEDS: [&str; 4] = ["ssh", "mail", "apache", "ftp"];

/// Longest accepted feed identifier.
pub const MAX_FEED_ID_LEN: usize = 64;

/// Short label selecting both the remote list and the stored category.
///
/// Only ASCII letters, digits, `-` and `_` are accepted so the identifier can
/// be placed in a URL path segment as-is.
///
/// ```
/// use blocklist_common::types::FeedId;
///
/// let feed: FeedId = "ssh".parse().unwrap();
/// assert_eq!(feed.as_str(), "ssh");
/// assert!("../etc".parse::<FeedId>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FeedId(String);

impl FeedId {
    /// Validate and wrap a feed identifier.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let valid = !id.is_empty()
            && id.len() <= MAX_FEED_ID_LEN
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        if valid {
            Ok(Self(id))
        } else {
            Err(CommonError::InvalidFeedId(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `ssh`, `mail`, `apache`, `ftp` feed set.
    pub fn defaults() -> Vec<FeedId> {
        DEFAULT_FEEDS
            .iter()
            .map(|id| FeedId((*id).to_string()))
            .collect()
    }
}

impl FromStr for FeedId {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for FeedId {
    type Error = CommonError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<FeedId> for String {
    fn from(id: FeedId) -> Self {
        id.0
    }
}

impl AsRef<str> for FeedId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FeedId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
