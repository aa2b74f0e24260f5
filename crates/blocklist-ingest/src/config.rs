//! Configuration management
//!
//! Settings are read once at startup (from the process environment and an
//! optional `.env` file) into an [`IngestConfig`] that is handed to the
//! connector. Nothing reads the environment after that.

use crate::error::{IngestError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

// ============================================================================
// Defaults
// ============================================================================

/// Default document store connection URI.
pub const DEFAULT_STORE_URI: &str = "mongodb://localhost:27017/";

/// Default database (MongoDB) or schema (Postgres) name.
pub const DEFAULT_DATABASE_NAME: &str = "security_data";

/// Default collection (MongoDB) or table (Postgres) name.
pub const DEFAULT_COLLECTION_NAME: &str = "blocklist_raw";

/// Default store connect / server selection timeout in seconds.
pub const DEFAULT_STORE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default Postgres pool size.
pub const DEFAULT_STORE_MAX_CONNECTIONS: u32 = 5;

/// Default host serving `/lists/{feed}.txt`.
pub const DEFAULT_FEED_BASE_URL: &str = "https://lists.blocklist.de";

/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default pause after every fetch in seconds.
pub const DEFAULT_RATE_LIMIT_DELAY_SECS: u64 = 2;

/// Default number of fetch attempts. One attempt means no retry.
pub const DEFAULT_FETCH_MAX_ATTEMPTS: u32 = 1;

/// Default backoff before the first retry, doubled on each later retry.
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 2_000;

/// Complete ingestion configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestConfig {
    pub store: StoreSettings,
    pub feed: FeedSettings,
}

/// Document store settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// `mongodb://`, `postgres://` or `memory://`
    pub uri: String,
    pub database_name: String,
    pub collection_name: String,
    pub connect_timeout_secs: u64,
    pub max_connections: u32,
}

/// Remote feed settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub delay_secs: u64,
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            uri: DEFAULT_STORE_URI.to_string(),
            database_name: DEFAULT_DATABASE_NAME.to_string(),
            collection_name: DEFAULT_COLLECTION_NAME.to_string(),
            connect_timeout_secs: DEFAULT_STORE_CONNECT_TIMEOUT_SECS,
            max_connections: DEFAULT_STORE_MAX_CONNECTIONS,
        }
    }
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_FEED_BASE_URL.to_string(),
            timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            delay_secs: DEFAULT_RATE_LIMIT_DELAY_SECS,
            max_attempts: DEFAULT_FETCH_MAX_ATTEMPTS,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
        }
    }
}

impl StoreSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl FeedSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }

    /// Wait before retry number `retry` (1-based): backoff, 2x backoff, 4x ...
    pub fn retry_backoff(&self, retry: u32) -> Duration {
        let factor = 1u64 << retry.saturating_sub(1).min(16);
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(factor))
    }
}

impl IngestConfig {
    /// Load configuration from `.env` and the process environment.
    ///
    /// Environment variables:
    /// - `STORE_URI` (falls back to `MONGODB_URI`)
    /// - `DATABASE_NAME`, `COLLECTION_NAME`
    /// - `STORE_CONNECT_TIMEOUT`, `STORE_MAX_CONNECTIONS`
    /// - `FEED_BASE_URL`
    /// - `REQUEST_TIMEOUT` (seconds), `RATE_LIMIT_DELAY` (seconds)
    /// - `FETCH_MAX_ATTEMPTS`, `FETCH_RETRY_BACKOFF_MS`
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup, then validate it.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            store: StoreSettings {
                uri: lookup("STORE_URI")
                    .or_else(|| lookup("MONGODB_URI"))
                    .unwrap_or(defaults.store.uri),
                database_name: lookup("DATABASE_NAME").unwrap_or(defaults.store.database_name),
                collection_name: lookup("COLLECTION_NAME")
                    .unwrap_or(defaults.store.collection_name),
                connect_timeout_secs: parse_var(
                    &lookup,
                    "STORE_CONNECT_TIMEOUT",
                    defaults.store.connect_timeout_secs,
                )?,
                max_connections: parse_var(
                    &lookup,
                    "STORE_MAX_CONNECTIONS",
                    defaults.store.max_connections,
                )?,
            },
            feed: FeedSettings {
                base_url: lookup("FEED_BASE_URL").unwrap_or(defaults.feed.base_url),
                timeout_secs: parse_var(&lookup, "REQUEST_TIMEOUT", defaults.feed.timeout_secs)?,
                delay_secs: parse_var(&lookup, "RATE_LIMIT_DELAY", defaults.feed.delay_secs)?,
                max_attempts: parse_var(
                    &lookup,
                    "FETCH_MAX_ATTEMPTS",
                    defaults.feed.max_attempts,
                )?,
                retry_backoff_ms: parse_var(
                    &lookup,
                    "FETCH_RETRY_BACKOFF_MS",
                    defaults.feed.retry_backoff_ms,
                )?,
            },
        };

        config.validate()?;

        Ok(config)
    }

    pub fn builder() -> IngestConfigBuilder {
        IngestConfigBuilder::default()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.store.uri.trim().is_empty() {
            return Err(IngestError::Config("Store URI cannot be empty".to_string()));
        }

        if self.store.database_name.trim().is_empty() {
            return Err(IngestError::Config("Database name cannot be empty".to_string()));
        }

        if self.store.collection_name.trim().is_empty() {
            return Err(IngestError::Config("Collection name cannot be empty".to_string()));
        }

        if self.store.max_connections == 0 {
            return Err(IngestError::Config(
                "Store max connections must be greater than 0".to_string(),
            ));
        }

        let base = url::Url::parse(&self.feed.base_url).map_err(|e| {
            IngestError::Config(format!("Invalid feed base URL '{}': {}", self.feed.base_url, e))
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(IngestError::Config(format!(
                "Feed base URL must be http or https, got '{}'",
                base.scheme()
            )));
        }

        if self.feed.timeout_secs == 0 {
            return Err(IngestError::Config("Request timeout must be greater than 0".to_string()));
        }

        if self.feed.max_attempts == 0 {
            return Err(IngestError::Config(
                "Fetch max attempts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| IngestError::Config(format!("Invalid value for {}: '{}' ({})", key, raw, e))),
        None => Ok(default),
    }
}

/// Builder for IngestConfig
#[derive(Debug, Default)]
pub struct IngestConfigBuilder {
    config: IngestConfig,
}

impl IngestConfigBuilder {
    pub fn store_uri(mut self, uri: impl Into<String>) -> Self {
        self.config.store.uri = uri.into();
        self
    }

    pub fn database_name(mut self, name: impl Into<String>) -> Self {
        self.config.store.database_name = name.into();
        self
    }

    pub fn collection_name(mut self, name: impl Into<String>) -> Self {
        self.config.store.collection_name = name.into();
        self
    }

    pub fn feed_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.feed.base_url = url.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.feed.timeout_secs = secs;
        self
    }

    pub fn rate_limit_delay_secs(mut self, secs: u64) -> Self {
        self.config.feed.delay_secs = secs;
        self
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.feed.max_attempts = attempts;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.feed.retry_backoff_ms = ms;
        self
    }

    pub fn build(self) -> IngestConfig {
        self.config
    }
}

// ============================================================================
// Tests
// ============================================================================
