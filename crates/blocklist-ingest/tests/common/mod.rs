//! Shared helpers for blocklist-ingest integration tests
//!
//! - a `wiremock` feed server that serves `/lists/{feed}.txt`
//! - connectors wired to an in-process [`MemoryStore`]
//! - PostgreSQL and MongoDB containers (Docker required, tests are `#[ignore]`d)

#![allow(dead_code)]

use anyhow::{Context, Result};
use blocklist_common::types::FeedId;
use blocklist_ingest::config::{IngestConfig, StoreSettings};
use blocklist_ingest::store::MemoryStore;
use blocklist_ingest::{BlocklistConnector, FeedClient};
use testcontainers::{core::IntoContainerPort, runners::AsyncRunner, ContainerAsync};
use testcontainers_modules::{mongo::Mongo, postgres::Postgres};
use tracing::{debug, info};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub fn init_test_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,blocklist_ingest=debug,sqlx=warn,testcontainers=info")
        }))
        .with_test_writer()
        .try_init();
}

pub fn feed(id: &str) -> FeedId {
    FeedId::new(id).expect("valid feed id")
}

/// Feed settings pointed at the mock server, with no pause between fetches.
pub fn test_config(server: &MockServer) -> IngestConfig {
    IngestConfig::builder()
        .store_uri("memory://")
        .feed_base_url(server.uri())
        .request_timeout_secs(5)
        .rate_limit_delay_secs(0)
        .retry_backoff_ms(0)
        .build()
}

/// Connector over a fresh memory store. The returned handle shares the
/// store's contents.
pub fn memory_connector(config: &IngestConfig) -> (BlocklistConnector, MemoryStore) {
    let store = MemoryStore::new();
    let feeds = FeedClient::new(config.feed.clone()).expect("Failed to build feed client");
    let connector = BlocklistConnector::new(feeds, Box::new(store.clone()));
    (connector, store)
}

pub async fn mount_feed(server: &MockServer, id: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/lists/{id}.txt")))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

pub async fn mount_status(server: &MockServer, id: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/lists/{id}.txt")))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// `count` distinct IPv4 addresses, one per line.
pub fn feed_body(count: usize) -> String {
    (0..count)
        .map(|i| format!("10.{}.{}.{}", i / 65_536 % 256, i / 256 % 256, i % 256))
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// PostgreSQL Test Container
// ============================================================================

pub struct TestPostgres {
    _container: ContainerAsync<Postgres>,
    connection_string: String,
}

impl TestPostgres {
    pub async fn start() -> Result<Self> {
        info!("Starting PostgreSQL test container...");

        let container = Postgres::default()
            .start()
            .await
            .context("Failed to start PostgreSQL container")?;

        let host = container
            .get_host()
            .await
            .context("Failed to get container host")?;
        let port = container
            .get_host_port_ipv4(5432.tcp())
            .await
            .context("Failed to get container port")?;

        let connection_string =
            format!("postgresql://postgres:postgres@{}:{}/postgres", host, port);
        debug!("PostgreSQL connection: {}", connection_string);

        Ok(Self {
            _container: container,
            connection_string,
        })
    }

    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings {
            uri: self.connection_string.clone(),
            ..StoreSettings::default()
        }
    }
}

// ============================================================================
// MongoDB Test Container
// ============================================================================

pub struct TestMongo {
    _container: ContainerAsync<Mongo>,
    connection_string: String,
}

impl TestMongo {
    pub async fn start() -> Result<Self> {
        info!("Starting MongoDB test container...");

        let container = Mongo::default()
            .start()
            .await
            .context("Failed to start MongoDB container")?;

        let host = container
            .get_host()
            .await
            .context("Failed to get container host")?;
        let port = container
            .get_host_port_ipv4(27017.tcp())
            .await
            .context("Failed to get container port")?;

        let connection_string = format!("mongodb://{}:{}/", host, port);
        debug!("MongoDB connection: {}", connection_string);

        Ok(Self {
            _container: container,
            connection_string,
        })
    }

    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings {
            uri: self.connection_string.clone(),
            ..StoreSettings::default()
        }
    }
}
