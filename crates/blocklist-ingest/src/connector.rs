//! Blocklist ingestion connector
//!
//! Drives fetch, transform and persist for each requested feed in turn. A
//! failure inside one feed is logged and recorded in the [`RunReport`]; it
//! never stops the remaining feeds.

use crate::config::IngestConfig;
use crate::error::{IngestError, Result};
use crate::feed::FeedClient;
use crate::store::{self, DocumentStore};
use crate::transform;
use blocklist_common::types::{BlocklistDocument, FeedId, StoreStatistics};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// What happened to one feed during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum FeedOutcome {
    /// Documents written to the store
    Loaded(usize),
    /// Fetch succeeded but the feed held no entries
    Empty,
    FetchFailed(String),
    PersistFailed(String),
}

impl FeedOutcome {
    pub fn loaded(&self) -> usize {
        match self {
            FeedOutcome::Loaded(n) => *n,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedReport {
    pub feed: FeedId,
    pub outcome: FeedOutcome,
}

/// Per-feed outcomes of one run, in request order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub feeds: Vec<FeedReport>,
    pub total_loaded: usize,
}

impl RunReport {
    pub fn outcome(&self, feed: &FeedId) -> Option<&FeedOutcome> {
        self.feeds.iter().find(|r| &r.feed == feed).map(|r| &r.outcome)
    }

    fn record(&mut self, feed: &FeedId, outcome: FeedOutcome) {
        self.total_loaded += outcome.loaded();
        self.feeds.push(FeedReport {
            feed: feed.clone(),
            outcome,
        });
    }
}

/// Feed client plus an open document store
pub struct BlocklistConnector {
    feeds: FeedClient,
    store: Box<dyn DocumentStore>,
    closed: bool,
}

impl BlocklistConnector {
    /// Build the feed client and open the store named by the configuration.
    pub async fn connect(config: &IngestConfig) -> Result<Self> {
        let feeds = FeedClient::new(config.feed.clone())?;
        let store = store::connect(&config.store).await?;

        info!(store = %store.describe(), "Connected to document store");

        Ok(Self::new(feeds, store))
    }

    pub fn new(feeds: FeedClient, store: Box<dyn DocumentStore>) -> Self {
        Self {
            feeds,
            store,
            closed: false,
        }
    }

    pub fn feed_client(&self) -> &FeedClient {
        &self.feeds
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    /// Download one feed and return its entries.
    pub async fn fetch(&self, feed: &FeedId) -> Result<Vec<String>> {
        self.feeds.fetch(feed).await
    }

    /// Turn fetched entries into documents stamped with a single capture time.
    pub fn transform(&self, addresses: Vec<String>, feed: &FeedId) -> Vec<BlocklistDocument> {
        let origin = self.feeds.feed_url(feed);
        transform::to_documents(addresses, feed, &origin, Utc::now())
    }

    /// Bulk insert `documents`. An empty batch is rejected before the store
    /// is touched.
    pub async fn persist(&self, documents: &[BlocklistDocument]) -> Result<usize> {
        if documents.is_empty() {
            warn!("No documents to persist");
            return Err(IngestError::EmptyBatch);
        }

        let inserted = self.store.insert_many(documents).await?;
        info!(count = inserted, "Inserted documents");

        Ok(inserted as usize)
    }

    /// Process `feeds` one after another.
    #[instrument(skip_all, fields(run_id = %Uuid::new_v4(), feeds = feeds.len()))]
    pub async fn run(&self, feeds: &[FeedId]) -> RunReport {
        let mut report = RunReport::default();

        for feed in feeds {
            let outcome = self.process_feed(feed).await;
            report.record(feed, outcome);
        }

        info!(total = report.total_loaded, "Ingestion run finished");
        report
    }

    async fn process_feed(&self, feed: &FeedId) -> FeedOutcome {
        let addresses = match self.fetch(feed).await {
            Ok(addresses) => addresses,
            Err(e) => {
                warn!(feed = %feed, error = %e, "Fetch failed, skipping feed");
                return FeedOutcome::FetchFailed(e.to_string());
            },
        };

        if addresses.is_empty() {
            warn!(feed = %feed, "Feed returned no addresses");
            return FeedOutcome::Empty;
        }

        let documents = self.transform(addresses, feed);
        match self.persist(&documents).await {
            Ok(count) => {
                info!(feed = %feed, count, "Loaded feed");
                FeedOutcome::Loaded(count)
            },
            Err(e) => {
                warn!(feed = %feed, error = %e, "Persist failed, skipping feed");
                FeedOutcome::PersistFailed(e.to_string())
            },
        }
    }

    /// Total documents and per-category counts over the whole collection.
    pub async fn statistics(&self) -> Result<StoreStatistics> {
        let total_records = self.store.count_documents().await?;
        let by_attack_type = self.store.count_by_category().await?;

        Ok(StoreStatistics::new(total_records, by_attack_type))
    }

    /// Release the store connection. Later calls do nothing.
    pub async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.store.close().await?;
        info!("Connector closed");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
