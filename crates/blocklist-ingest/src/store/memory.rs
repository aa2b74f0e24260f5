//! In-process document store
//!
//! Used by tests and `memory://` dry runs. Clones share the same contents, so
//! a test can keep a handle after boxing the store into a connector.

use super::DocumentStore;
use crate::error::{IngestError, Result};
use async_trait::async_trait;
use blocklist_common::types::BlocklistDocument;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MemoryState {
    documents: Vec<BlocklistDocument>,
    insert_calls: usize,
    fail_inserts: bool,
    closed: bool,
}

/// Vector-backed store with failure injection
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `insert_many` fail with a store error.
    pub fn fail_inserts(&self, fail: bool) -> Result<()> {
        self.lock()?.fail_inserts = fail;
        Ok(())
    }

    /// Copy of everything inserted so far.
    pub fn documents(&self) -> Result<Vec<BlocklistDocument>> {
        Ok(self.lock()?.documents.clone())
    }

    /// Number of `insert_many` calls that reached the store, failed ones included.
    pub fn insert_calls(&self) -> Result<usize> {
        Ok(self.lock()?.insert_calls)
    }

    pub fn is_closed(&self) -> Result<bool> {
        Ok(self.lock()?.closed)
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| IngestError::Store("memory store lock poisoned".to_string()))
    }

    fn open(&self) -> Result<MutexGuard<'_, MemoryState>> {
        let state = self.lock()?;
        if state.closed {
            return Err(IngestError::StoreClosed);
        }
        Ok(state)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    async fn insert_many(&self, documents: &[BlocklistDocument]) -> Result<u64> {
        let mut state = self.open()?;
        state.insert_calls += 1;

        if state.fail_inserts {
            return Err(IngestError::Store("insert rejected by memory store".to_string()));
        }

        state.documents.extend_from_slice(documents);
        Ok(documents.len() as u64)
    }

    async fn count_documents(&self) -> Result<u64> {
        Ok(self.open()?.documents.len() as u64)
    }

    async fn count_by_category(&self) -> Result<BTreeMap<String, u64>> {
        let state = self.open()?;
        let mut counts = BTreeMap::new();
        for doc in &state.documents {
            *counts.entry(doc.category.to_string()).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn ping(&self) -> Result<()> {
        self.open().map(|_| ())
    }

    async fn list_databases(&self) -> Result<Vec<String>> {
        self.open()?;
        Ok(vec!["memory".to_string()])
    }

    async fn close(&mut self) -> Result<()> {
        self.lock()?.closed = true;
        Ok(())
    }
}
