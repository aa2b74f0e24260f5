//! Store-wide statistics

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counts over the whole collection, not only the current run.
///
/// Serializes as `{"total_records": .., "by_attack_type": {..}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStatistics {
    pub total_records: u64,
    pub by_attack_type: BTreeMap<String, u64>,
}

impl StoreStatistics {
    pub fn new(total_records: u64, by_attack_type: BTreeMap<String, u64>) -> Self {
        Self {
            total_records,
            by_attack_type,
        }
    }

    /// Count for one category, zero when absent.
    pub fn count_for(&self, category: &str) -> u64 {
        self.by_attack_type.get(category).copied().unwrap_or(0)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
