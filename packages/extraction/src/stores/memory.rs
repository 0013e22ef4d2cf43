//! In-memory storage implementation for testing and development.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::traits::store::VacancyStore;
use crate::types::vacancy::VacancyRecord;

/// In-memory vacancy store.
///
/// Keeps records in write order. By default it accepts every record, like a
/// table without constraints; [`MemoryStore::unique`] rejects repeats by
/// fingerprint instead.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<VacancyRecord>>,
    keys: RwLock<HashSet<String>>,
    unique: bool,
    closed: RwLock<bool>,
}

impl MemoryStore {
    /// Create a new empty store that accepts duplicates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects records it already holds.
    pub fn unique() -> Self {
        Self {
            unique: true,
            ..Self::default()
        }
    }

    /// Snapshot of every stored record, in write order.
    pub fn records(&self) -> Vec<VacancyRecord> {
        self.records.read().unwrap().clone()
    }

    /// Whether [`close`](VacancyStore::close) has been called.
    pub fn is_closed(&self) -> bool {
        *self.closed.read().unwrap()
    }
}

#[async_trait]
impl VacancyStore for MemoryStore {
    async fn write(&self, record: &VacancyRecord) -> StoreResult<()> {
        if self.is_closed() {
            return Err(StoreError::Backend("store is closed".into()));
        }

        let key = record.fingerprint();
        if !self.keys.write().unwrap().insert(key.clone()) && self.unique {
            return Err(StoreError::Duplicate { key });
        }

        self.records.write().unwrap().push(record.clone());
        Ok(())
    }

    async fn count(&self) -> StoreResult<usize> {
        Ok(self.records.read().unwrap().len())
    }

    async fn close(&self) {
        *self.closed.write().unwrap() = true;
    }
}
