//! In-memory config store for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::instrument;

use crate::error::{GateError, Result};

use super::{validate_record_name, ConfigRecord, ConfigStore, RecordKind};

/// In-memory implementation of the [`ConfigStore`] trait.
///
/// Records live in process memory only; nothing survives the process. Cloning
/// the store shares the underlying storage.
#[derive(Clone, Default)]
pub struct InMemoryConfigStore {
    storage: Arc<RwLock<HashMap<(RecordKind, String), ConfigRecord>>>,
}

impl InMemoryConfigStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records across all kinds.
    pub async fn size(&self) -> usize {
        self.storage.read().await.len()
    }

    /// Clears all stored records.
    pub async fn clear(&self) {
        self.storage.write().await.clear();
    }
}

#[async_trait]
impl ConfigStore for InMemoryConfigStore {
    #[instrument(skip(self), fields(backend = "memory"))]
    async fn exists(&self, kind: RecordKind, name: &str) -> Result<bool> {
        let store = self.storage.read().await;
        Ok(store.contains_key(&(kind, name.to_string())))
    }

    #[instrument(skip(self), fields(backend = "memory"))]
    async fn get(&self, kind: RecordKind, name: &str) -> Result<ConfigRecord> {
        let store = self.storage.read().await;
        store
            .get(&(kind, name.to_string()))
            .cloned()
            .ok_or_else(|| GateError::not_found(kind, name))
    }

    #[instrument(skip(self, record), fields(backend = "memory", kind = %record.kind(), name = %record.name()))]
    async fn upsert(&self, record: ConfigRecord) -> Result<()> {
        validate_record_name(record.name())?;
        let key = (record.kind(), record.name().to_string());
        let mut store = self.storage.write().await;
        store.insert(key, record);
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "memory"))]
    async fn delete(&self, kind: RecordKind, name: &str) -> Result<()> {
        let mut store = self.storage.write().await;
        store
            .remove(&(kind, name.to_string()))
            .map(|_| ())
            .ok_or_else(|| GateError::not_found(kind, name))
    }

    #[instrument(skip(self), fields(backend = "memory"))]
    async fn list(&self, kind: RecordKind) -> Result<Vec<String>> {
        let store = self.storage.read().await;
        let mut names: Vec<String> = store
            .keys()
            .filter(|(k, _)| *k == kind)
            .map(|(_, name)| name.clone())
            .collect();
        names.sort();
        Ok(names)
    }
}
