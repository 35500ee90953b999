//! Result store: persists validation results keyed by run identifier.
//!
//! Same backend split as the config store — in-memory for tests and
//! development, JSON files for anything that must survive the process.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::error::{GateError, Result};
use crate::result::ValidationResult;

/// Trait for validation result storage backends.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Persists a validation result under its run identifier, replacing any
    /// earlier result with the same identifier.
    async fn save(&self, result: &ValidationResult) -> Result<()>;

    /// Fetches a result by run identifier.
    async fn get(&self, run_id: &str) -> Result<Option<ValidationResult>>;

    /// Lists all stored run identifiers, sorted ascending.
    ///
    /// Run ids lead with a timestamp, so the sort is chronological.
    async fn list_run_ids(&self) -> Result<Vec<String>>;
}

/// In-memory implementation of the [`ResultStore`] trait.
#[derive(Clone, Default)]
pub struct InMemoryResultStore {
    storage: Arc<RwLock<HashMap<String, ValidationResult>>>,
}

impl InMemoryResultStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    #[instrument(skip(self, result), fields(backend = "memory", run.id = %result.run_id))]
    async fn save(&self, result: &ValidationResult) -> Result<()> {
        let mut store = self.storage.write().await;
        store.insert(result.run_id.clone(), result.clone());
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "memory"))]
    async fn get(&self, run_id: &str) -> Result<Option<ValidationResult>> {
        let store = self.storage.read().await;
        Ok(store.get(run_id).cloned())
    }

    #[instrument(skip(self), fields(backend = "memory"))]
    async fn list_run_ids(&self) -> Result<Vec<String>> {
        let store = self.storage.read().await;
        let mut ids: Vec<String> = store.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

/// File-backed implementation: `<root>/<run_id>.json` per result.
#[derive(Debug, Clone)]
pub struct FileResultStore {
    root: PathBuf,
}

impl FileResultStore {
    /// Opens (or initializes) a store rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Returns the store's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn result_path(&self, run_id: &str) -> Result<PathBuf> {
        if run_id.is_empty()
            || run_id.contains("..")
            || run_id.chars().any(|c| c.is_control() || matches!(c, '/' | '\\'))
        {
            return Err(GateError::configuration(format!(
                "run id '{run_id}' cannot serve as a storage key"
            )));
        }
        Ok(self.root.join(format!("{run_id}.json")))
    }
}

#[async_trait]
impl ResultStore for FileResultStore {
    #[instrument(skip(self, result), fields(backend = "file", run.id = %result.run_id))]
    async fn save(&self, result: &ValidationResult) -> Result<()> {
        let path = self.result_path(&result.run_id)?;
        let payload = serde_json::to_vec_pretty(result)?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), "Validation result written");
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "file"))]
    async fn get(&self, run_id: &str) -> Result<Option<ValidationResult>> {
        let path = self.result_path(run_id)?;
        if !path.is_file() {
            return Ok(None);
        }
        let payload = fs::read(&path)?;
        Ok(Some(serde_json::from_slice(&payload)?))
    }

    #[instrument(skip(self), fields(backend = "file"))]
    async fn list_run_ids(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}
