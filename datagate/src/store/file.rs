//! File-backed config store: one JSON document per record.
//!
//! Layout under the store root:
//!
//! ```text
//! <root>/datasources/<name>.json
//! <root>/assets/<name>.json
//! <root>/suites/<name>.json
//! <root>/checkpoints/<name>.json
//! ```
//!
//! Writes go through a temporary file followed by a rename, so a crash
//! mid-write never leaves a truncated record behind.

use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

use crate::error::{GateError, Result};

use super::{validate_record_name, ConfigRecord, ConfigStore, RecordKind};

/// File-backed implementation of the [`ConfigStore`] trait.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    root: PathBuf,
}

impl FileConfigStore {
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

    fn record_path(&self, kind: RecordKind, name: &str) -> PathBuf {
        self.root.join(kind.dir_name()).join(format!("{name}.json"))
    }

    fn write_atomically(&self, path: &Path, payload: &[u8]) -> Result<()> {
        let parent = path.parent().ok_or_else(|| {
            GateError::store("file", "upsert", format!("no parent for {}", path.display()))
        })?;
        fs::create_dir_all(parent)?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    #[instrument(skip(self), fields(backend = "file"))]
    async fn exists(&self, kind: RecordKind, name: &str) -> Result<bool> {
        validate_record_name(name)?;
        Ok(self.record_path(kind, name).is_file())
    }

    #[instrument(skip(self), fields(backend = "file"))]
    async fn get(&self, kind: RecordKind, name: &str) -> Result<ConfigRecord> {
        validate_record_name(name)?;
        let path = self.record_path(kind, name);
        if !path.is_file() {
            return Err(GateError::not_found(kind, name));
        }
        let payload = fs::read(&path)?;
        let record: ConfigRecord = serde_json::from_slice(&payload)?;
        if record.kind() != kind || record.name() != name {
            return Err(GateError::store(
                "file",
                "get",
                format!(
                    "record at {} does not match its key ({kind} '{name}')",
                    path.display()
                ),
            ));
        }
        Ok(record)
    }

    #[instrument(skip(self, record), fields(backend = "file", kind = %record.kind(), name = %record.name()))]
    async fn upsert(&self, record: ConfigRecord) -> Result<()> {
        validate_record_name(record.name())?;
        let path = self.record_path(record.kind(), record.name());
        let payload = serde_json::to_vec_pretty(&record)?;
        self.write_atomically(&path, &payload)?;
        debug!(path = %path.display(), "Config record written");
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "file"))]
    async fn delete(&self, kind: RecordKind, name: &str) -> Result<()> {
        validate_record_name(name)?;
        let path = self.record_path(kind, name);
        if !path.is_file() {
            return Err(GateError::not_found(kind, name));
        }
        fs::remove_file(&path)?;
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "file"))]
    async fn list(&self, kind: RecordKind) -> Result<Vec<String>> {
        let dir = self.root.join(kind.dir_name());
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}
