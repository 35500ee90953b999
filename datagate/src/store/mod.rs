//! Config store framework: named records for data sources, assets,
//! expectation suites and checkpoints, with lookup-by-name and upsert.
//!
//! The store is the single shared mutable resource in the pipeline. Names
//! are stable keys: re-running with the same names must reuse the existing
//! records, never duplicate them. The [`Reconciliation`] result makes the
//! create-once branch explicit instead of a probe-then-fetch pair.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{GateError, Result};
use crate::suite::ExpectationSuite;

pub mod file;
pub mod memory;
pub mod records;

pub use file::FileConfigStore;
pub use memory::InMemoryConfigStore;
pub use records::{AssetRecord, CheckpointRecord, DataSourceRecord};

/// The kind of a named configuration record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    DataSource,
    Asset,
    Suite,
    Checkpoint,
}

impl RecordKind {
    /// Directory name used by file-backed stores.
    pub fn dir_name(&self) -> &'static str {
        match self {
            RecordKind::DataSource => "datasources",
            RecordKind::Asset => "assets",
            RecordKind::Suite => "suites",
            RecordKind::Checkpoint => "checkpoints",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RecordKind::DataSource => "data source",
            RecordKind::Asset => "asset",
            RecordKind::Suite => "expectation suite",
            RecordKind::Checkpoint => "checkpoint",
        };
        f.write_str(label)
    }
}

/// A persisted configuration record of any kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConfigRecord {
    DataSource(DataSourceRecord),
    Asset(AssetRecord),
    Suite(ExpectationSuite),
    Checkpoint(CheckpointRecord),
}

impl ConfigRecord {
    /// Returns the record's kind.
    pub fn kind(&self) -> RecordKind {
        match self {
            ConfigRecord::DataSource(_) => RecordKind::DataSource,
            ConfigRecord::Asset(_) => RecordKind::Asset,
            ConfigRecord::Suite(_) => RecordKind::Suite,
            ConfigRecord::Checkpoint(_) => RecordKind::Checkpoint,
        }
    }

    /// Returns the record's stable name key.
    pub fn name(&self) -> &str {
        match self {
            ConfigRecord::DataSource(r) => &r.name,
            ConfigRecord::Asset(r) => &r.name,
            ConfigRecord::Suite(s) => s.name(),
            ConfigRecord::Checkpoint(r) => &r.name,
        }
    }
}

/// Outcome of a create-if-missing reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation<T> {
    /// The object was absent and has been created.
    Created(T),
    /// The object already existed and is reused unchanged.
    Existing(T),
}

impl<T> Reconciliation<T> {
    /// Returns the reconciled value, discarding the branch taken.
    pub fn into_inner(self) -> T {
        match self {
            Reconciliation::Created(value) | Reconciliation::Existing(value) => value,
        }
    }

    /// Returns true when the bootstrap branch was taken.
    pub fn was_created(&self) -> bool {
        matches!(self, Reconciliation::Created(_))
    }
}

/// Trait for configuration storage backends.
///
/// Implementations persist named records and support lookup-by-name and
/// upsert. This design assumes single-writer access; no locking is provided
/// across processes.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Returns true if a record with the given kind and name exists.
    async fn exists(&self, kind: RecordKind, name: &str) -> Result<bool>;

    /// Fetches a record by kind and name.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::NotFound`] when no such record exists.
    async fn get(&self, kind: RecordKind, name: &str) -> Result<ConfigRecord>;

    /// Inserts or replaces a record under its name key.
    async fn upsert(&self, record: ConfigRecord) -> Result<()>;

    /// Deletes a record by kind and name.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::NotFound`] when no such record exists.
    async fn delete(&self, kind: RecordKind, name: &str) -> Result<()>;

    /// Lists the names of all records of the given kind, sorted.
    async fn list(&self, kind: RecordKind) -> Result<Vec<String>>;
}

/// Typed accessors over any [`ConfigStore`].
#[async_trait]
pub trait ConfigStoreExt: ConfigStore {
    /// Fetches a data source record by name.
    async fn get_datasource(&self, name: &str) -> Result<DataSourceRecord> {
        match self.get(RecordKind::DataSource, name).await? {
            ConfigRecord::DataSource(record) => Ok(record),
            other => Err(kind_mismatch(RecordKind::DataSource, &other)),
        }
    }

    /// Fetches an asset record by name.
    async fn get_asset(&self, name: &str) -> Result<AssetRecord> {
        match self.get(RecordKind::Asset, name).await? {
            ConfigRecord::Asset(record) => Ok(record),
            other => Err(kind_mismatch(RecordKind::Asset, &other)),
        }
    }

    /// Fetches an expectation suite by name.
    async fn get_suite(&self, name: &str) -> Result<ExpectationSuite> {
        match self.get(RecordKind::Suite, name).await? {
            ConfigRecord::Suite(suite) => Ok(suite),
            other => Err(kind_mismatch(RecordKind::Suite, &other)),
        }
    }

    /// Fetches a checkpoint record by name.
    async fn get_checkpoint_record(&self, name: &str) -> Result<CheckpointRecord> {
        match self.get(RecordKind::Checkpoint, name).await? {
            ConfigRecord::Checkpoint(record) => Ok(record),
            other => Err(kind_mismatch(RecordKind::Checkpoint, &other)),
        }
    }
}

impl<T: ConfigStore + ?Sized> ConfigStoreExt for T {}

fn kind_mismatch(expected: RecordKind, got: &ConfigRecord) -> GateError {
    GateError::Internal(format!(
        "config store returned a {} record where a {expected} was requested",
        got.kind()
    ))
}

/// Rejects record names that cannot serve as stable store keys.
pub(crate) fn validate_record_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(GateError::configuration("record name cannot be empty"));
    }
    if name.len() > 256 {
        return Err(GateError::configuration(
            "record name too long (max 256 characters)",
        ));
    }
    if name
        .chars()
        .any(|c| c.is_control() || matches!(c, '/' | '\\'))
        || name.contains("..")
    {
        return Err(GateError::configuration(format!(
            "record name '{name}' contains path or control characters"
        )));
    }
    Ok(())
}
