//! Persisted configuration records.
//!
//! Each record is keyed by a stable name and round-trips through JSON. The
//! expectation suite doubles as its own record and lives in
//! [`crate::suite`].

use crate::batch::{BatchFilter, BatchRequest};
use crate::checkpoint::Action;
use serde::{Deserialize, Serialize};

/// A named SQL data source.
///
/// The connection descriptor is stored opaquely and parsed into a
/// [`ConnectionSpec`](crate::sources::ConnectionSpec) when the SQL layer
/// first connects. Immutable after creation within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSourceRecord {
    /// Unique data source name.
    pub name: String,
    /// Opaque connection descriptor, e.g. `postgresql://…` or `mem://demo`.
    pub connection: String,
}

impl DataSourceRecord {
    /// Creates a new data source record.
    pub fn new(name: impl Into<String>, connection: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            connection: connection.into(),
        }
    }
}

/// A named table asset scoped to a data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Unique asset name (scoped to the data source).
    pub name: String,
    /// Name of the owning data source (non-owning back-reference).
    pub datasource: String,
    /// Schema identifier, e.g. `dbo` or `sales`.
    pub schema_name: String,
    /// Table identifier within the schema.
    pub table_name: String,
}

impl AssetRecord {
    /// Creates a new table asset record.
    pub fn new(
        name: impl Into<String>,
        datasource: impl Into<String>,
        schema_name: impl Into<String>,
        table_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            datasource: datasource.into(),
            schema_name: schema_name.into(),
            table_name: table_name.into(),
        }
    }

    /// Plans a batch request for this asset. Pure construction, no I/O.
    pub fn build_batch_request(&self, filter: BatchFilter) -> BatchRequest {
        BatchRequest {
            datasource: self.datasource.clone(),
            asset: self.name.clone(),
            filter,
        }
    }

    /// Returns true when another definition conflicts with this one.
    pub fn conflicts_with(&self, other: &AssetRecord) -> bool {
        self.name == other.name
            && (self.schema_name != other.schema_name
                || self.table_name != other.table_name
                || self.datasource != other.datasource)
    }
}

/// A named, reusable binding of batch source, suite and post-run actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    /// Unique checkpoint name.
    pub name: String,
    /// strftime template rendered into the run identifier,
    /// e.g. `%Y%m%d-%H%M%S-my-run-name-template`.
    pub run_name_template: String,
    /// Referenced data source name.
    pub datasource: String,
    /// Referenced asset name.
    pub asset: String,
    /// Referenced expectation suite name.
    pub suite: String,
    /// Batch request template applied on every run.
    #[serde(default)]
    pub filter: BatchFilter,
    /// Post-run actions, executed in declared order.
    pub actions: Vec<Action>,
}
