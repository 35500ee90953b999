//! Batch planning and the resolved batch handle.
//!
//! A [`BatchRequest`] is a pure description of which rows to pull for one
//! validation run; it never executes anything itself. Resolution into a
//! [`Batch`] happens in [`crate::sources::SourceCatalog`].

use arrow::record_batch::RecordBatch;
use datafusion::prelude::SessionContext;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::security;

/// Filter and partition parameters for a batch. Empty means "all rows".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchFilter {
    /// Column equality partitions, applied in declared order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partitions: Vec<(String, String)>,
    /// Optional cap on the number of rows pulled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl BatchFilter {
    /// Creates an empty filter selecting all rows.
    pub fn all_rows() -> Self {
        Self::default()
    }

    /// Adds a column equality partition.
    pub fn partition(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.partitions.push((column.into(), value.into()));
        self
    }

    /// Caps the number of rows pulled.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns true when the filter selects all rows.
    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty() && self.limit.is_none()
    }

    /// Renders the filter as SQL appended to a `SELECT *` over the source
    /// table. Identifiers and literals are vetted before interpolation.
    pub(crate) fn to_sql_suffix(&self) -> Result<String> {
        let mut sql = String::new();
        if !self.partitions.is_empty() {
            let mut clauses = Vec::with_capacity(self.partitions.len());
            for (column, value) in &self.partitions {
                let ident = security::escape_identifier(column)?;
                let literal = security::escape_string_literal(value)?;
                clauses.push(format!("{ident} = '{literal}'"));
            }
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        Ok(sql)
    }
}

/// A concrete request describing which rows to pull for validation.
///
/// Ephemeral and derived from an asset; recreated on every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest {
    /// Name of the data source to pull from.
    pub datasource: String,
    /// Name of the asset within the data source.
    pub asset: String,
    /// Filter applied when pulling rows.
    #[serde(default)]
    pub filter: BatchFilter,
}

/// A live batch: a query session with the validated table registered.
///
/// All expectation SQL runs against [`Batch::table_name`].
pub struct Batch {
    ctx: SessionContext,
    table: String,
}

impl std::fmt::Debug for Batch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Batch")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl Batch {
    /// Wraps an already-prepared session.
    ///
    /// The table name must already be registered in the context; it is
    /// vetted here so expectation SQL can interpolate it directly.
    pub fn new(ctx: SessionContext, table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        security::validate_identifier(&table)?;
        Ok(Self { ctx, table })
    }

    /// The registered table name expectations evaluate against.
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Runs a query against the batch session and collects the results.
    pub(crate) async fn query(&self, sql: &str) -> Result<Vec<RecordBatch>> {
        let df = self.ctx.sql(sql).await?;
        Ok(df.collect().await?)
    }

    /// Returns a small, bounded sample of rows for interactive inspection.
    pub async fn head(&self, limit: usize) -> Result<Vec<RecordBatch>> {
        let limit = limit.min(100);
        let table = &self.table;
        self.query(&format!("SELECT * FROM {table} LIMIT {limit}"))
            .await
    }

    /// Counts the rows in the batch.
    pub async fn row_count(&self) -> Result<u64> {
        let table = &self.table;
        let batches = self
            .query(&format!("SELECT COUNT(*) AS row_count FROM {table}"))
            .await?;
        let count = crate::expectations::int_value(&batches, 0, "row count")?;
        Ok(count.max(0) as u64)
    }
}
