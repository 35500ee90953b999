//! The data context: the explicit session object tying the stores, the
//! source catalog and the docs builder together.
//!
//! One context is created at process start and passed by reference to every
//! component — there is no ambient global. Registration methods implement
//! the create-once policy: a name either reuses its existing definition
//! unchanged or fails on conflict; nothing is silently overwritten.

use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::batch::BatchRequest;
use crate::checkpoint::Checkpoint;
use crate::docs::DataDocs;
use crate::error::{GateError, Result};
use crate::results::{FileResultStore, InMemoryResultStore, ResultStore};
use crate::sources::SourceCatalog;
use crate::store::records::{AssetRecord, CheckpointRecord, DataSourceRecord};
use crate::store::{
    ConfigRecord, ConfigStore, ConfigStoreExt, FileConfigStore, InMemoryConfigStore,
    Reconciliation, RecordKind,
};
use crate::suite::ExpectationSuite;
use crate::validator::Validator;

/// The entry point for gate operations; holds all relevant state.
#[derive(Clone)]
pub struct DataContext {
    store: Arc<dyn ConfigStore>,
    results: Arc<dyn ResultStore>,
    catalog: SourceCatalog,
    docs: DataDocs,
}

impl DataContext {
    /// Creates a context over explicit backends.
    pub fn new(
        store: Arc<dyn ConfigStore>,
        results: Arc<dyn ResultStore>,
        catalog: SourceCatalog,
        docs: DataDocs,
    ) -> Self {
        Self {
            store,
            results,
            catalog,
            docs,
        }
    }

    /// Creates an ephemeral context: in-memory stores, docs under the given
    /// directory. Suited to tests and experiments.
    pub fn in_memory(docs_root: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(
            Arc::new(InMemoryConfigStore::new()),
            Arc::new(InMemoryResultStore::new()),
            SourceCatalog::new(),
            DataDocs::new(docs_root.as_ref())?,
        ))
    }

    /// Creates a file-backed context rooted at a project directory:
    ///
    /// ```text
    /// <root>/store/…         config records
    /// <root>/validations/…   persisted results
    /// <root>/docs/…          data docs site
    /// ```
    ///
    /// Configuration written here survives across invocations.
    pub fn file_backed(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        Ok(Self::new(
            Arc::new(FileConfigStore::new(root.join("store"))?),
            Arc::new(FileResultStore::new(root.join("validations"))?),
            SourceCatalog::new(),
            DataDocs::new(root.join("docs"))?,
        ))
    }

    /// Returns the config store.
    pub fn store(&self) -> &dyn ConfigStore {
        self.store.as_ref()
    }

    /// Returns the result store.
    pub fn results(&self) -> &dyn ResultStore {
        self.results.as_ref()
    }

    /// Returns the runtime source catalog.
    pub fn catalog(&self) -> &SourceCatalog {
        &self.catalog
    }

    /// Returns the data docs builder.
    pub fn docs(&self) -> &DataDocs {
        &self.docs
    }

    /// Registers a SQL data source, reusing an identical existing
    /// definition.
    ///
    /// # Errors
    ///
    /// [`GateError::Duplicate`] when the name exists with a different
    /// connection string.
    #[instrument(skip(self, connection))]
    pub async fn add_sql_datasource(
        &self,
        name: &str,
        connection: &str,
    ) -> Result<Reconciliation<DataSourceRecord>> {
        if self.store.exists(RecordKind::DataSource, name).await? {
            let existing = self.store.get_datasource(name).await?;
            if existing.connection != connection {
                return Err(GateError::duplicate(
                    RecordKind::DataSource,
                    name,
                    "registered with a different connection string",
                ));
            }
            return Ok(Reconciliation::Existing(existing));
        }

        let record = DataSourceRecord::new(name, connection);
        self.store
            .upsert(ConfigRecord::DataSource(record.clone()))
            .await?;
        info!(datasource.name = %name, "Data source registered");
        Ok(Reconciliation::Created(record))
    }

    /// Declares a table as a named, queryable asset of a data source.
    ///
    /// The data source must already be registered. Re-declaring an asset
    /// with the identical definition reuses it; a conflicting definition
    /// fails — assets are never silently overwritten.
    #[instrument(skip(self))]
    pub async fn add_table_asset(
        &self,
        datasource: &str,
        name: &str,
        schema_name: &str,
        table_name: &str,
    ) -> Result<Reconciliation<AssetRecord>> {
        if !self.store.exists(RecordKind::DataSource, datasource).await? {
            return Err(GateError::configuration(format!(
                "cannot register asset '{name}': data source '{datasource}' does not exist"
            )));
        }

        let record = AssetRecord::new(name, datasource, schema_name, table_name);
        if self.store.exists(RecordKind::Asset, name).await? {
            let existing = self.store.get_asset(name).await?;
            if existing.conflicts_with(&record) {
                return Err(GateError::duplicate(
                    RecordKind::Asset,
                    name,
                    format!(
                        "registered as {}.{} on '{}', requested {}.{} on '{}'",
                        existing.schema_name,
                        existing.table_name,
                        existing.datasource,
                        schema_name,
                        table_name,
                        datasource
                    ),
                ));
            }
            return Ok(Reconciliation::Existing(existing));
        }

        self.store
            .upsert(ConfigRecord::Asset(record.clone()))
            .await?;
        info!(asset.name = %name, table = %format!("{schema_name}.{table_name}"), "Table asset registered");
        Ok(Reconciliation::Created(record))
    }

    /// Creates a new expectation suite.
    ///
    /// # Errors
    ///
    /// [`GateError::Duplicate`] when a suite with this name already exists;
    /// use [`add_or_update_expectation_suite`](Self::add_or_update_expectation_suite)
    /// when reuse is intended.
    pub async fn add_expectation_suite(&self, suite: ExpectationSuite) -> Result<()> {
        if self.store.exists(RecordKind::Suite, suite.name()).await? {
            return Err(GateError::duplicate(
                RecordKind::Suite,
                suite.name(),
                "a suite with this name already exists",
            ));
        }
        self.store.upsert(ConfigRecord::Suite(suite)).await
    }

    /// Inserts or replaces an expectation suite.
    pub async fn add_or_update_expectation_suite(&self, suite: ExpectationSuite) -> Result<()> {
        self.store.upsert(ConfigRecord::Suite(suite)).await
    }

    /// Inserts or replaces a checkpoint.
    pub async fn add_or_update_checkpoint(&self, record: CheckpointRecord) -> Result<()> {
        self.store.upsert(ConfigRecord::Checkpoint(record)).await
    }

    /// Fetches an existing checkpoint by name.
    pub async fn get_checkpoint(&self, name: &str) -> Result<Checkpoint> {
        let record = self.store.get_checkpoint_record(name).await?;
        Ok(Checkpoint::from_record(record))
    }

    /// Builds a validator session for a batch request and a stored suite.
    ///
    /// Resolves the request's data source and asset from the config store,
    /// pulls the batch, and binds it to the suite.
    pub async fn get_validator(
        &self,
        request: &BatchRequest,
        suite_name: &str,
    ) -> Result<Validator> {
        let datasource = self.store.get_datasource(&request.datasource).await?;
        let asset = self.store.get_asset(&request.asset).await?;
        let suite = self.store.get_suite(suite_name).await?;

        let batch = self.catalog.resolve(&datasource, &asset, request).await?;
        Ok(Validator::bind(batch, suite))
    }
}
