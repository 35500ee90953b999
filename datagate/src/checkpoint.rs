//! Checkpoints: named, reusable bindings of batch source, suite and
//! post-run actions.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::context::DataContext;
use crate::error::{GateError, Result};
use crate::result::{RunId, ValidationResult};
use crate::results::ResultStore;
use crate::store::records::CheckpointRecord;
use crate::store::{ConfigStoreExt, RecordKind};
use crate::validator::Validator;

/// A post-run action. Actions run in declared order, and run regardless of
/// the validation verdict — a failed expectation is a normal outcome, not a
/// pipeline error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Persist the validation result keyed by run identifier.
    #[serde(rename = "store_validation_result")]
    PersistResult,
    /// Regenerate the data docs site.
    #[serde(rename = "update_data_docs")]
    PublishDocs,
}

/// A runnable checkpoint resolved from its stored record.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    record: CheckpointRecord,
}

impl Checkpoint {
    /// Wraps a stored checkpoint record.
    pub fn from_record(record: CheckpointRecord) -> Self {
        Self { record }
    }

    /// Returns the checkpoint's name.
    pub fn name(&self) -> &str {
        &self.record.name
    }

    /// Returns the underlying record.
    pub fn record(&self) -> &CheckpointRecord {
        &self.record
    }

    /// Executes one validation run: re-resolves the batch from the
    /// checkpoint's asset reference, evaluates the suite against it, and
    /// drives the action list.
    ///
    /// Any unresolved dependency reference aborts before the batch is
    /// built. A failing result still reaches every action.
    #[instrument(skip(self, ctx), fields(checkpoint.name = %self.record.name))]
    pub async fn run(&self, ctx: &DataContext) -> Result<ValidationResult> {
        let store = ctx.store();

        let datasource = store
            .get_datasource(&self.record.datasource)
            .await
            .map_err(|e| self.unresolved(RecordKind::DataSource, &self.record.datasource, e))?;
        let asset = store
            .get_asset(&self.record.asset)
            .await
            .map_err(|e| self.unresolved(RecordKind::Asset, &self.record.asset, e))?;
        let suite = store
            .get_suite(&self.record.suite)
            .await
            .map_err(|e| self.unresolved(RecordKind::Suite, &self.record.suite, e))?;

        let request = asset.build_batch_request(self.record.filter.clone());
        let batch = ctx.catalog().resolve(&datasource, &asset, &request).await?;

        let run_id = RunId::render(&self.record.run_name_template);
        info!(
            checkpoint.name = %self.record.name,
            run.id = %run_id.value,
            suite.name = %suite.name(),
            "Executing checkpoint"
        );

        let validator = Validator::bind(batch, suite);
        let result = validator.evaluate_as(run_id).await?;

        for action in &self.record.actions {
            debug!(
                checkpoint.name = %self.record.name,
                action = ?action,
                run.id = %result.run_id,
                "Running post-validation action"
            );
            match action {
                Action::PersistResult => ctx.results().save(&result).await?,
                Action::PublishDocs => {
                    ctx.docs().rebuild(ctx.results()).await?;
                }
            }
        }

        Ok(result)
    }

    fn unresolved(&self, kind: RecordKind, name: &str, cause: GateError) -> GateError {
        match cause {
            GateError::NotFound { .. } => GateError::configuration(format!(
                "checkpoint '{}' references {kind} '{name}' which does not exist",
                self.record.name
            )),
            other => other,
        }
    }
}
