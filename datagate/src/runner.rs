//! The checkpoint runner: reconciles configuration state and drives a
//! validation run end to end.
//!
//! The run walks a fixed machine: Resolve → (Bootstrap | Reuse) → Execute →
//! Act → Done. Resolution branches on a single probe — whether the plan's
//! data source name exists — and is all-or-nothing: either the whole
//! dependency chain is created, or the existing checkpoint is fetched
//! verbatim. Existing definitions are not diffed against the plan.

use tracing::{info, instrument};

use crate::batch::BatchFilter;
use crate::checkpoint::{Action, Checkpoint};
use crate::context::DataContext;
use crate::error::Result;
use crate::expectations::Rule;
use crate::result::ValidationResult;
use crate::store::records::CheckpointRecord;
use crate::store::{ConfigStore, Reconciliation, RecordKind};
use crate::suite::ExpectationSuite;

/// Declarative description of the configuration a gate needs: what to
/// create when the named objects are absent.
#[derive(Debug, Clone)]
pub struct CheckpointPlan {
    checkpoint_name: String,
    run_name_template: String,
    datasource_name: String,
    connection: String,
    asset_name: String,
    schema_name: String,
    table_name: String,
    suite_name: String,
    expectations: Vec<Rule>,
    authored: Vec<Rule>,
    actions: Vec<Action>,
    filter: BatchFilter,
}

impl CheckpointPlan {
    /// Starts a plan for the given checkpoint name.
    pub fn new(checkpoint_name: impl Into<String>) -> Self {
        let checkpoint_name = checkpoint_name.into();
        Self {
            run_name_template: format!("%Y%m%d-%H%M%S-{checkpoint_name}"),
            checkpoint_name,
            datasource_name: String::new(),
            connection: String::new(),
            asset_name: String::new(),
            schema_name: String::new(),
            table_name: String::new(),
            suite_name: String::new(),
            expectations: Vec::new(),
            authored: Vec::new(),
            actions: vec![Action::PersistResult, Action::PublishDocs],
            filter: BatchFilter::all_rows(),
        }
    }

    /// Sets the run-name template (strftime plus literal text).
    pub fn run_name_template(mut self, template: impl Into<String>) -> Self {
        self.run_name_template = template.into();
        self
    }

    /// Names the data source and its connection string.
    pub fn datasource(mut self, name: impl Into<String>, connection: impl Into<String>) -> Self {
        self.datasource_name = name.into();
        self.connection = connection.into();
        self
    }

    /// Names the table asset and the table it points at.
    pub fn table_asset(
        mut self,
        name: impl Into<String>,
        schema_name: impl Into<String>,
        table_name: impl Into<String>,
    ) -> Self {
        self.asset_name = name.into();
        self.schema_name = schema_name.into();
        self.table_name = table_name.into();
        self
    }

    /// Names the expectation suite.
    pub fn suite(mut self, name: impl Into<String>) -> Self {
        self.suite_name = name.into();
        self
    }

    /// Adds a declarative expectation to the bootstrapped suite.
    pub fn expect(mut self, rule: Rule) -> Self {
        self.expectations.push(rule);
        self
    }

    /// Adds an expectation authored by validating: during bootstrap it is
    /// first tested against the live batch, then committed to the suite.
    pub fn author_by_validating(mut self, rule: Rule) -> Self {
        self.authored.push(rule);
        self
    }

    /// Replaces the default action list.
    pub fn actions(mut self, actions: Vec<Action>) -> Self {
        self.actions = actions;
        self
    }

    /// Appends a post-run action.
    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Sets the batch filter template.
    pub fn filter(mut self, filter: BatchFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Returns the checkpoint name.
    pub fn checkpoint_name(&self) -> &str {
        &self.checkpoint_name
    }
}

/// Drives the Resolve → (Bootstrap | Reuse) → Execute → Act → Done machine
/// for one plan against one context.
pub struct CheckpointRunner<'a> {
    ctx: &'a DataContext,
    plan: CheckpointPlan,
}

impl<'a> CheckpointRunner<'a> {
    /// Creates a runner for the plan.
    pub fn new(ctx: &'a DataContext, plan: CheckpointPlan) -> Self {
        Self { ctx, plan }
    }

    /// Runs the full machine and returns the fresh validation result.
    ///
    /// Results are never cached: Execute and Act happen on every
    /// invocation, whichever resolution branch was taken.
    pub async fn run(&self) -> Result<ValidationResult> {
        let checkpoint = self.resolve().await?.into_inner();
        checkpoint.run(self.ctx).await
    }

    /// Resolves the checkpoint: bootstraps the full dependency chain when
    /// the plan's data source is absent, fetches the existing checkpoint
    /// otherwise.
    #[instrument(skip(self), fields(checkpoint.name = %self.plan.checkpoint_name))]
    pub async fn resolve(&self) -> Result<Reconciliation<Checkpoint>> {
        let store: &dyn ConfigStore = self.ctx.store();
        if store
            .exists(RecordKind::DataSource, &self.plan.datasource_name)
            .await?
        {
            info!(
                datasource.name = %self.plan.datasource_name,
                checkpoint.name = %self.plan.checkpoint_name,
                "Data source exists, reusing stored checkpoint"
            );
            let checkpoint = self.ctx.get_checkpoint(&self.plan.checkpoint_name).await?;
            return Ok(Reconciliation::Existing(checkpoint));
        }

        info!(
            datasource.name = %self.plan.datasource_name,
            checkpoint.name = %self.plan.checkpoint_name,
            "Data source does not exist, bootstrapping configuration"
        );
        let checkpoint = self.bootstrap().await?;
        Ok(Reconciliation::Created(checkpoint))
    }

    /// Creates the dependency chain — data source, asset, suite,
    /// checkpoint — and upserts each.
    ///
    /// A failure mid-chain leaves earlier records in place; there is no
    /// transactional rollback across the chain.
    async fn bootstrap(&self) -> Result<Checkpoint> {
        let plan = &self.plan;

        self.ctx
            .add_sql_datasource(&plan.datasource_name, &plan.connection)
            .await?;
        let asset = self
            .ctx
            .add_table_asset(
                &plan.datasource_name,
                &plan.asset_name,
                &plan.schema_name,
                &plan.table_name,
            )
            .await?
            .into_inner();

        let mut builder = ExpectationSuite::builder(&plan.suite_name);
        for rule in &plan.expectations {
            rule.validate()?;
            builder = builder.expect(rule.clone());
        }
        self.ctx.add_expectation_suite(builder.build()).await?;

        // Interactive authoring: test each remaining rule against the live
        // batch, then commit it and persist the converged suite.
        if !plan.authored.is_empty() {
            let request = asset.build_batch_request(plan.filter.clone());
            let mut validator = self.ctx.get_validator(&request, &plan.suite_name).await?;

            for rule in &plan.authored {
                let outcome = validator.dry_run(rule).await?;
                info!(
                    rule.name = %rule.name(),
                    rule.column = ?rule.column(),
                    outcome.passed = outcome.is_passed(),
                    "Authored expectation tested against live batch"
                );
                validator.commit(rule.clone());
            }
            validator.save_suite(self.ctx.store()).await?;
        }

        let record = CheckpointRecord {
            name: plan.checkpoint_name.clone(),
            run_name_template: plan.run_name_template.clone(),
            datasource: plan.datasource_name.clone(),
            asset: plan.asset_name.clone(),
            suite: plan.suite_name.clone(),
            filter: plan.filter.clone(),
            actions: plan.actions.clone(),
        };
        self.ctx.add_or_update_checkpoint(record.clone()).await?;

        Ok(Checkpoint::from_record(record))
    }
}
