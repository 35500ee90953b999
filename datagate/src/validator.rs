//! The validator: binds a batch to a suite and evaluates it.
//!
//! Evaluation never short-circuits: every expectation runs, failures are
//! aggregated into the [`ValidationResult`]. The validator also carries the
//! interactive authoring session — [`dry_run`](Validator::dry_run) tests a
//! rule against the live batch without persisting anything, while
//! [`commit`](Validator::commit) records it into the bound suite; the two
//! are never conflated.

use std::time::Instant;

use arrow::record_batch::RecordBatch;
use tracing::{debug, info, instrument, warn};

use crate::batch::Batch;
use crate::error::Result;
use crate::expectations::{Rule, RuleOutcome};
use crate::result::{ExpectationResult, RunId, ValidationResult};
use crate::store::{ConfigRecord, ConfigStore};
use crate::suite::ExpectationSuite;

/// Run-id template used when evaluating outside a checkpoint.
const DEFAULT_RUN_TEMPLATE: &str = "%Y%m%d-%H%M%S-validation";

/// Binds a resolved batch and an expectation suite together.
pub struct Validator {
    batch: Batch,
    suite: ExpectationSuite,
}

impl Validator {
    /// Binds a batch and a suite into a validator session.
    pub fn bind(batch: Batch, suite: ExpectationSuite) -> Self {
        Self { batch, suite }
    }

    /// Returns the bound suite, including any committed expectations.
    pub fn suite(&self) -> &ExpectationSuite {
        &self.suite
    }

    /// Returns the bound batch.
    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    /// Evaluates every expectation in the suite against the batch.
    pub async fn evaluate(&self) -> Result<ValidationResult> {
        self.evaluate_as(RunId::render(DEFAULT_RUN_TEMPLATE)).await
    }

    /// Evaluates under an explicit run identifier.
    ///
    /// All expectations run regardless of earlier failures; only engine and
    /// connectivity errors abort the evaluation.
    #[instrument(skip(self, run_id), fields(
        suite.name = %self.suite.name(),
        suite.expectations = self.suite.len(),
        run.id = %run_id.value
    ))]
    pub async fn evaluate_as(&self, run_id: RunId) -> Result<ValidationResult> {
        info!(
            suite.name = %self.suite.name(),
            suite.expectations = self.suite.len(),
            "Starting validation run"
        );
        let start_time = Instant::now();

        let mut results = Vec::with_capacity(self.suite.len());
        let mut success = true;

        for rule in self.suite.expectations() {
            debug!(
                rule.name = %rule.name(),
                rule.column = ?rule.column(),
                "Evaluating expectation"
            );

            let outcome = rule.evaluate(&self.batch).await?;
            if !outcome.is_passed() {
                success = false;
                warn!(
                    rule.name = %rule.name(),
                    rule.column = ?rule.column(),
                    outcome.observed = ?outcome.observed,
                    outcome.message = %outcome.message.as_deref().unwrap_or("expectation failed"),
                    "Expectation failed"
                );
            }
            results.push(ExpectationResult::from_outcome(rule, outcome));
        }

        let duration_ms = start_time.elapsed().as_millis() as u64;
        info!(
            suite.name = %self.suite.name(),
            run.id = %run_id.value,
            run.passed = results.iter().filter(|r| r.is_passed()).count(),
            run.failed = results.iter().filter(|r| !r.is_passed()).count(),
            run.duration_ms = duration_ms,
            run.result = %if success { "passed" } else { "failed" },
            "Validation run completed"
        );

        Ok(ValidationResult {
            run_id: run_id.value,
            run_time: run_id.run_time,
            suite_name: self.suite.name().to_string(),
            success,
            results,
            duration_ms,
        })
    }

    /// Returns a small, bounded sample of rows for interactive inspection.
    ///
    /// Diagnostic only; no contract on row count beyond the cap.
    pub async fn preview(&self, limit: usize) -> Result<Vec<RecordBatch>> {
        self.batch.head(limit).await
    }

    /// Tests a rule against the live batch without recording it.
    pub async fn dry_run(&self, rule: &Rule) -> Result<RuleOutcome> {
        rule.evaluate(&self.batch).await
    }

    /// Records a rule into the bound suite. Does not touch any store.
    pub fn commit(&mut self, rule: Rule) {
        debug!(
            rule.name = %rule.name(),
            rule.column = ?rule.column(),
            suite.name = %self.suite.name(),
            "Committing authored expectation to suite"
        );
        self.suite.add_expectation(rule);
    }

    /// Persists the bound suite — including committed expectations — into
    /// the config store.
    pub async fn save_suite(&self, store: &dyn ConfigStore) -> Result<()> {
        store.upsert(ConfigRecord::Suite(self.suite.clone())).await
    }
}
