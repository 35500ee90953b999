//! Validation run results and run identifiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::expectations::{RuleOutcome, RuleStatus};

/// A run identifier rendered from a strftime template.
///
/// Templates follow the `%Y%m%d-%H%M%S-my-run-name-template` convention:
/// strftime specifiers are expanded against the run time, literal text is
/// kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunId {
    /// Rendered identifier, e.g. `20260807-141502-my-run-name-template`.
    pub value: String,
    /// The instant the run started.
    pub run_time: DateTime<Utc>,
}

impl RunId {
    /// Renders a run id from a template at the current instant.
    pub fn render(template: &str) -> Self {
        Self::render_at(template, Utc::now())
    }

    /// Renders a run id from a template at an explicit instant.
    pub fn render_at(template: &str, run_time: DateTime<Utc>) -> Self {
        Self {
            value: run_time.format(template).to_string(),
            run_time,
        }
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

/// The recorded outcome of a single expectation within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectationResult {
    /// Wire name of the evaluated rule.
    pub rule: String,
    /// Target column, when the rule is column-scoped.
    pub column: Option<String>,
    /// Pass/fail status.
    pub status: RuleStatus,
    /// Observed value backing the decision.
    pub observed: Option<f64>,
    /// Detail message, present on failures.
    pub message: Option<String>,
}

impl ExpectationResult {
    /// Returns true when the expectation held.
    pub fn is_passed(&self) -> bool {
        self.status == RuleStatus::Passed
    }

    pub(crate) fn from_outcome(
        rule: &crate::expectations::Rule,
        outcome: RuleOutcome,
    ) -> Self {
        Self {
            rule: rule.name().to_string(),
            column: rule.column().map(str::to_string),
            status: outcome.status,
            observed: outcome.observed,
            message: outcome.message,
        }
    }
}

/// The structured outcome of evaluating a suite against a batch.
///
/// Produced fresh on every run; persisted only by the persist-result action.
/// A failing expectation makes `success` false but is never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Timestamp-derived run identifier.
    pub run_id: String,
    /// The instant the run started.
    pub run_time: DateTime<Utc>,
    /// Name of the evaluated suite.
    pub suite_name: String,
    /// True when every expectation passed.
    pub success: bool,
    /// Per-expectation outcomes in suite order.
    pub results: Vec<ExpectationResult>,
    /// Wall-clock evaluation time.
    pub duration_ms: u64,
}

impl ValidationResult {
    /// Number of passing expectations.
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_passed()).count()
    }

    /// Number of failing expectations.
    pub fn failed_count(&self) -> usize {
        self.results.len() - self.passed_count()
    }

    /// Iterates over the failing entries only.
    pub fn failures(&self) -> impl Iterator<Item = &ExpectationResult> {
        self.results.iter().filter(|r| !r.is_passed())
    }
}
