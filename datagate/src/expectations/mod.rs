//! The expectation rule catalog and its evaluation engine.
//!
//! Rules form a closed, serializable catalog: every supported rule is a
//! variant of [`Rule`], tagged on the wire with the engine's canonical rule
//! identifier. Construction by name goes through [`Rule::from_config`],
//! which fails fast on names the engine cannot resolve — an unresolvable
//! rule never silently no-ops.
//!
//! Evaluation issues aggregate SQL against the resolved batch and reduces
//! the answer to a pass/fail outcome with an observed value.

use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::batch::Batch;
use crate::error::{GateError, Result};
use crate::security;

mod between;
mod in_set;
mod not_null;
mod regex_match;
mod row_count;
mod unique;

/// Wire names of every rule the engine can resolve, in catalog order.
pub const RULE_CATALOG: &[&str] = &[
    "expect_column_values_to_not_be_null",
    "expect_column_values_to_be_between",
    "expect_column_values_to_be_unique",
    "expect_column_values_to_be_in_set",
    "expect_column_values_to_match_regex",
    "expect_table_row_count_to_be_between",
];

/// A single declarative correctness rule applied to one column or table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule")]
pub enum Rule {
    /// Every value in the column must be non-null.
    #[serde(rename = "expect_column_values_to_not_be_null")]
    NotNull { column: String },

    /// Every non-null value in the column must fall inside `[min, max]`.
    #[serde(rename = "expect_column_values_to_be_between")]
    ValuesBetween { column: String, min: f64, max: f64 },

    /// Every non-null value in the column must occur exactly once.
    #[serde(rename = "expect_column_values_to_be_unique")]
    Unique { column: String },

    /// Every non-null value in the column must be a member of the set.
    #[serde(rename = "expect_column_values_to_be_in_set")]
    InSet { column: String, values: Vec<String> },

    /// Every non-null value in the column must match the regex.
    #[serde(rename = "expect_column_values_to_match_regex")]
    MatchRegex { column: String, pattern: String },

    /// The batch row count must fall inside `[min, max]`.
    #[serde(rename = "expect_table_row_count_to_be_between")]
    RowCountBetween { min: u64, max: u64 },
}

impl Rule {
    /// Builds a rule from its wire name and a parameter object.
    ///
    /// Both authoring paths — declarative configuration and interactive
    /// authoring — converge on the same [`Rule`] shape through this
    /// constructor or the enum literals directly.
    ///
    /// # Errors
    ///
    /// [`GateError::UnknownRule`] when the name is not in [`RULE_CATALOG`];
    /// [`GateError::Configuration`] when the parameters do not fit the rule.
    pub fn from_config(name: &str, params: Value) -> Result<Self> {
        if !RULE_CATALOG.contains(&name) {
            return Err(GateError::UnknownRule(name.to_string()));
        }

        let mut object = match params {
            Value::Object(map) => map,
            Value::Null => serde_json::Map::new(),
            _ => {
                return Err(GateError::configuration(
                    "expectation parameters must be a JSON object",
                ))
            }
        };
        object.insert("rule".to_string(), Value::String(name.to_string()));

        serde_json::from_value(Value::Object(object)).map_err(|e| {
            GateError::configuration(format!("invalid parameters for rule '{name}': {e}"))
        })
    }

    /// Returns the rule's wire name.
    pub fn name(&self) -> &'static str {
        match self {
            Rule::NotNull { .. } => "expect_column_values_to_not_be_null",
            Rule::ValuesBetween { .. } => "expect_column_values_to_be_between",
            Rule::Unique { .. } => "expect_column_values_to_be_unique",
            Rule::InSet { .. } => "expect_column_values_to_be_in_set",
            Rule::MatchRegex { .. } => "expect_column_values_to_match_regex",
            Rule::RowCountBetween { .. } => "expect_table_row_count_to_be_between",
        }
    }

    /// Returns the target column, if the rule is column-scoped.
    pub fn column(&self) -> Option<&str> {
        match self {
            Rule::NotNull { column }
            | Rule::ValuesBetween { column, .. }
            | Rule::Unique { column }
            | Rule::InSet { column, .. }
            | Rule::MatchRegex { column, .. } => Some(column),
            Rule::RowCountBetween { .. } => None,
        }
    }

    /// Checks the rule's own parameters without touching any data.
    pub fn validate(&self) -> Result<()> {
        if let Some(column) = self.column() {
            security::validate_identifier(column)?;
        }
        match self {
            Rule::ValuesBetween { min, max, .. } if min > max => {
                Err(GateError::configuration(format!(
                    "invalid range for {}: min {min} exceeds max {max}",
                    self.name()
                )))
            }
            Rule::RowCountBetween { min, max } if min > max => {
                Err(GateError::configuration(format!(
                    "invalid range for {}: min {min} exceeds max {max}",
                    self.name()
                )))
            }
            Rule::MatchRegex { pattern, .. } => {
                security::validate_regex_pattern(pattern).map(|_| ())
            }
            _ => Ok(()),
        }
    }

    /// Evaluates the rule against a resolved batch.
    ///
    /// A rule evaluating to false is a normal outcome, returned as a
    /// [`RuleStatus::Failed`] outcome — only engine and connectivity
    /// problems surface as errors.
    pub async fn evaluate(&self, batch: &Batch) -> Result<RuleOutcome> {
        self.validate()?;
        match self {
            Rule::NotNull { column } => not_null::evaluate(batch, column).await,
            Rule::ValuesBetween { column, min, max } => {
                between::evaluate(batch, column, *min, *max).await
            }
            Rule::Unique { column } => unique::evaluate(batch, column).await,
            Rule::InSet { column, values } => in_set::evaluate(batch, column, values).await,
            Rule::MatchRegex { column, pattern } => {
                regex_match::evaluate(batch, column, pattern).await
            }
            Rule::RowCountBetween { min, max } => row_count::evaluate(batch, *min, *max).await,
        }
    }
}

/// The status of one evaluated expectation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleStatus {
    /// The expectation held against the batch
    Passed,
    /// The expectation did not hold; recorded, never raised
    Failed,
}

/// The outcome of evaluating a single rule against a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleOutcome {
    /// Pass/fail status
    pub status: RuleStatus,
    /// Observed value backing the decision (count or ratio)
    pub observed: Option<f64>,
    /// Human-readable detail, present on failures
    pub message: Option<String>,
}

impl RuleOutcome {
    /// A passing outcome with its observed value.
    pub fn passed(observed: f64) -> Self {
        Self {
            status: RuleStatus::Passed,
            observed: Some(observed),
            message: None,
        }
    }

    /// A failing outcome with its observed value and detail message.
    pub fn failed(observed: f64, message: impl Into<String>) -> Self {
        Self {
            status: RuleStatus::Failed,
            observed: Some(observed),
            message: Some(message.into()),
        }
    }

    /// Returns true when the expectation held.
    pub fn is_passed(&self) -> bool {
        self.status == RuleStatus::Passed
    }
}

/// Extracts a single `Int64` aggregate from the first row of a query
/// result.
pub(crate) fn int_value(batches: &[RecordBatch], column: usize, what: &str) -> Result<i64> {
    let batch = batches
        .first()
        .filter(|b| b.num_rows() > 0)
        .ok_or_else(|| GateError::Internal(format!("empty result while extracting {what}")))?;
    let array = batch
        .column(column)
        .as_any()
        .downcast_ref::<arrow::array::Int64Array>()
        .ok_or_else(|| GateError::Internal(format!("failed to extract {what}")))?;
    Ok(array.value(0))
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_config_unknown_rule_fails_fast() {
        let err = Rule::from_config("not_a_real_rule", json!({"column": "anio"})).unwrap_err();
        assert!(matches!(err, GateError::UnknownRule(name) if name == "not_a_real_rule"));
    }

    #[test]
    fn test_from_config_not_null() {
        let rule =
            Rule::from_config("expect_column_values_to_not_be_null", json!({"column": "anio"}))
                .unwrap();
        assert_eq!(
            rule,
            Rule::NotNull {
                column: "anio".to_string()
            }
        );
    }

    #[test]
    fn test_from_config_bad_params() {
        let err = Rule::from_config(
            "expect_column_values_to_be_between",
            json!({"column": "gasto"}),
        )
        .unwrap_err();
        assert!(matches!(err, GateError::Configuration(_)));

        let err =
            Rule::from_config("expect_column_values_to_not_be_null", json!("anio")).unwrap_err();
        assert!(matches!(err, GateError::Configuration(_)));
    }

    #[test]
    fn test_wire_name_roundtrip() {
        for name in RULE_CATALOG {
            // every catalog entry parses with some plausible parameters
            let params = match *name {
                "expect_column_values_to_be_between" => json!({"column": "c", "min": 0, "max": 1}),
                "expect_column_values_to_be_in_set" => json!({"column": "c", "values": ["a"]}),
                "expect_column_values_to_match_regex" => json!({"column": "c", "pattern": "^a$"}),
                "expect_table_row_count_to_be_between" => json!({"min": 0, "max": 10}),
                _ => json!({"column": "c"}),
            };
            let rule = Rule::from_config(name, params).unwrap();
            assert_eq!(rule.name(), *name);

            let serialized = serde_json::to_value(&rule).unwrap();
            assert_eq!(serialized.get("rule").unwrap(), name);
        }
    }

    #[test]
    fn test_validate_rejects_inverted_ranges() {
        let rule = Rule::ValuesBetween {
            column: "gasto".to_string(),
            min: 10.0,
            max: 1.0,
        };
        assert!(rule.validate().is_err());

        let rule = Rule::RowCountBetween { min: 5, max: 1 };
        assert!(rule.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unsafe_column() {
        let rule = Rule::NotNull {
            column: "anio; DROP TABLE x".to_string(),
        };
        assert!(matches!(rule.validate().unwrap_err(), GateError::Security(_)));
    }

    #[test]
    fn test_column_accessor() {
        let rule = Rule::NotNull {
            column: "anio".to_string(),
        };
        assert_eq!(rule.column(), Some("anio"));
        assert_eq!(Rule::RowCountBetween { min: 0, max: 1 }.column(), None);
    }
}
