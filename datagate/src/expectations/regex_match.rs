//! Pattern rule: every non-null value must match the regex.

use tracing::{debug, instrument};

use super::{int_value, RuleOutcome};
use crate::batch::Batch;
use crate::error::Result;
use crate::security;

#[instrument(skip(batch), fields(rule = "expect_column_values_to_match_regex"))]
pub(super) async fn evaluate(batch: &Batch, column: &str, pattern: &str) -> Result<RuleOutcome> {
    let ident = security::escape_identifier(column)?;
    let escaped_pattern = security::validate_regex_pattern(pattern)?;
    let table = batch.table_name();

    let sql = format!(
        "SELECT
            COUNT(CASE WHEN {ident} ~ '{escaped_pattern}' THEN 1 END) AS matches,
            COUNT({ident}) AS considered
         FROM {table}"
    );
    let batches = batch.query(&sql).await?;

    let matches = int_value(&batches, 0, "match count")?;
    let considered = int_value(&batches, 1, "considered count")?;
    let mismatched = (considered - matches).max(0);

    debug!(
        column,
        pattern, considered, mismatched, "Evaluated regex rule against batch"
    );

    if mismatched == 0 {
        Ok(RuleOutcome::passed(0.0))
    } else {
        Ok(RuleOutcome::failed(
            mismatched as f64,
            format!("{mismatched} of {considered} values in '{column}' do not match '{pattern}'"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::expectations::test_fixtures::string_batch;
    use crate::expectations::{Rule, RuleStatus};
    use crate::error::GateError;

    #[tokio::test]
    async fn test_matching_values_pass() {
        let batch = string_batch("code", vec![Some("AB-12"), Some("XY-99")]).await;
        let rule = Rule::MatchRegex {
            column: "code".to_string(),
            pattern: "^[A-Z]{2}-[0-9]{2}$".to_string(),
        };

        let outcome = rule.evaluate(&batch).await.unwrap();
        assert_eq!(outcome.status, RuleStatus::Passed);
    }

    #[tokio::test]
    async fn test_mismatch_fails() {
        let batch = string_batch("code", vec![Some("AB-12"), Some("bogus")]).await;
        let rule = Rule::MatchRegex {
            column: "code".to_string(),
            pattern: "^[A-Z]{2}-[0-9]{2}$".to_string(),
        };

        let outcome = rule.evaluate(&batch).await.unwrap();
        assert_eq!(outcome.status, RuleStatus::Failed);
        assert_eq!(outcome.observed, Some(1.0));
    }

    #[tokio::test]
    async fn test_invalid_pattern_is_an_error() {
        let batch = string_batch("code", vec![Some("AB-12")]).await;
        let rule = Rule::MatchRegex {
            column: "code".to_string(),
            pattern: "[unclosed".to_string(),
        };

        let err = rule.evaluate(&batch).await.unwrap_err();
        assert!(matches!(err, GateError::Security(_)));
    }
}
