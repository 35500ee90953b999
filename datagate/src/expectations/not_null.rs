//! Null-check rule: every value in the column must be non-null.

use tracing::{debug, instrument};

use super::{int_value, RuleOutcome};
use crate::batch::Batch;
use crate::error::Result;
use crate::security;

#[instrument(skip(batch), fields(rule = "expect_column_values_to_not_be_null"))]
pub(super) async fn evaluate(batch: &Batch, column: &str) -> Result<RuleOutcome> {
    let ident = security::escape_identifier(column)?;
    let table = batch.table_name();

    let sql = format!(
        "SELECT
            COUNT(*) AS total_count,
            COUNT({ident}) AS non_null_count
         FROM {table}"
    );
    let batches = batch.query(&sql).await?;

    let total = int_value(&batches, 0, "total count")?;
    let non_null = int_value(&batches, 1, "non-null count")?;
    let null_count = (total - non_null).max(0);

    debug!(
        column,
        total, null_count, "Evaluated null-check against batch"
    );

    if null_count == 0 {
        Ok(RuleOutcome::passed(0.0))
    } else {
        Ok(RuleOutcome::failed(
            null_count as f64,
            format!("{null_count} of {total} values in '{column}' are null"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::expectations::test_fixtures::int_batch;
    use crate::expectations::{Rule, RuleStatus};

    #[tokio::test]
    async fn test_all_values_present() {
        let batch = int_batch("anio", vec![Some(2022), Some(2023), Some(2024)]).await;
        let rule = Rule::NotNull {
            column: "anio".to_string(),
        };

        let outcome = rule.evaluate(&batch).await.unwrap();
        assert_eq!(outcome.status, RuleStatus::Passed);
        assert_eq!(outcome.observed, Some(0.0));
    }

    #[tokio::test]
    async fn test_single_null_fails() {
        let batch = int_batch("anio", vec![Some(2022), None, Some(2024)]).await;
        let rule = Rule::NotNull {
            column: "anio".to_string(),
        };

        let outcome = rule.evaluate(&batch).await.unwrap();
        assert_eq!(outcome.status, RuleStatus::Failed);
        assert_eq!(outcome.observed, Some(1.0));
        assert!(outcome.message.unwrap().contains("anio"));
    }

    #[tokio::test]
    async fn test_empty_batch_passes_vacuously() {
        let batch = int_batch("anio", vec![]).await;
        let rule = Rule::NotNull {
            column: "anio".to_string(),
        };

        let outcome = rule.evaluate(&batch).await.unwrap();
        assert_eq!(outcome.status, RuleStatus::Passed);
    }
}
