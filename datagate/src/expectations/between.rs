//! Range rule: every non-null value must fall inside `[min, max]`.

use tracing::{debug, instrument};

use super::{int_value, RuleOutcome};
use crate::batch::Batch;
use crate::error::Result;
use crate::security;

#[instrument(skip(batch), fields(rule = "expect_column_values_to_be_between"))]
pub(super) async fn evaluate(batch: &Batch, column: &str, min: f64, max: f64) -> Result<RuleOutcome> {
    let ident = security::escape_identifier(column)?;
    let table = batch.table_name();

    let sql = format!(
        "SELECT
            COUNT(CASE WHEN {ident} < {min} OR {ident} > {max} THEN 1 END) AS out_of_range,
            COUNT({ident}) AS considered
         FROM {table}"
    );
    let batches = batch.query(&sql).await?;

    let out_of_range = int_value(&batches, 0, "out-of-range count")?;
    let considered = int_value(&batches, 1, "considered count")?;

    debug!(
        column,
        min, max, out_of_range, considered, "Evaluated range rule against batch"
    );

    if out_of_range == 0 {
        Ok(RuleOutcome::passed(0.0))
    } else {
        Ok(RuleOutcome::failed(
            out_of_range as f64,
            format!(
                "{out_of_range} of {considered} values in '{column}' fall outside [{min}, {max}]"
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::expectations::test_fixtures::int_batch;
    use crate::expectations::{Rule, RuleStatus};

    #[tokio::test]
    async fn test_values_inside_range() {
        let batch = int_batch("gasto", vec![Some(10), Some(50), Some(100)]).await;
        let rule = Rule::ValuesBetween {
            column: "gasto".to_string(),
            min: 0.0,
            max: 100.0,
        };

        let outcome = rule.evaluate(&batch).await.unwrap();
        assert_eq!(outcome.status, RuleStatus::Passed);
    }

    #[tokio::test]
    async fn test_outlier_fails_with_count() {
        let batch = int_batch("gasto", vec![Some(10), Some(500), Some(-3)]).await;
        let rule = Rule::ValuesBetween {
            column: "gasto".to_string(),
            min: 0.0,
            max: 100.0,
        };

        let outcome = rule.evaluate(&batch).await.unwrap();
        assert_eq!(outcome.status, RuleStatus::Failed);
        assert_eq!(outcome.observed, Some(2.0));
    }

    #[tokio::test]
    async fn test_nulls_are_not_considered() {
        let batch = int_batch("gasto", vec![Some(10), None, None]).await;
        let rule = Rule::ValuesBetween {
            column: "gasto".to_string(),
            min: 0.0,
            max: 100.0,
        };

        let outcome = rule.evaluate(&batch).await.unwrap();
        assert_eq!(outcome.status, RuleStatus::Passed);
    }
}
