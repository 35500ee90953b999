//! Uniqueness rule: every non-null value must occur exactly once.

use tracing::{debug, instrument};

use super::{int_value, RuleOutcome};
use crate::batch::Batch;
use crate::error::Result;
use crate::security;

#[instrument(skip(batch), fields(rule = "expect_column_values_to_be_unique"))]
pub(super) async fn evaluate(batch: &Batch, column: &str) -> Result<RuleOutcome> {
    let ident = security::escape_identifier(column)?;
    let table = batch.table_name();

    let sql = format!(
        "SELECT
            COUNT({ident}) AS considered,
            COUNT(DISTINCT {ident}) AS distinct_count
         FROM {table}"
    );
    let batches = batch.query(&sql).await?;

    let considered = int_value(&batches, 0, "considered count")?;
    let distinct = int_value(&batches, 1, "distinct count")?;
    let duplicated = (considered - distinct).max(0);

    debug!(
        column,
        considered, distinct, duplicated, "Evaluated uniqueness rule against batch"
    );

    if duplicated == 0 {
        Ok(RuleOutcome::passed(0.0))
    } else {
        Ok(RuleOutcome::failed(
            duplicated as f64,
            format!("{duplicated} of {considered} values in '{column}' are duplicated"),
        ))
    }
}
