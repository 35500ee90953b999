//! Table-level rule: the batch row count must fall inside `[min, max]`.

use tracing::{debug, instrument};

use super::{int_value, RuleOutcome};
use crate::batch::Batch;
use crate::error::Result;

#[instrument(skip(batch), fields(rule = "expect_table_row_count_to_be_between"))]
pub(super) async fn evaluate(batch: &Batch, min: u64, max: u64) -> Result<RuleOutcome> {
    let table = batch.table_name();
    let sql = format!("SELECT COUNT(*) AS row_count FROM {table}");
    let batches = batch.query(&sql).await?;

    let row_count = int_value(&batches, 0, "row count")?.max(0) as u64;

    debug!(row_count, min, max, "Evaluated row-count rule against batch");

    if (min..=max).contains(&row_count) {
        Ok(RuleOutcome::passed(row_count as f64))
    } else {
        Ok(RuleOutcome::failed(
            row_count as f64,
            format!("row count {row_count} is outside [{min}, {max}]"),
        ))
    }
}
