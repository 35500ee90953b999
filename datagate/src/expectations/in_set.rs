//! Membership rule: every non-null value must belong to the allowed set.

use tracing::{debug, instrument};

use super::{int_value, RuleOutcome};
use crate::batch::Batch;
use crate::error::{GateError, Result};
use crate::security;

#[instrument(skip(batch, values), fields(rule = "expect_column_values_to_be_in_set", allowed = values.len()))]
pub(super) async fn evaluate(batch: &Batch, column: &str, values: &[String]) -> Result<RuleOutcome> {
    if values.is_empty() {
        return Err(GateError::configuration(
            "expect_column_values_to_be_in_set requires a non-empty value set",
        ));
    }

    let ident = security::escape_identifier(column)?;
    let table = batch.table_name();

    let values_list = values
        .iter()
        .map(|v| security::escape_string_literal(v).map(|escaped| format!("'{escaped}'")))
        .collect::<Result<Vec<_>>>()?
        .join(", ");

    // Values are compared as text so the rule works across column types.
    let sql = format!(
        "SELECT
            COUNT(CASE WHEN CAST({ident} AS VARCHAR) IN ({values_list}) THEN 1 END) AS members,
            COUNT({ident}) AS considered
         FROM {table}"
    );
    let batches = batch.query(&sql).await?;

    let members = int_value(&batches, 0, "member count")?;
    let considered = int_value(&batches, 1, "considered count")?;
    let outside = (considered - members).max(0);

    debug!(
        column,
        considered, outside, "Evaluated set-membership rule against batch"
    );

    if outside == 0 {
        Ok(RuleOutcome::passed(0.0))
    } else {
        Ok(RuleOutcome::failed(
            outside as f64,
            format!("{outside} of {considered} values in '{column}' are outside the allowed set"),
        ))
    }
}
