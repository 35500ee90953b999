//! End-to-end gate demo: reconcile configuration, run a checkpoint, read
//! the report.
//!
//! The first invocation bootstraps the data source, asset, suite and
//! checkpoint into `./datagate_project/`; later invocations find the data
//! source by name and reuse the stored checkpoint. Either way a fresh
//! validation runs, the result is persisted and the data docs regenerate.
//!
//! Point the gate at a real warehouse by setting `SQL_CONNSTRING_PRE`,
//! `SQL_CONNSTRING_DB` and `SQL_CONNSTRING_POST` (concatenated into one
//! connection string, loadable from a `.env` file); without them the demo
//! attaches an in-process sample table under `mem://demo`.
//!
//! Run with:
//! ```bash
//! cargo run -p datagate-demos --example table_quality_gate
//! ```

use std::sync::Arc;

use arrow::array::{Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use datagate::checkpoint::Action;
use datagate::context::DataContext;
use datagate::expectations::Rule;
use datagate::formatters::{HumanFormatter, ResultFormatter};
use datagate::logging::{init_logging, LogConfig};
use datagate::runner::{CheckpointPlan, CheckpointRunner};
use datagate::sources::connection_string_from_env;

fn sample_orders() -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("order_id", DataType::Int64, true),
        Field::new("amount", DataType::Int64, true),
        Field::new("status", DataType::Utf8, true),
    ]));
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(vec![
                Some(1),
                Some(2),
                Some(3),
                Some(4),
                Some(5),
            ])),
            Arc::new(Int64Array::from(vec![
                Some(120),
                Some(80),
                None,
                Some(240),
                Some(55),
            ])),
            Arc::new(StringArray::from(vec![
                Some("shipped"),
                Some("shipped"),
                Some("pending"),
                Some("cancelled"),
                Some("shipped"),
            ])),
        ],
    )
    .unwrap()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(LogConfig::development())?;
    dotenvy::dotenv().ok();

    let connection = match connection_string_from_env() {
        Ok(connection) => connection,
        Err(_) => {
            println!("SQL_CONNSTRING_* not set, using the in-process sample table\n");
            "mem://demo".to_string()
        }
    };

    let ctx = DataContext::file_backed("./datagate_project")?;
    if connection == "mem://demo" {
        ctx.catalog()
            .attach_memory_table("demo", "sales", "daily_orders", vec![sample_orders()])
            .await?;
    }

    let plan = CheckpointPlan::new("daily_orders_gate")
        .run_name_template("%Y%m%d-%H%M%S-daily-orders-gate")
        .datasource("orders_warehouse", &connection)
        .table_asset("daily_orders_asset", "sales", "daily_orders")
        .suite("daily_orders_expectations")
        .expect(Rule::NotNull {
            column: "order_id".into(),
        })
        .expect(Rule::Unique {
            column: "order_id".into(),
        })
        // `amount` has a null in the sample data, so this one fails and the
        // report shows a real finding
        .author_by_validating(Rule::NotNull {
            column: "amount".into(),
        })
        .actions(vec![Action::PersistResult, Action::PublishDocs]);

    let runner = CheckpointRunner::new(&ctx, plan);
    let resolution = runner.resolve().await?;
    let was_created = resolution.was_created();
    let checkpoint = resolution.into_inner();
    println!(
        "checkpoint '{}' {}",
        checkpoint.name(),
        if was_created {
            "bootstrapped"
        } else {
            "reused from store"
        }
    );
    let result = checkpoint.run(&ctx).await?;

    println!();
    print!("{}", HumanFormatter::new().format(&result)?);
    println!();
    println!("data docs: {}", ctx.docs().index_path().display());

    Ok(())
}
