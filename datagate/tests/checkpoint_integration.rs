//! Integration tests for the checkpoint reconciliation and run machine.

use std::sync::Arc;

use arrow::array::Int64Array;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use datagate::checkpoint::Action;
use datagate::context::DataContext;
use datagate::error::GateError;
use datagate::expectations::{Rule, RuleStatus};
use datagate::results::ResultStore;
use datagate::runner::{CheckpointPlan, CheckpointRunner};
use datagate::store::{ConfigStore, ConfigStoreExt, RecordKind};

/// Budget-execution style fixture: `anio` (year) and `gasto` (spend)
/// columns, optionally with a null in `anio`.
fn budget_batch(null_in_anio: bool) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("anio", DataType::Int64, true),
        Field::new("gasto", DataType::Int64, true),
    ]));
    let anio = if null_in_anio {
        Int64Array::from(vec![Some(2023), None, Some(2025)])
    } else {
        Int64Array::from(vec![Some(2023), Some(2024), Some(2025)])
    };
    let gasto = Int64Array::from(vec![Some(100), Some(250), Some(75)]);
    RecordBatch::try_new(schema, vec![Arc::new(anio), Arc::new(gasto)]).unwrap()
}

async fn gate_context(dir: &tempfile::TempDir, null_in_anio: bool) -> DataContext {
    let ctx = DataContext::in_memory(dir.path().join("docs")).unwrap();
    ctx.catalog()
        .attach_memory_table(
            "staging",
            "finance",
            "budget_execution",
            vec![budget_batch(null_in_anio)],
        )
        .await
        .unwrap();
    ctx
}

fn gate_plan() -> CheckpointPlan {
    CheckpointPlan::new("budget_gate")
        // nanosecond fraction keeps run ids distinct across quick re-runs
        .run_name_template("%Y%m%d-%H%M%S%f-budget-gate")
        .datasource("staging", "mem://staging")
        .table_asset("budget_asset", "finance", "budget_execution")
        .suite("budget_expectations")
        .expect(Rule::NotNull {
            column: "anio".to_string(),
        })
        .author_by_validating(Rule::NotNull {
            column: "gasto".to_string(),
        })
        .actions(vec![Action::PersistResult, Action::PublishDocs])
}

#[tokio::test]
async fn test_bootstrap_creates_full_dependency_chain() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = gate_context(&dir, false).await;

    let runner = CheckpointRunner::new(&ctx, gate_plan());
    let resolution = runner.resolve().await.unwrap();
    assert!(resolution.was_created());

    let store = ctx.store();
    for (kind, name) in [
        (RecordKind::DataSource, "staging"),
        (RecordKind::Asset, "budget_asset"),
        (RecordKind::Suite, "budget_expectations"),
        (RecordKind::Checkpoint, "budget_gate"),
    ] {
        assert!(store.exists(kind, name).await.unwrap(), "{kind} missing");
    }

    // declarative + authored expectations converge into one stored suite
    let suite = store.get_suite("budget_expectations").await.unwrap();
    assert_eq!(suite.len(), 2);
}

#[tokio::test]
async fn test_bootstrap_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = gate_context(&dir, false).await;

    let first = CheckpointRunner::new(&ctx, gate_plan());
    let result1 = first.run().await.unwrap();

    let second = CheckpointRunner::new(&ctx, gate_plan());
    let resolution = second.resolve().await.unwrap();
    assert!(!resolution.was_created(), "second invocation must reuse");
    let result2 = second.run().await.unwrap();

    // exactly one record of each kind, no duplicates
    let store = ctx.store();
    assert_eq!(store.list(RecordKind::DataSource).await.unwrap().len(), 1);
    assert_eq!(store.list(RecordKind::Asset).await.unwrap().len(), 1);
    assert_eq!(store.list(RecordKind::Suite).await.unwrap().len(), 1);
    assert_eq!(store.list(RecordKind::Checkpoint).await.unwrap().len(), 1);

    // results are fresh on every run, never cached
    assert_ne!(result1.run_id, result2.run_id);
    assert_eq!(ctx.results().list_run_ids().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_reuse_ignores_changed_plan() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = gate_context(&dir, false).await;

    CheckpointRunner::new(&ctx, gate_plan()).run().await.unwrap();

    // a second plan with no expectations at all still runs the stored
    // suite: reuse pins the contract, it does not diff definitions
    let bare_plan = CheckpointPlan::new("budget_gate")
        .run_name_template("%Y%m%d-%H%M%S%f-budget-gate")
        .datasource("staging", "mem://staging")
        .table_asset("budget_asset", "finance", "budget_execution")
        .suite("budget_expectations");
    let result = CheckpointRunner::new(&ctx, bare_plan).run().await.unwrap();

    assert_eq!(result.results.len(), 2);
}

#[tokio::test]
async fn test_failing_expectation_still_runs_actions() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = gate_context(&dir, true).await;

    let plan = CheckpointPlan::new("budget_gate")
        .run_name_template("%Y%m%d-%H%M%S%f-budget-gate")
        .datasource("staging", "mem://staging")
        .table_asset("budget_asset", "finance", "budget_execution")
        .suite("budget_expectations")
        .expect(Rule::NotNull {
            column: "anio".to_string(),
        })
        .actions(vec![Action::PersistResult, Action::PublishDocs]);

    // the run completes without raising, despite the failing expectation
    let result = CheckpointRunner::new(&ctx, plan).run().await.unwrap();

    assert!(!result.success);
    assert_eq!(result.results.len(), 1);
    assert_eq!(result.results[0].status, RuleStatus::Failed);
    assert_eq!(result.results[0].column.as_deref(), Some("anio"));
    assert_eq!(result.results[0].observed, Some(1.0));

    // persist-result ran
    let stored = ctx.results().get(&result.run_id).await.unwrap();
    assert_eq!(stored.unwrap(), result);

    // publish-docs ran: a report artifact exists for the run id
    assert!(ctx.docs().page_path(&result.run_id).is_file());
    assert!(ctx.docs().index_path().is_file());
}

#[tokio::test]
async fn test_mixed_suite_aggregates_all_outcomes() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = gate_context(&dir, true).await;

    let plan = gate_plan().expect(Rule::RowCountBetween { min: 1, max: 100 });
    let result = CheckpointRunner::new(&ctx, plan).run().await.unwrap();

    // anio null-check fails, gasto null-check and row count pass; nothing
    // short-circuits
    assert!(!result.success);
    assert_eq!(result.results.len(), 3);
    assert_eq!(result.failures().count(), 1);
}

#[tokio::test]
async fn test_unresolved_suite_reference_aborts_before_execute() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = gate_context(&dir, false).await;

    CheckpointRunner::new(&ctx, gate_plan()).run().await.unwrap();
    let runs_before = ctx.results().list_run_ids().await.unwrap().len();

    // the suite disappears out-of-band
    ctx.store()
        .delete(RecordKind::Suite, "budget_expectations")
        .await
        .unwrap();

    let err = CheckpointRunner::new(&ctx, gate_plan())
        .run()
        .await
        .unwrap_err();
    assert!(matches!(err, GateError::Configuration(_)));
    assert!(err.to_string().contains("budget_expectations"));

    // no new result was produced or persisted
    assert_eq!(
        ctx.results().list_run_ids().await.unwrap().len(),
        runs_before
    );
}

#[tokio::test]
async fn test_missing_memory_namespace_is_connectivity_error() {
    let dir = tempfile::tempdir().unwrap();
    // context without any attached namespace
    let ctx = DataContext::in_memory(dir.path().join("docs")).unwrap();

    let err = CheckpointRunner::new(&ctx, gate_plan())
        .run()
        .await
        .unwrap_err();
    assert!(matches!(err, GateError::Connectivity { .. }));
}
