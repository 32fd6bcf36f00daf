use super::mocks::{CUTOFF, InMemoryDestination, InMemorySource, history, operation};
use crate::execution::executor::{CANCELLED_BEFORE_START, ExecutorOptions, MigrationExecutor};
use engine_config::{
    report::summary::ItemStatus,
    settings::{env::EnvContext, migration::MigrationSettings},
};
use engine_core::progress::NoProgress;
use engine_processing::consumer::writer::CANCELLED_BEFORE_ATTEMPT;
use model::execution::{failed_row::ProcessingStage, work_item::WorkItem};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_test::traced_test;

fn options(concurrency: usize) -> ExecutorOptions {
    ExecutorOptions {
        concurrency,
        progress: Arc::new(NoProgress),
        ..Default::default()
    }
}

fn executor(
    source: InMemorySource,
    destination: Arc<InMemoryDestination>,
    concurrency: usize,
    cancel: CancellationToken,
) -> MigrationExecutor {
    MigrationExecutor::new(Arc::new(source), destination, options(concurrency), cancel)
}

fn items(users: &[&str]) -> Vec<WorkItem> {
    users.iter().map(|u| WorkItem::new(*u, CUTOFF)).collect()
}

/// Sources for the four reference scenarios: u1 with three operations, u2
/// with none, u3 unreachable and u4 with five operations of which the
/// third is already in the destination.
fn scenario_source() -> InMemorySource {
    InMemorySource::default()
        .with_rows("u1", history("u1", 3))
        .unreachable_for("u3")
        .with_rows("u4", history("u4", 5))
}

#[tokio::test]
async fn test_reference_scenarios() {
    let destination = Arc::new(InMemoryDestination::with_ids(&["u4-op-3"]));
    let executor = executor(
        scenario_source(),
        destination.clone(),
        1,
        CancellationToken::new(),
    );

    let report = executor.execute(&items(&["u1", "u2", "u3", "u4"])).await;

    let u1 = &report.items[0];
    assert_eq!(u1.status, ItemStatus::Completed);
    assert_eq!((u1.fetched, u1.inserted, u1.failed), (3, 3, 0));

    let u2 = &report.items[1];
    assert_eq!(u2.status, ItemStatus::Skipped);
    assert_eq!((u2.fetched, u2.inserted, u2.failed), (0, 0, 0));

    let u3 = &report.items[2];
    assert_eq!(u3.status, ItemStatus::Error);
    assert!(u3.error.as_deref().unwrap().contains("connection refused"));

    let u4 = &report.items[3];
    assert_eq!(u4.status, ItemStatus::Completed);
    assert_eq!((u4.fetched, u4.inserted, u4.failed), (5, 4, 1));
    assert_eq!(u4.failures[0].record_id, "u4-op-3");
    assert_eq!(u4.failures[0].stage, ProcessingStage::Load);
    assert!(u4.failures[0].error.contains("duplicate key"));

    assert_eq!(report.total_users, 4);
    assert_eq!(report.total_fetched, 8);
    assert_eq!(report.total_inserted, 7);
    assert_eq!(report.total_failed, 1);
    assert!(report.has_failures());
    assert!(!report.cancelled);
    // seed row plus seven new inserts
    assert_eq!(destination.ids().len(), 8);
}

#[tokio::test]
async fn test_every_fetched_record_has_one_outcome() {
    let destination = Arc::new(InMemoryDestination::with_ids(&["u4-op-3"]));
    let report = executor(scenario_source(), destination, 1, CancellationToken::new())
        .execute(&items(&["u1", "u2", "u3", "u4"]))
        .await;

    for item in &report.items {
        assert_eq!(item.fetched, item.inserted + item.failed, "{}", item.user_id);
    }
}

#[tokio::test]
async fn test_inserts_follow_fetch_order() {
    let destination = Arc::new(InMemoryDestination::default());
    executor(scenario_source(), destination.clone(), 1, CancellationToken::new())
        .execute(&items(&["u1"]))
        .await;

    // newest first: op-1 is one minute before the cutoff, op-3 three
    assert_eq!(destination.ids(), ["u1-op-1", "u1-op-2", "u1-op-3"]);
}

#[tokio::test]
async fn test_mapped_amounts_are_major_units() {
    let destination = Arc::new(InMemoryDestination::default());
    executor(scenario_source(), destination.clone(), 1, CancellationToken::new())
        .execute(&items(&["u1"]))
        .await;

    let rows = destination.rows.lock().unwrap();
    assert_eq!(rows[0].amount.to_string(), "2500.00");
    assert_eq!(rows[0].net_amount, rows[0].amount);
    assert_eq!(rows[0].payment_transaction_type.as_deref(), Some("QR"));
}

#[tokio::test]
async fn test_rerun_fails_every_record() {
    let destination = Arc::new(InMemoryDestination::default());
    let source = || InMemorySource::default().with_rows("u1", history("u1", 4));

    let first = executor(source(), destination.clone(), 1, CancellationToken::new())
        .execute(&items(&["u1"]))
        .await;
    let second = executor(source(), destination.clone(), 1, CancellationToken::new())
        .execute(&items(&["u1"]))
        .await;

    assert_eq!((first.total_inserted, first.total_failed), (4, 0));
    assert_eq!((second.total_inserted, second.total_failed), (0, 4));
    assert_eq!(second.items[0].status, ItemStatus::Completed);
    assert_eq!(destination.ids().len(), 4);
}

#[tokio::test]
async fn test_cutoff_is_strict() {
    let source = InMemorySource::default().with_rows(
        "u1",
        vec![operation("u1", "at-cutoff", 0), operation("u1", "before", 1)],
    );
    let destination = Arc::new(InMemoryDestination::default());

    let report = executor(source, destination.clone(), 1, CancellationToken::new())
        .execute(&items(&["u1"]))
        .await;

    assert_eq!(report.items[0].fetched, 1);
    assert_eq!(destination.ids(), ["before"]);
}

#[tokio::test]
async fn test_malformed_cutoff_is_item_error() {
    let source = InMemorySource::default().with_rows("u1", history("u1", 1));
    let destination = Arc::new(InMemoryDestination::default());
    let work = vec![WorkItem::new("u0", "soon"), WorkItem::new("u1", CUTOFF)];

    let report = executor(source, destination, 1, CancellationToken::new())
        .execute(&work)
        .await;

    assert_eq!(report.items[0].status, ItemStatus::Error);
    assert!(report.items[0].error.as_deref().unwrap().contains("invalid cutoff timestamp"));
    assert_eq!(report.items[1].status, ItemStatus::Completed);
}

#[tokio::test]
async fn test_configured_bad_items_fail_alone() {
    let raw = format!(
        r#"
[source]
host = "src"
dbname = "ledger"
user = "reader"

[destination]
host = "dst"
dbname = "ledger"
user = "writer"

[[work_items]]
user_id = "u1"
cutoff = "{CUTOFF}"

[[work_items]]
user_id = "u2"
cutoff = "soon"

[[work_items]]
user_id = " "
cutoff = "{CUTOFF}"
"#
    );
    let settings = MigrationSettings::from_toml_str(&raw, &EnvContext::empty()).unwrap();

    let source = InMemorySource::default().with_rows("u1", history("u1", 2));
    let destination = Arc::new(InMemoryDestination::default());
    let report = executor(source, destination.clone(), 1, CancellationToken::new())
        .execute(&settings.work_items)
        .await;

    assert_eq!(report.items[0].status, ItemStatus::Completed);
    assert_eq!(report.items[0].inserted, 2);
    assert_eq!(report.items[1].status, ItemStatus::Error);
    assert!(report.items[1].error.as_deref().unwrap().contains("'soon'"));
    assert_eq!(report.items[2].status, ItemStatus::Error);
    assert!(report.items[2].error.as_deref().unwrap().contains("empty user identifier"));
    assert!(!report.cancelled);
    assert_eq!(destination.ids(), ["u1-op-1", "u1-op-2"]);
}

#[tokio::test]
async fn test_concurrent_run_keeps_report_order() {
    let source = InMemorySource::default()
        .with_rows("u1", history("u1", 3))
        .with_rows("u2", history("u2", 2))
        .with_rows("u3", history("u3", 1));
    let destination = Arc::new(InMemoryDestination::default());

    let report = executor(source, destination.clone(), 3, CancellationToken::new())
        .execute(&items(&["u1", "u2", "u3"]))
        .await;

    let users: Vec<_> = report.items.iter().map(|i| i.user_id.as_str()).collect();
    assert_eq!(users, ["u1", "u2", "u3"]);
    assert_eq!(report.total_inserted, 6);

    let ids = destination.ids();
    let u1: Vec<_> = ids.iter().filter(|id| id.starts_with("u1-")).collect();
    assert_eq!(u1, ["u1-op-1", "u1-op-2", "u1-op-3"]);
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let source = InMemorySource::default().with_rows("u1", history("u1", 2));

    let report = executor(source, Arc::new(InMemoryDestination::default()), 1, cancel)
        .execute(&items(&["u1", "u2"]))
        .await;

    assert!(report.cancelled);
    for item in &report.items {
        assert_eq!(item.status, ItemStatus::Error);
        assert_eq!(item.error.as_deref(), Some(CANCELLED_BEFORE_START));
    }
    assert_eq!(report.total_fetched, 0);
}

#[tokio::test]
async fn test_cancellation_between_records() {
    let cancel = CancellationToken::new();
    let destination = Arc::new(InMemoryDestination::cancelling_after(2, cancel.clone()));
    let source = InMemorySource::default()
        .with_rows("u1", history("u1", 5))
        .with_rows("u2", history("u2", 1));

    let report = executor(source, destination.clone(), 1, cancel)
        .execute(&items(&["u1", "u2"]))
        .await;

    let u1 = &report.items[0];
    assert_eq!(u1.status, ItemStatus::Completed);
    assert_eq!((u1.fetched, u1.inserted, u1.failed), (5, 2, 3));
    assert!(u1.failures.iter().all(|f| f.stage == ProcessingStage::Cancelled
        && f.error == CANCELLED_BEFORE_ATTEMPT));

    assert_eq!(report.items[1].status, ItemStatus::Error);
    assert!(report.cancelled);
    assert_eq!(destination.ids().len(), 2);
}

#[tokio::test]
async fn test_cancellation_after_last_commit_is_not_reported() {
    let cancel = CancellationToken::new();
    let destination = Arc::new(InMemoryDestination::cancelling_after(3, cancel.clone()));
    let source = InMemorySource::default().with_rows("u1", history("u1", 3));

    let report = executor(source, destination.clone(), 1, cancel.clone())
        .execute(&items(&["u1"]))
        .await;

    assert!(cancel.is_cancelled());
    assert!(!report.cancelled);
    assert_eq!(report.items[0].status, ItemStatus::Completed);
    assert_eq!((report.items[0].inserted, report.items[0].failed), (3, 0));
}

#[tokio::test]
async fn test_metrics_snapshot_in_report() {
    let destination = Arc::new(InMemoryDestination::with_ids(&["u4-op-3"]));
    let report = executor(scenario_source(), destination, 1, CancellationToken::new())
        .execute(&items(&["u1", "u2", "u3", "u4"]))
        .await;

    assert_eq!(report.metrics.items_processed, 4);
    assert_eq!(report.metrics.records_fetched, 8);
    assert_eq!(report.metrics.records_inserted, 7);
    assert_eq!(report.metrics.records_failed, 1);
    assert_eq!(report.metrics.retry_count, 0);
}

#[tokio::test]
#[traced_test]
async fn test_item_ids_are_distinct_and_logged() {
    let destination = Arc::new(InMemoryDestination::default());
    let executor = executor(scenario_source(), destination, 1, CancellationToken::new());
    let report = executor.execute(&items(&["u1", "u2"])).await;

    assert_ne!(report.items[0].item_id, report.items[1].item_id);
    assert!(report.items[0].item_id.as_str().starts_with("itm-"));
    assert_eq!(&report.run_id, executor.run_id());
    assert!(logs_contain("Migration run finished"));
}
