use crate::{
    error::MigrationError,
    execution::factory::{create_destination, create_source},
};
use chrono::Utc;
use connectors::sql::base::{destination::TransactionDestination, source::OperationSource};
use engine_config::{
    report::summary::{ItemResult, RunReport},
    settings::{migration::MigrationSettings, validator::SettingsValidator},
};
use engine_core::{
    metrics::Metrics,
    progress::{ItemStage, ProgressObserver, TracingProgress},
    retry::RetryPolicy,
};
use engine_processing::{
    consumer::writer::RecordWriter, producer::reader::OperationReader,
    transform::mapping::OperationMapper,
};
use futures::{StreamExt, stream};
use model::{
    core::identifiers::{ItemId, RunId},
    execution::{failed_row::ProcessingStage, work_item::WorkItem},
};
use std::{sync::Arc, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span, warn};

pub const CANCELLED_BEFORE_START: &str = "run cancelled before the work item was started";

/// Runs every configured work item against the Postgres stores.
pub async fn run(
    settings: &MigrationSettings,
    cancel: CancellationToken,
) -> Result<RunReport, MigrationError> {
    SettingsValidator::new(settings).validate()?;

    let executor = MigrationExecutor::new(
        create_source(&settings.source, settings.run.concurrency),
        create_destination(&settings.destination),
        ExecutorOptions::from(settings),
        cancel,
    );
    Ok(executor.execute(&settings.work_items).await)
}

pub struct ExecutorOptions {
    pub fetch_retry: RetryPolicy,
    pub write_retry: RetryPolicy,
    pub concurrency: usize,
    pub progress: Arc<dyn ProgressObserver>,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            fetch_retry: RetryPolicy::default(),
            write_retry: RetryPolicy::default(),
            concurrency: 1,
            progress: Arc::new(TracingProgress::default()),
        }
    }
}

impl From<&MigrationSettings> for ExecutorOptions {
    fn from(settings: &MigrationSettings) -> Self {
        Self {
            fetch_retry: settings.run.fetch_retry_policy(),
            write_retry: settings.writer.retry_policy(),
            concurrency: settings.run.concurrency,
            progress: Arc::new(TracingProgress::new(settings.writer.progress_every)),
        }
    }
}

/// Drives reader, mapper and writer for each work item and folds the
/// outcomes into a [`RunReport`].
pub struct MigrationExecutor {
    run_id: RunId,
    reader: OperationReader,
    mapper: OperationMapper,
    writer: RecordWriter,
    progress: Arc<dyn ProgressObserver>,
    metrics: Metrics,
    concurrency: usize,
    cancel: CancellationToken,
}

impl MigrationExecutor {
    pub fn new(
        source: Arc<dyn OperationSource>,
        destination: Arc<dyn TransactionDestination>,
        options: ExecutorOptions,
        cancel: CancellationToken,
    ) -> Self {
        let metrics = Metrics::new();
        Self {
            run_id: RunId::generate(),
            reader: OperationReader::new(source, options.fetch_retry, metrics.clone()),
            mapper: OperationMapper,
            writer: RecordWriter::new(
                destination,
                options.write_retry,
                metrics.clone(),
                options.progress.clone(),
            ),
            progress: options.progress,
            metrics,
            concurrency: options.concurrency.max(1),
            cancel,
        }
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// Processes the items and returns the report in input order. Item and
    /// record failures are recorded, never propagated.
    pub async fn execute(&self, items: &[WorkItem]) -> RunReport {
        let started_at = Utc::now();
        info!(
            run_id = %self.run_id,
            items = items.len(),
            concurrency = self.concurrency,
            "Starting migration run"
        );

        let results: Vec<ItemResult> = stream::iter(items.iter().enumerate())
            .map(|(idx, item)| {
                let span = info_span!("work_item", user_id = %item.user_id);
                self.run_item(idx, item).instrument(span)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let snapshot = self.metrics.snapshot();
        let cancelled = interrupted(&results);
        let report = RunReport::build(self.run_id.clone(), started_at, results, cancelled, snapshot);

        info!(
            run_id = %self.run_id,
            users = report.total_users,
            fetched = report.total_fetched,
            inserted = report.total_inserted,
            failed = report.total_failed,
            retries = snapshot.retry_count,
            cancelled,
            "Migration run finished"
        );

        report
    }

    async fn run_item(&self, idx: usize, item: &WorkItem) -> ItemResult {
        let start = Instant::now();
        let item_id = self.make_item_id(idx, item);

        if self.cancel.is_cancelled() {
            warn!(item_id = %item_id, "Cancellation requested, skipping work item");
            return ItemResult::error(item_id, item, CANCELLED_BEFORE_START, start.elapsed());
        }

        self.metrics.increment_items(1);
        self.progress.on_stage(&item.user_id, ItemStage::Fetching);

        let rows = match self.reader.fetch(item).await {
            Ok(rows) => rows,
            Err(err) => {
                error!(item_id = %item_id, error = %err, "Fetch failed");
                self.progress.on_stage(&item.user_id, ItemStage::Failed);
                return ItemResult::error(item_id, item, err.to_string(), start.elapsed());
            }
        };

        if rows.is_empty() {
            info!(item_id = %item_id, "No operations older than the cutoff");
            self.progress.on_stage(&item.user_id, ItemStage::Done);
            return ItemResult::skipped(item_id, item, start.elapsed());
        }

        let records = self.mapper.map_all(&rows);

        self.progress.on_stage(&item.user_id, ItemStage::Writing);
        let stats = self
            .writer
            .write(&item.user_id, &records, &self.cancel)
            .await;
        self.progress.on_stage(&item.user_id, ItemStage::Done);

        ItemResult::completed(
            item_id,
            item,
            rows.len(),
            stats.success,
            stats.failures,
            start.elapsed(),
        )
    }

    fn make_item_id(&self, idx: usize, item: &WorkItem) -> ItemId {
        let mut h = blake3::Hasher::new();
        h.update(self.run_id.as_str().as_bytes());
        h.update(b":");
        h.update(idx.to_string().as_bytes());
        h.update(b":");
        h.update(item.user_id.as_bytes());
        ItemId::new(format!("itm-{}", &h.finalize().to_hex()[..16]))
    }
}

/// A cancellation counts only when it left an item or a record unattempted.
fn interrupted(results: &[ItemResult]) -> bool {
    results.iter().any(|result| {
        result.error.as_deref() == Some(CANCELLED_BEFORE_START)
            || result
                .failures
                .iter()
                .any(|failure| failure.stage == ProcessingStage::Cancelled)
    })
}
