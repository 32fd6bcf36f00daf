use crate::{error::RecordWriteError, retry::classify_adapter_error};
use connectors::sql::base::destination::TransactionDestination;
use engine_core::{
    metrics::Metrics,
    progress::ProgressObserver,
    retry::{Attempted, RetryPolicy},
};
use model::{
    execution::failed_row::{FailedRecord, ProcessingStage},
    records::transaction::DestinationRecord,
};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const CANCELLED_BEFORE_ATTEMPT: &str = "run cancelled before the record was attempted";

/// Outcome of writing one work item's records.
#[derive(Debug, Clone, Default)]
pub struct WriteStats {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub duration: Duration,
    pub failures: Vec<FailedRecord>,
}

/// Writes records one committed transaction at a time.
///
/// A failing record is rolled back by the destination, recorded and skipped;
/// the remaining records are still attempted.
pub struct RecordWriter {
    destination: Arc<dyn TransactionDestination>,
    retry: RetryPolicy,
    metrics: Metrics,
    progress: Arc<dyn ProgressObserver>,
}

impl RecordWriter {
    pub fn new(
        destination: Arc<dyn TransactionDestination>,
        retry: RetryPolicy,
        metrics: Metrics,
        progress: Arc<dyn ProgressObserver>,
    ) -> Self {
        Self {
            destination,
            retry,
            metrics,
            progress,
        }
    }

    /// Writes `records` in order. Cancellation is checked between records;
    /// records left unattempted are reported as failed so every record ends
    /// up in exactly one outcome.
    pub async fn write(
        &self,
        user_id: &str,
        records: &[DestinationRecord],
        cancel: &CancellationToken,
    ) -> WriteStats {
        let start = Instant::now();
        let total = records.len();
        let mut stats = WriteStats {
            total,
            ..Default::default()
        };

        info!(user_id, rows = total, "Writing records to destination");

        for (row_index, record) in records.iter().enumerate() {
            if cancel.is_cancelled() {
                let skipped = &records[row_index..];
                warn!(
                    user_id,
                    remaining = skipped.len(),
                    "Cancellation requested, leaving remaining records unattempted"
                );
                for (offset, record) in skipped.iter().enumerate() {
                    stats.failures.push(
                        FailedRecord::new(
                            &record.id,
                            user_id,
                            ProcessingStage::Cancelled,
                            CANCELLED_BEFORE_ATTEMPT,
                        )
                        .with_row_index(row_index + offset),
                    );
                }
                stats.failed += skipped.len();
                self.metrics.increment_failures(skipped.len() as u64);
                break;
            }

            match self.write_one(record).await {
                Ok(attempts) => {
                    stats.success += 1;
                    self.metrics.increment_inserted(1);
                    self.metrics.increment_retries(u64::from(attempts - 1));
                }
                Err(err) => {
                    warn!(user_id, record_id = %err.record_id, error = %err.source, "Record insert failed");
                    stats.failed += 1;
                    self.metrics.increment_failures(1);
                    self.metrics.increment_retries(u64::from(err.attempts - 1));
                    stats.failures.push(
                        FailedRecord::new(
                            &err.record_id,
                            user_id,
                            ProcessingStage::Load,
                            err.source.to_string(),
                        )
                        .with_row_index(row_index)
                        .with_attempts(err.attempts),
                    );
                }
            }

            self.progress
                .on_record(user_id, stats.success + stats.failed, total);
        }

        stats.duration = start.elapsed();
        info!(
            user_id,
            total = stats.total,
            success = stats.success,
            failed = stats.failed,
            duration_ms = stats.duration.as_millis(),
            "Finished writing records"
        );

        stats
    }

    async fn write_one(&self, record: &DestinationRecord) -> Result<u32, RecordWriteError> {
        let result = self
            .retry
            .run(
                || self.destination.insert_record(record),
                classify_adapter_error,
            )
            .await;

        match result {
            Ok(Attempted { attempts, .. }) => {
                debug!(record_id = %record.id, attempts, "Record inserted");
                Ok(attempts)
            }
            Err(err) => Err(RecordWriteError {
                record_id: record.id.clone(),
                attempts: err.attempts(),
                source: err.into_inner(),
            }),
        }
    }
}
