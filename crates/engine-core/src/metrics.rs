use serde::Serialize;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    items_processed: AtomicU64,
    records_fetched: AtomicU64,
    records_inserted: AtomicU64,
    records_failed: AtomicU64,
    retry_count: AtomicU64,
}

/// Run-wide counters shared by the executor and the writers.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub items_processed: u64,
    pub records_fetched: u64,
    pub records_inserted: u64,
    pub records_failed: u64,
    pub retry_count: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Metrics {
            inner: Arc::new(InnerMetrics::default()),
        }
    }

    pub fn increment_items(&self, count: u64) {
        self.inner.items_processed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_fetched(&self, count: u64) {
        self.inner.records_fetched.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_inserted(&self, count: u64) {
        self.inner
            .records_inserted
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_failures(&self, count: u64) {
        self.inner.records_failed.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_retries(&self, count: u64) {
        self.inner.retry_count.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            items_processed: self.inner.items_processed.load(Ordering::Relaxed),
            records_fetched: self.inner.records_fetched.load(Ordering::Relaxed),
            records_inserted: self.inner.records_inserted.load(Ordering::Relaxed),
            records_failed: self.inner.records_failed.load(Ordering::Relaxed),
            retry_count: self.inner.retry_count.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_counters() {
        let metrics = Metrics::new();
        let writer_view = metrics.clone();

        metrics.increment_fetched(5);
        writer_view.increment_inserted(4);
        writer_view.increment_failures(1);
        metrics.increment_items(1);

        assert_eq!(
            metrics.snapshot(),
            MetricsSnapshot {
                items_processed: 1,
                records_fetched: 5,
                records_inserted: 4,
                records_failed: 1,
                retry_count: 0,
            }
        );
    }
}
