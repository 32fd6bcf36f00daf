use crate::{error::FetchError, retry::classify_adapter_error};
use connectors::sql::base::source::OperationSource;
use engine_core::{
    metrics::Metrics,
    retry::{RetryError, RetryPolicy},
};
use model::{
    execution::{errors::ConvertError, work_item::WorkItem},
    records::operation::SourceRecord,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Fetches the operations of one work item with retry on transient failures.
pub struct OperationReader {
    source: Arc<dyn OperationSource>,
    retry: RetryPolicy,
    metrics: Metrics,
}

impl OperationReader {
    pub fn new(source: Arc<dyn OperationSource>, retry: RetryPolicy, metrics: Metrics) -> Self {
        Self {
            source,
            retry,
            metrics,
        }
    }

    /// Returns the user's operations strictly older than the cutoff, newest
    /// first. An empty result is not an error.
    pub async fn fetch(&self, item: &WorkItem) -> Result<Vec<SourceRecord>, FetchError> {
        let invalid = |source| FetchError::InvalidItem {
            user_id: item.user_id.clone(),
            source,
        };
        if item.user_id.trim().is_empty() {
            return Err(invalid(ConvertError::EmptyUserId));
        }
        let cutoff = item.cutoff_time().map_err(invalid)?;

        debug!(user_id = %item.user_id, %cutoff, "Fetching operations");

        let fetched = self
            .retry
            .run(
                || self.source.fetch_operations(&item.user_id, cutoff),
                classify_adapter_error,
            )
            .await;

        let fetched = match fetched {
            Ok(fetched) => fetched,
            Err(RetryError::Fatal { error, attempts }) => {
                self.metrics.increment_retries(u64::from(attempts - 1));
                return Err(FetchError::Source {
                    user_id: item.user_id.clone(),
                    source: error,
                });
            }
            Err(RetryError::AttemptsExceeded { error, attempts }) => {
                self.metrics.increment_retries(u64::from(attempts - 1));
                if attempts == 1 {
                    return Err(FetchError::Source {
                        user_id: item.user_id.clone(),
                        source: error,
                    });
                }
                return Err(FetchError::RetriesExhausted {
                    user_id: item.user_id.clone(),
                    attempts,
                    source: error,
                });
            }
        };

        self.metrics
            .increment_retries(u64::from(fetched.attempts - 1));
        self.metrics.increment_fetched(fetched.value.len() as u64);

        info!(
            user_id = %item.user_id,
            rows = fetched.value.len(),
            attempts = fetched.attempts,
            "Fetched operations"
        );

        Ok(fetched.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockSource, operation};
    use chrono::{TimeZone, Utc};

    fn reader(source: MockSource) -> (OperationReader, Arc<MockSource>, Metrics) {
        let source = Arc::new(source);
        let metrics = Metrics::new();
        let reader = OperationReader::new(source.clone(), RetryPolicy::default(), metrics.clone());
        (reader, source, metrics)
    }

    #[tokio::test]
    async fn test_fetch_orders_newest_first_and_excludes_cutoff() {
        // age 0 sits exactly on the cutoff and must be excluded.
        let (reader, _, metrics) = reader(MockSource::default().with_rows(
            "u1",
            vec![
                operation("u1", "op-old", 30),
                operation("u1", "op-at-cutoff", 0),
                operation("u1", "op-mid", 10),
            ],
        ));

        let item = WorkItem::new("u1", "2024-06-01T12:00:00Z");
        let rows = reader.fetch(&item).await.unwrap();

        let ids: Vec<_> = rows.iter().map(|r| r.operation_id.as_str()).collect();
        assert_eq!(ids, ["op-mid", "op-old"]);
        assert_eq!(metrics.snapshot().records_fetched, 2);
    }

    #[tokio::test]
    async fn test_fetch_binds_parsed_cutoff() {
        let (reader, source, _) = reader(MockSource::default());

        let item = WorkItem::new("u2", "2024-07-19 11:45:01.050000 +00:00");
        assert!(reader.fetch(&item).await.unwrap().is_empty());

        let calls = source.calls.lock().unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 7, 19, 11, 45, 1).unwrap()
            + chrono::Duration::milliseconds(50);
        assert_eq!(calls.as_slice(), [("u2".to_string(), expected)]);
    }

    #[tokio::test]
    async fn test_malformed_cutoff_never_reaches_source() {
        let (reader, source, _) = reader(MockSource::default());

        let err = reader
            .fetch(&WorkItem::new("u1", "not-a-date"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidItem { .. }));
        assert!(source.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_user_never_reaches_source() {
        let (reader, source, _) = reader(MockSource::default());

        let err = reader
            .fetch(&WorkItem::new("  ", "2024-01-01T00:00:00Z"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FetchError::InvalidItem {
                source: ConvertError::EmptyUserId,
                ..
            }
        ));
        assert!(source.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_source_failure_is_fetch_error() {
        let (reader, _, _) = reader(MockSource::default().failing_for("u3"));

        let err = reader
            .fetch(&WorkItem::new("u3", "2024-01-01T00:00:00Z"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Source { ref user_id, .. } if user_id == "u3"));
        assert!(err.to_string().contains("password authentication failed"));
    }
}
