use crate::error::AdapterError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use model::records::operation::SourceRecord;

/// Read side of the migration: the operation history of one user.
#[async_trait]
pub trait OperationSource: Send + Sync {
    /// Returns every operation of `user_id` strictly older than `cutoff`,
    /// most recent first. An empty result is not an error.
    async fn fetch_operations(
        &self,
        user_id: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<SourceRecord>, AdapterError>;
}
