use crate::error::AdapterError;
use async_trait::async_trait;
use model::records::transaction::DestinationRecord;

/// Write side of the migration.
#[async_trait]
pub trait TransactionDestination: Send + Sync {
    /// Inserts a single record inside its own transaction.
    ///
    /// On `Ok` the row is committed. On `Err` the transaction has been rolled
    /// back and nothing of the record is visible in the destination.
    async fn insert_record(&self, record: &DestinationRecord) -> Result<(), AdapterError>;
}
