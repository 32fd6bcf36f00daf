use connectors::error::AdapterError;
use model::execution::errors::ConvertError;
use thiserror::Error;

/// Failure that aborts a single work item before any insert is attempted.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Blank user id or unparsable cutoff.
    #[error("Invalid work item for user '{user_id}': {source}")]
    InvalidItem {
        user_id: String,
        #[source]
        source: ConvertError,
    },

    #[error("Fetch failed for user '{user_id}': {source}")]
    Source {
        user_id: String,
        #[source]
        source: AdapterError,
    },

    #[error("Retry attempts exhausted for user '{user_id}' after {attempts} attempts: {source}")]
    RetriesExhausted {
        user_id: String,
        attempts: u32,
        #[source]
        source: AdapterError,
    },
}

/// Failure of one record's insert transaction. Never escalates past the
/// record it belongs to.
#[derive(Error, Debug)]
#[error("Failed to write record '{record_id}' ({attempts} attempts): {source}")]
pub struct RecordWriteError {
    pub record_id: String,
    pub attempts: u32,
    #[source]
    pub source: AdapterError,
}
