use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A fetched record that did not make it into the destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedRecord {
    /// Operation identifier of the record (also its destination `id`).
    pub record_id: String,
    pub user_id: String,
    pub stage: ProcessingStage,
    pub error: String,
    /// Index of the record within its work item's insert sequence.
    pub row_index: usize,
    pub attempts: u32,
    pub failed_at: DateTime<Utc>,
}

/// The stage of processing where the failure occurred
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStage {
    /// Insert or commit on the destination failed
    Load,

    /// Never attempted because the run was cancelled
    Cancelled,
}

impl FailedRecord {
    pub fn new(
        record_id: impl Into<String>,
        user_id: impl Into<String>,
        stage: ProcessingStage,
        error: impl Into<String>,
    ) -> Self {
        Self {
            record_id: record_id.into(),
            user_id: user_id.into(),
            stage,
            error: error.into(),
            row_index: 0,
            attempts: 0,
            failed_at: Utc::now(),
        }
    }

    pub fn with_row_index(mut self, row_index: usize) -> Self {
        self.row_index = row_index;
        self
    }

    /// Add attempt count for retry tracking
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }
}
