use serde::Serialize;
use std::fmt;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ItemStage {
    Fetching,
    Writing,
    Done,
    Failed,
}

impl ItemStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStage::Fetching => "Fetching",
            ItemStage::Writing => "Writing",
            ItemStage::Done => "Done",
            ItemStage::Failed => "Failed",
        }
    }
}

impl fmt::Display for ItemStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives progress notifications while a work item is processed.
pub trait ProgressObserver: Send + Sync {
    fn on_stage(&self, user_id: &str, stage: ItemStage);

    /// Called after every record attempt, `done` counting both outcomes.
    fn on_record(&self, user_id: &str, done: usize, total: usize);
}

/// Observer that discards every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_stage(&self, _user_id: &str, _stage: ItemStage) {}

    fn on_record(&self, _user_id: &str, _done: usize, _total: usize) {}
}

/// Logs stage changes and a progress line every `every` records.
#[derive(Debug, Clone)]
pub struct TracingProgress {
    every: usize,
}

impl TracingProgress {
    pub fn new(every: usize) -> Self {
        Self {
            every: every.max(1),
        }
    }
}

impl Default for TracingProgress {
    fn default() -> Self {
        Self::new(100)
    }
}

impl ProgressObserver for TracingProgress {
    fn on_stage(&self, user_id: &str, stage: ItemStage) {
        info!(user_id, %stage, "Work item stage changed");
    }

    fn on_record(&self, user_id: &str, done: usize, total: usize) {
        if done == total || done % self.every == 0 {
            info!(user_id, done, total, "Processed {done}/{total} records");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[traced_test]
    #[test]
    fn test_logs_every_nth_record_and_last() {
        let progress = TracingProgress::new(2);
        for done in 1..=3 {
            progress.on_record("user-1", done, 3);
        }

        assert!(logs_contain("Processed 2/3 records"));
        assert!(logs_contain("Processed 3/3 records"));
        assert!(!logs_contain("Processed 1/3 records"));
    }

    #[traced_test]
    #[test]
    fn test_logs_stage() {
        TracingProgress::default().on_stage("user-1", ItemStage::Writing);
        assert!(logs_contain("stage=Writing"));
    }

    #[test]
    fn test_zero_interval_clamped() {
        let progress = TracingProgress::new(0);
        assert_eq!(progress.every, 1);
    }
}
