use chrono::{DateTime, Utc};
use engine_core::metrics::MetricsSnapshot;
use model::{
    core::identifiers::{ItemId, RunId},
    execution::{failed_row::FailedRecord, work_item::WorkItem},
};
use serde::Serialize;
use std::time::Duration;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Records were written, with or without per-record failures.
    Completed,
    /// Nothing older than the cutoff was found.
    Skipped,
    /// The item failed before any insert was attempted.
    Error,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Completed => "completed",
            ItemStatus::Skipped => "skipped",
            ItemStatus::Error => "error",
        }
    }
}

/// Outcome of one work item.
#[derive(Serialize, Debug, Clone)]
pub struct ItemResult {
    pub item_id: ItemId,
    pub user_id: String,
    pub cutoff: String,
    pub status: ItemStatus,
    pub fetched: usize,
    pub inserted: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub failures: Vec<FailedRecord>,
}

impl ItemResult {
    fn base(item_id: ItemId, item: &WorkItem, status: ItemStatus, duration: Duration) -> Self {
        Self {
            item_id,
            user_id: item.user_id.clone(),
            cutoff: item.cutoff.clone(),
            status,
            fetched: 0,
            inserted: 0,
            failed: 0,
            duration_ms: duration.as_millis() as u64,
            error: None,
            failures: Vec::new(),
        }
    }

    pub fn skipped(item_id: ItemId, item: &WorkItem, duration: Duration) -> Self {
        Self::base(item_id, item, ItemStatus::Skipped, duration)
    }

    pub fn error(
        item_id: ItemId,
        item: &WorkItem,
        error: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::base(item_id, item, ItemStatus::Error, duration)
        }
    }

    pub fn completed(
        item_id: ItemId,
        item: &WorkItem,
        fetched: usize,
        inserted: usize,
        failures: Vec<FailedRecord>,
        duration: Duration,
    ) -> Self {
        Self {
            fetched,
            inserted,
            failed: failures.len(),
            failures,
            ..Self::base(item_id, item, ItemStatus::Completed, duration)
        }
    }
}

/// Aggregation of every item's outcome, built once at the end of a run.
#[derive(Serialize, Debug, Clone)]
pub struct RunReport {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub cancelled: bool,
    pub total_users: usize,
    pub total_fetched: usize,
    pub total_inserted: usize,
    pub total_failed: usize,
    pub items: Vec<ItemResult>,
    pub metrics: MetricsSnapshot,
}

impl RunReport {
    pub fn build(
        run_id: RunId,
        started_at: DateTime<Utc>,
        items: Vec<ItemResult>,
        cancelled: bool,
        metrics: MetricsSnapshot,
    ) -> Self {
        Self {
            run_id,
            started_at,
            finished_at: Utc::now(),
            cancelled,
            total_users: items.len(),
            total_fetched: items.iter().map(|i| i.fetched).sum(),
            total_inserted: items.iter().map(|i| i.inserted).sum(),
            total_failed: items.iter().map(|i| i.failed).sum(),
            items,
            metrics,
        }
    }

    pub fn count(&self, status: ItemStatus) -> usize {
        self.items.iter().filter(|i| i.status == status).count()
    }

    /// Every failed record across items, in item order.
    pub fn failures(&self) -> impl Iterator<Item = &FailedRecord> {
        self.items.iter().flat_map(|i| i.failures.iter())
    }

    /// True when any item errored or any record failed.
    pub fn has_failures(&self) -> bool {
        self.total_failed > 0 || self.count(ItemStatus::Error) > 0
    }

    pub fn duration(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::execution::failed_row::ProcessingStage;

    fn item(user: &str) -> WorkItem {
        WorkItem::new(user, "2024-01-01T00:00:00Z")
    }

    fn id(user: &str) -> ItemId {
        ItemId::new(format!("item-{user}"))
    }

    fn report() -> RunReport {
        let failure = FailedRecord::new("op-3", "u4", ProcessingStage::Load, "duplicate key");
        let items = vec![
            ItemResult::completed(id("u1"), &item("u1"), 3, 3, vec![], Duration::from_millis(5)),
            ItemResult::skipped(id("u2"), &item("u2"), Duration::ZERO),
            ItemResult::error(id("u3"), &item("u3"), "connection refused", Duration::ZERO),
            ItemResult::completed(
                id("u4"),
                &item("u4"),
                5,
                4,
                vec![failure],
                Duration::from_millis(7),
            ),
        ];
        RunReport::build(
            RunId::new("run-1"),
            Utc::now(),
            items,
            false,
            MetricsSnapshot::default(),
        )
    }

    #[test]
    fn test_totals() {
        let report = report();
        assert_eq!(report.total_users, 4);
        assert_eq!(report.total_fetched, 8);
        assert_eq!(report.total_inserted, 7);
        assert_eq!(report.total_failed, 1);
        assert_eq!(report.count(ItemStatus::Completed), 2);
        assert_eq!(report.count(ItemStatus::Skipped), 1);
        assert_eq!(report.count(ItemStatus::Error), 1);
        assert!(report.has_failures());
        assert_eq!(report.failures().map(|f| f.record_id.as_str()).collect::<Vec<_>>(), ["op-3"]);
    }

    #[test]
    fn test_json_shape() {
        let json: serde_json::Value = serde_json::from_str(&report().to_json().unwrap()).unwrap();
        assert_eq!(json["items"][1]["status"], "skipped");
        assert_eq!(json["items"][2]["error"], "connection refused");
        assert_eq!(json["items"][3]["failures"][0]["record_id"], "op-3");
        assert_eq!(json["total_inserted"], 7);
    }

    #[test]
    fn test_clean_run_has_no_failures() {
        let items = vec![ItemResult::skipped(id("u2"), &item("u2"), Duration::ZERO)];
        let report = RunReport::build(
            RunId::new("run-2"),
            Utc::now(),
            items,
            false,
            MetricsSnapshot::default(),
        );
        assert!(!report.has_failures());
    }
}
