use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use connectors::{
    error::AdapterError,
    sql::base::{
        destination::TransactionDestination,
        error::{ConnectorError, DbError},
        source::OperationSource,
    },
};
use model::records::{operation::SourceRecord, transaction::DestinationRecord};
use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

pub fn operation(user_id: &str, operation_id: &str, age_minutes: i64) -> SourceRecord {
    let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    SourceRecord {
        operation_id: operation_id.to_string(),
        operation_type: "TRANSFER".to_string(),
        operation_time: base - Duration::minutes(age_minutes),
        operation_status: "SUCCESS".to_string(),
        user_id: user_id.to_string(),
        amount: 1000,
        currency: "KZT".to_string(),
        from_masked_card_number: None,
        from_account_id: Some("acc-1".to_string()),
        to_account_id: None,
        from_wallet_id: None,
        to_wallet_id: None,
        wallet_id: None,
        account_id: None,
        payment_operation_type: None,
        external_operation_id: None,
        original_operation_id: None,
        category: None,
        from_phone: None,
        to_phone: None,
        merchant_name: None,
    }
}

/// Serves canned rows per user, applying the cutoff filter and ordering of
/// the real query.
#[derive(Default)]
pub struct MockSource {
    rows: HashMap<String, Vec<SourceRecord>>,
    failing: HashSet<String>,
    pub calls: Mutex<Vec<(String, DateTime<Utc>)>>,
}

impl MockSource {
    pub fn with_rows(mut self, user_id: &str, rows: Vec<SourceRecord>) -> Self {
        self.rows.insert(user_id.to_string(), rows);
        self
    }

    pub fn failing_for(mut self, user_id: &str) -> Self {
        self.failing.insert(user_id.to_string());
        self
    }
}

#[async_trait]
impl OperationSource for MockSource {
    async fn fetch_operations(
        &self,
        user_id: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<SourceRecord>, AdapterError> {
        self.calls
            .lock()
            .unwrap()
            .push((user_id.to_string(), cutoff));

        if self.failing.contains(user_id) {
            return Err(AdapterError::Generic(
                "password authentication failed".to_string(),
            ));
        }

        let mut rows: Vec<_> = self
            .rows
            .get(user_id)
            .into_iter()
            .flatten()
            .filter(|r| r.operation_time < cutoff)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.operation_time.cmp(&a.operation_time));
        Ok(rows)
    }
}

/// Destination enforcing a unique `id`, optionally dropping the connection
/// a fixed number of times before accepting writes.
#[derive(Default)]
pub struct MockDestination {
    pub stored: Mutex<Vec<DestinationRecord>>,
    transient_failures: Mutex<u32>,
    pub attempts: Mutex<Vec<String>>,
}

impl MockDestination {
    pub fn seeded(ids: &[&str], template: &DestinationRecord) -> Self {
        let stored = ids
            .iter()
            .map(|id| DestinationRecord {
                id: id.to_string(),
                ..template.clone()
            })
            .collect();
        Self {
            stored: Mutex::new(stored),
            ..Default::default()
        }
    }

    pub fn flaky(failures: u32) -> Self {
        Self {
            transient_failures: Mutex::new(failures),
            ..Default::default()
        }
    }

    pub fn stored_ids(&self) -> Vec<String> {
        self.stored
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.id.clone())
            .collect()
    }
}

#[async_trait]
impl TransactionDestination for MockDestination {
    async fn insert_record(&self, record: &DestinationRecord) -> Result<(), AdapterError> {
        self.attempts.lock().unwrap().push(record.id.clone());

        {
            let mut remaining = self.transient_failures.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ConnectorError::Unavailable("destination".to_string()).into());
            }
        }

        let mut stored = self.stored.lock().unwrap();
        if stored.iter().any(|r| r.id == record.id) {
            return Err(DbError::Write(format!(
                "duplicate key value violates unique constraint \"transaction_pkey\" (id)=({})",
                record.id
            ))
            .into());
        }
        stored.push(record.clone());
        Ok(())
    }
}
