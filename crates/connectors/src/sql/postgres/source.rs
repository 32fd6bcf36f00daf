use crate::{
    error::AdapterError,
    sql::{
        base::{
            error::DbError, query::generator::QueryGenerator, source::OperationSource,
            table::TableRef,
        },
        postgres::{client::LazyClient, params::PgParamStore, row::decode_operation},
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use model::{core::value::Value, records::operation::SourceRecord};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// Reads the operation history relation of the source ledger.
///
/// Holds one lazy connection per concurrent fetch; each fetch takes the
/// next connection in turn, so up to `connections` queries run at once.
pub struct PgOperationSource {
    clients: Vec<LazyClient>,
    next: AtomicUsize,
    select_sql: String,
}

impl PgOperationSource {
    pub fn new(conn_str: impl Into<String>, table: &TableRef) -> Self {
        Self::with_connections(conn_str, table, 1)
    }

    pub fn with_connections(conn_str: impl Into<String>, table: &TableRef, connections: usize) -> Self {
        let conn_str = conn_str.into();
        Self {
            clients: (0..connections.max(1))
                .map(|_| LazyClient::new(conn_str.clone(), "source"))
                .collect(),
            next: AtomicUsize::new(0),
            select_sql: QueryGenerator::select_operations(table),
        }
    }

    fn next_client(&self) -> &LazyClient {
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.clients.len();
        &self.clients[idx]
    }

    pub fn select_sql(&self) -> &str {
        &self.select_sql
    }
}

#[async_trait]
impl OperationSource for PgOperationSource {
    async fn fetch_operations(
        &self,
        user_id: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<SourceRecord>, AdapterError> {
        let client = self.next_client().acquire().await?;

        debug!(user_id, %cutoff, sql = %self.select_sql, "Fetching operations");
        let statement = client
            .prepare(&self.select_sql)
            .await
            .map_err(DbError::from)?;
        let bindings = PgParamStore::typed(
            vec![Value::String(user_id.to_string()), Value::Timestamp(cutoff)],
            statement.params(),
        );
        let rows = client
            .query(&statement, &bindings.as_refs())
            .await
            .map_err(DbError::from)?;

        let records = rows
            .iter()
            .map(decode_operation)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(records)
    }
}
