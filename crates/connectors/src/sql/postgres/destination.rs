use crate::{
    error::AdapterError,
    sql::{
        base::{
            destination::TransactionDestination, error::DbError,
            query::generator::QueryGenerator, table::TableRef,
        },
        postgres::{client::LazyClient, params::PgParamStore},
    },
};
use async_trait::async_trait;
use model::records::transaction::DestinationRecord;
use tracing::{debug, warn};

/// Inserts mapped transactions, one committed transaction per record.
pub struct PgTransactionDestination {
    client: LazyClient,
    insert_sql: String,
}

impl PgTransactionDestination {
    pub fn new(conn_str: impl Into<String>, table: &TableRef) -> Self {
        Self {
            client: LazyClient::new(conn_str, "destination"),
            insert_sql: QueryGenerator::insert_transaction(table),
        }
    }

    pub fn insert_sql(&self) -> &str {
        &self.insert_sql
    }
}

#[async_trait]
impl TransactionDestination for PgTransactionDestination {
    async fn insert_record(&self, record: &DestinationRecord) -> Result<(), AdapterError> {
        let mut client = self.client.acquire().await?;
        let tx = client.transaction().await.map_err(DbError::from)?;

        let result = async {
            let statement = tx.prepare(&self.insert_sql).await?;
            let bindings = PgParamStore::typed(record.values(), statement.params());
            let affected = tx.execute(&statement, &bindings.as_refs()).await?;
            expect_single_row(affected)
        }
        .await;

        match result {
            Ok(()) => {
                tx.commit().await.map_err(DbError::from)?;
                debug!(record_id = %record.id, "Record committed");
                Ok(())
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(record_id = %record.id, error = %rollback_err, "Rollback failed");
                }
                Err(err.into())
            }
        }
    }
}

/// A trigger or rule may swallow the insert; that is a failure, not a success.
fn expect_single_row(affected: u64) -> Result<(), DbError> {
    match affected {
        1 => Ok(()),
        n => Err(DbError::Write(format!("insert affected {n} rows, expected 1"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_row_insert_accepted() {
        assert!(expect_single_row(1).is_ok());
    }

    #[test]
    fn test_suppressed_insert_is_write_error() {
        let err = expect_single_row(0).unwrap_err();
        assert!(matches!(err, DbError::Write(_)));
        assert_eq!(err.to_string(), "Write error: insert affected 0 rows, expected 1");
    }
}
