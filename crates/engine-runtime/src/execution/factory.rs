use crate::error::MigrationError;
use connectors::sql::{
    base::{destination::TransactionDestination, source::OperationSource},
    postgres::{
        client::LazyClient, destination::PgTransactionDestination, source::PgOperationSource,
    },
};
use engine_config::settings::{connection::ConnectionSettings, migration::MigrationSettings};
use std::sync::Arc;
use tracing::info;

/// One source connection per concurrent work item.
pub fn create_source(conn: &ConnectionSettings, concurrency: usize) -> Arc<dyn OperationSource> {
    info!(
        endpoint = %conn.display_target(),
        table = %conn.table,
        connections = concurrency,
        "Using source store"
    );
    Arc::new(PgOperationSource::with_connections(
        conn.to_conn_str(),
        &conn.table_ref(),
        concurrency,
    ))
}

pub fn create_destination(conn: &ConnectionSettings) -> Arc<dyn TransactionDestination> {
    info!(endpoint = %conn.display_target(), table = %conn.table, "Using destination store");
    Arc::new(PgTransactionDestination::new(
        conn.to_conn_str(),
        &conn.table_ref(),
    ))
}

/// The SELECT and INSERT statements a run would execute.
pub fn generated_sql(settings: &MigrationSettings) -> (String, String) {
    let source = PgOperationSource::new(
        settings.source.to_conn_str(),
        &settings.source.table_ref(),
    );
    let destination = PgTransactionDestination::new(
        settings.destination.to_conn_str(),
        &settings.destination.table_ref(),
    );
    (
        source.select_sql().to_string(),
        destination.insert_sql().to_string(),
    )
}

/// Connects to the store and runs `SELECT 1`.
pub async fn ping(conn: &ConnectionSettings, label: &'static str) -> Result<(), MigrationError> {
    LazyClient::new(conn.to_conn_str(), label).ping().await?;
    info!(store = label, endpoint = %conn.display_target(), "Connection OK");
    Ok(())
}
