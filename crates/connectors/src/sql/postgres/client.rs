use crate::{
    error::AdapterError,
    sql::{
        base::error::{ConnectorError, DbError},
        postgres::utils::connect_client,
    },
};
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use tokio_postgres::Client;
use tracing::{info, warn};

/// A Postgres client that connects on first use and reconnects once the
/// underlying connection has been closed.
///
/// Connection failures therefore surface on the operation that needed the
/// connection rather than at construction time.
pub struct LazyClient {
    conn_str: String,
    label: &'static str,
    client: Mutex<Option<Client>>,
}

impl LazyClient {
    pub fn new(conn_str: impl Into<String>, label: &'static str) -> Self {
        Self {
            conn_str: conn_str.into(),
            label,
            client: Mutex::new(None),
        }
    }

    /// Locks the client, connecting first if there is no live connection.
    pub async fn acquire(&self) -> Result<MappedMutexGuard<'_, Client>, ConnectorError> {
        let mut guard = self.client.lock().await;

        let stale = guard.as_ref().is_some_and(|client| client.is_closed());
        if stale {
            warn!(store = self.label, "Postgres connection closed, reconnecting");
            *guard = None;
        }

        if guard.is_none() {
            let client = connect_client(&self.conn_str).await?;
            info!(store = self.label, "Connected to Postgres");
            *guard = Some(client);
        }

        MutexGuard::try_map(guard, Option::as_mut)
            .map_err(|_| ConnectorError::Unavailable(self.label.to_string()))
    }

    /// Round-trips `SELECT 1` on the connection.
    pub async fn ping(&self) -> Result<(), AdapterError> {
        let client = self.acquire().await?;
        let row = client
            .query_one("SELECT 1", &[])
            .await
            .map_err(DbError::from)?;
        let value: i32 = row.try_get(0).map_err(DbError::from)?;
        if value != 1 {
            return Err(AdapterError::Generic(format!(
                "unexpected ping result from the {} store: {value}",
                self.label
            )));
        }
        Ok(())
    }
}
