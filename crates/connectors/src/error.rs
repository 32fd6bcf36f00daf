use crate::sql::base::error::{ConnectorError, DbError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    /// Failed to establish (or re-establish) a store connection.
    #[error("Connector error: {0}")]
    Connector(#[from] ConnectorError),

    /// Database-related error.
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Generic adapter error.
    #[error("Adapter error: {0}")]
    Generic(String),
}
