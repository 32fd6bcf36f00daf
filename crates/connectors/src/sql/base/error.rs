use thiserror::Error;

/// All errors coming from the database/query layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// Any Postgres driver error.
    #[error("Postgres error: {0}")]
    PgError(#[from] tokio_postgres::Error),

    /// A fetched column could not be decoded into the record field.
    #[error("Failed to decode column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Writing a row to the database failed at the application level.
    #[error("Write error: {0}")]
    Write(String),
}

/// Errors happening during connection setup.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("Invalid connection string: {0}")]
    InvalidUrl(String),

    #[error("Connection failed: {0}")]
    Connection(#[from] tokio_postgres::Error),

    #[error("No live connection to the {0} store")]
    Unavailable(String),

    #[error("TLS configuration failed: {0}")]
    TlsConfig(#[from] native_tls::Error),
}
