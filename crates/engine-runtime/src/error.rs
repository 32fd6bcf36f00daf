use connectors::error::AdapterError;
use engine_config::error::ConfigError;
use thiserror::Error;

/// Errors that prevent a run from starting. Failures of individual work
/// items and records are part of the run report instead.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A store could not be reached while checking connectivity.
    #[error("Adapter error: {0}")]
    Adapter(#[from] AdapterError),
}
