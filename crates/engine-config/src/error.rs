use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating the migration configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A `${VAR}` placeholder referenced an unset variable.
    #[error("Environment variable '{0}' is not set")]
    MissingEnv(String),

    #[error("Unterminated placeholder in '{0}'")]
    Placeholder(String),

    #[error("Invalid setting '{key}': {message}")]
    Invalid { key: String, message: String },
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key: key.to_string(),
            message: message.into(),
        }
    }
}
