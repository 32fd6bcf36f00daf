use crate::{
    error::ConfigError,
    settings::{
        connection::{ConnectionSettings, DEFAULT_DESTINATION_TABLE, DEFAULT_SOURCE_TABLE},
        env::EnvContext,
        validator::SettingsValidator,
    },
};
use engine_core::retry::RetryPolicy;
use model::execution::work_item::WorkItem;
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};
use tracing::info;

/// The whole migration configuration, loaded once and immutable for the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationSettings {
    pub source: ConnectionSettings,
    pub destination: ConnectionSettings,
    #[serde(default)]
    pub writer: WriterSettings,
    #[serde(default)]
    pub run: RunSettings,
    #[serde(default)]
    pub work_items: Vec<WorkItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterSettings {
    /// Attempts per record; 1 disables retry.
    pub max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    /// Emit a progress line every N records.
    pub progress_every: usize,
}

impl Default for WriterSettings {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            retry_base_delay_ms: 250,
            retry_max_delay_ms: 5_000,
            progress_every: 100,
        }
    }
}

impl WriterSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.retry_base_delay_ms),
            Duration::from_millis(self.retry_max_delay_ms),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Work items processed at once; 1 keeps the run strictly sequential.
    pub concurrency: usize,
    /// Attempts per source fetch; 1 disables retry.
    pub fetch_attempts: u32,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            concurrency: 1,
            fetch_attempts: 1,
        }
    }
}

impl RunSettings {
    pub fn fetch_retry_policy(&self) -> RetryPolicy {
        let preset = RetryPolicy::for_database();
        RetryPolicy::new(self.fetch_attempts, preset.base_delay, preset.max_delay)
    }
}

impl MigrationSettings {
    /// Reads, resolves and validates a TOML configuration file.
    pub fn load(path: impl AsRef<Path>, env: &EnvContext) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let settings = Self::from_toml_str(&raw, env)?;
        info!(
            config = %path.display(),
            work_items = settings.work_items.len(),
            "Loaded migration config"
        );
        Ok(settings)
    }

    /// Placeholders are resolved inside string values only, so a comment
    /// mentioning `${VAR}` never fails the load.
    pub fn from_toml_str(raw: &str, env: &EnvContext) -> Result<Self, ConfigError> {
        let mut document: toml::Value = toml::from_str(raw)?;
        resolve_placeholders(&mut document, env)?;

        let mut settings: MigrationSettings = document.try_into()?;
        settings.apply_defaults();
        SettingsValidator::new(&settings).validate()?;
        Ok(settings)
    }

    fn apply_defaults(&mut self) {
        if self.source.table.trim().is_empty() {
            self.source.table = DEFAULT_SOURCE_TABLE.to_string();
        }
        if self.destination.table.trim().is_empty() {
            self.destination.table = DEFAULT_DESTINATION_TABLE.to_string();
        }
    }
}

fn resolve_placeholders(value: &mut toml::Value, env: &EnvContext) -> Result<(), ConfigError> {
    match value {
        toml::Value::String(s) => *s = env.substitute(s)?,
        toml::Value::Array(items) => {
            for item in items {
                resolve_placeholders(item, env)?;
            }
        }
        toml::Value::Table(table) => {
            for (_, item) in table.iter_mut() {
                resolve_placeholders(item, env)?;
            }
        }
        _ => {}
    }
    Ok(())
}
