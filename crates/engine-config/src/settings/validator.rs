use crate::{
    error::ConfigError,
    settings::{connection::ConnectionSettings, migration::MigrationSettings},
};
use std::collections::HashSet;
use tracing::warn;

pub struct SettingsValidator<'a> {
    settings: &'a MigrationSettings,
}

impl<'a> SettingsValidator<'a> {
    pub fn new(settings: &'a MigrationSettings) -> Self {
        Self { settings }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_connection("source", &self.settings.source)?;
        self.validate_connection("destination", &self.settings.destination)?;
        self.validate_tuning()?;
        self.validate_work_items()
    }

    fn validate_connection(&self, store: &str, conn: &ConnectionSettings) -> Result<(), ConfigError> {
        for (key, value) in [("host", &conn.host), ("dbname", &conn.dbname), ("user", &conn.user)] {
            if value.trim().is_empty() {
                return Err(ConfigError::invalid(
                    &format!("{store}.{key}"),
                    "must not be empty",
                ));
            }
        }

        if !conn.is_valid_sslmode() {
            return Err(ConfigError::invalid(
                &format!("{store}.sslmode"),
                format!("unsupported mode '{}'", conn.sslmode),
            ));
        }

        Ok(())
    }

    fn validate_tuning(&self) -> Result<(), ConfigError> {
        let writer = &self.settings.writer;
        let run = &self.settings.run;

        if writer.max_attempts == 0 {
            return Err(ConfigError::invalid("writer.max_attempts", "must be at least 1"));
        }
        if writer.progress_every == 0 {
            return Err(ConfigError::invalid("writer.progress_every", "must be at least 1"));
        }
        if run.concurrency == 0 {
            return Err(ConfigError::invalid("run.concurrency", "must be at least 1"));
        }
        if run.fetch_attempts == 0 {
            return Err(ConfigError::invalid("run.fetch_attempts", "must be at least 1"));
        }

        Ok(())
    }

    /// Work item problems are reported but never reject the configuration:
    /// a bad item fails on its own when the run reaches it.
    fn validate_work_items(&self) -> Result<(), ConfigError> {
        let items = &self.settings.work_items;
        if items.is_empty() {
            warn!("No work items configured");
        }

        let mut seen = HashSet::new();
        for (index, item) in items.iter().enumerate() {
            if let Err(err) = item.validate() {
                warn!(index, user_id = %item.user_id, error = %err, "Invalid work item");
            }

            if !seen.insert(item.user_id.trim()) {
                warn!(
                    index,
                    user_id = %item.user_id,
                    "Duplicate work item, overlapping records will fail on insert"
                );
            }
        }

        Ok(())
    }
}
