use crate::{commands::Target, error::CliError};
use async_trait::async_trait;
use engine_config::settings::{connection::ConnectionSettings, migration::MigrationSettings};
use engine_runtime::execution::factory;
use tracing::{error, info};

/// Trait for "pinging" a store
#[async_trait]
pub trait ConnectionPinger {
    /// Attempts to ping; returns Err if unreachable
    async fn ping(&self) -> Result<(), CliError>;
}

pub struct PostgresConnectionPinger<'a> {
    pub settings: &'a ConnectionSettings,
    pub target: Target,
}

impl<'a> PostgresConnectionPinger<'a> {
    pub fn for_target(settings: &'a MigrationSettings, target: Target) -> Self {
        let settings = match target {
            Target::Source => &settings.source,
            Target::Destination => &settings.destination,
        };
        Self { settings, target }
    }
}

#[async_trait]
impl ConnectionPinger for PostgresConnectionPinger<'_> {
    async fn ping(&self) -> Result<(), CliError> {
        info!(
            store = %self.target,
            endpoint = %self.settings.display_target(),
            "Pinging Postgres"
        );

        factory::ping(self.settings, self.target.as_str())
            .await
            .map_err(|e| {
                error!(store = %self.target, error = %e, "Postgres ping failed");
                CliError::Runner(e)
            })
    }
}
