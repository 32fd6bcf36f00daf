use crate::{
    commands::Commands,
    conn::{ConnectionPinger, PostgresConnectionPinger},
    env::EnvManager,
    error::CliError,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use engine_config::settings::migration::MigrationSettings;
use engine_runtime::execution::{executor, factory};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod conn;
mod env;
mod error;
mod output;
mod shutdown;

#[derive(Parser)]
#[command(
    name = "ledger-migrate",
    version = "0.1.0",
    about = "Migrates ledger operations between Postgres stores"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    // stdout carries the report
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let code = match run(cli.command).await {
        Ok(code) => code,
        Err(err) => {
            error!(error = %err, "Command failed");
            ExitCode::GeneralError
        }
    };

    std::process::exit(code.as_i32());
}

async fn run(command: Commands) -> Result<ExitCode, CliError> {
    match command {
        Commands::Migrate {
            config,
            env_file,
            output,
        } => {
            let settings = load_settings(&config, env_file.as_deref())?;

            let shutdown = ShutdownCoordinator::new(CancellationToken::new());
            shutdown.register_handlers();

            let report = executor::run(&settings, shutdown.cancel_token()).await?;

            match output {
                Some(path) => {
                    output::write_report(&report, &path).await?;
                    info!(path = %path, "Report written");
                }
                None => output::print_report(&report),
            }

            if shutdown.is_shutdown_requested() && !report.cancelled {
                info!("Shutdown requested after the last record was committed");
            }

            Ok(ExitCode::for_report(&report))
        }
        Commands::TestConn {
            config,
            env_file,
            target,
        } => {
            let settings = load_settings(&config, env_file.as_deref())?;
            PostgresConnectionPinger::for_target(&settings, target)
                .ping()
                .await?;
            println!("{target} connection OK");
            Ok(ExitCode::Success)
        }
        Commands::Sql { config, env_file } => {
            let settings = load_settings(&config, env_file.as_deref())?;
            let (select, insert) = factory::generated_sql(&settings);
            println!("-- source\n{select};\n\n-- destination\n{insert};");
            Ok(ExitCode::Success)
        }
    }
}

fn load_settings(path: &str, env_file: Option<&str>) -> Result<MigrationSettings, CliError> {
    let mut env = EnvManager::new();
    if let Some(env_file) = env_file {
        env.load_from_file(env_file)?;
    }
    Ok(MigrationSettings::load(path, &env.into_context())?)
}
