use clap::{Subcommand, ValueEnum};
use std::fmt;

#[derive(Subcommand)]
pub enum Commands {
    /// Migrate every configured work item
    Migrate {
        #[arg(long, help = "Config file path")]
        config: String,

        #[arg(long, help = "Optional .env file merged over the process environment")]
        env_file: Option<String>,

        #[arg(
            long,
            help = "If specified, writes the JSON report to this file instead of printing a table"
        )]
        output: Option<String>,
    },
    /// Check that a configured store is reachable
    TestConn {
        #[arg(long, help = "Config file path")]
        config: String,

        #[arg(long, help = "Optional .env file merged over the process environment")]
        env_file: Option<String>,

        #[arg(long, value_enum)]
        target: Target,
    },
    /// Print the SELECT and INSERT statements a run would execute
    Sql {
        #[arg(long, help = "Config file path")]
        config: String,

        #[arg(long, help = "Optional .env file merged over the process environment")]
        env_file: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Target {
    Source,
    Destination,
}

impl Target {
    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Source => "source",
            Target::Destination => "destination",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
