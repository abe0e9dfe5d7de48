//! Command definitions and implementations.
//!
//! Each command is defined in its own module with:
//! - The command struct with clap attributes for CLI parsing
//! - An `execute` implementation that runs against the resolved database config

mod check_db;
mod serve;

pub use check_db::CheckDbCmd;
pub use serve::ServeCmd;

use async_trait::async_trait;
use clap::Subcommand;
use std::error::Error;

use crate::db::DatabaseConfig;

/// Trait for executing commands.
///
/// The returned string is printed to stdout when non-empty.
#[async_trait(?Send)]
pub trait Execute {
    async fn execute(self, config: &DatabaseConfig) -> Result<String, Box<dyn Error>>;
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API
    Serve(ServeCmd),

    /// Connect to the configured database and run the readiness check
    CheckDb(CheckDbCmd),
}

impl Command {
    pub async fn run(self, config: &DatabaseConfig) -> Result<String, Box<dyn Error>> {
        match self {
            Command::Serve(cmd) => cmd.execute(config).await,
            Command::CheckDb(cmd) => cmd.execute(config).await,
        }
    }
}
