//! CLI argument definitions.
//!
//! This module contains the top-level CLI structure.
//! Individual command definitions are in the `commands` module.

use clap::Parser;

use crate::commands::Command;

/// Hotel operations API: keyset-paginated listings over PostgreSQL.
///
/// The database is selected from `.hotel_ops.json`, then `DATABASE_URL` /
/// `SUPABASE_DB_URL`, then `SUPABASE_URL` + `SUPABASE_SERVICE_KEY`.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}
