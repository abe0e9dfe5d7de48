mod execute;

use clap::Args;

/// Connect to the configured database and run the readiness check
#[derive(Args, Debug)]
#[command(after_help = "\
Examples:
  hotel_ops check-db            # Exit non-zero when the database is unreachable
  hotel_ops check-db --quiet")]
pub struct CheckDbCmd {
    /// Print nothing on success
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,
}
