mod execute;

use clap::Args;

/// Run the HTTP API
#[derive(Args, Debug)]
#[command(after_help = "\
Examples:
  hotel_ops serve                              # Listen on 0.0.0.0:8787
  hotel_ops serve --port 9000 --workers 4
  hotel_ops serve --trust-gateway-headers      # Read tenant ids from X-Property-Id / X-Account-Id")]
pub struct ServeCmd {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 8787)]
    pub port: u16,

    /// Worker threads (defaults to the number of physical cores)
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..=256))]
    pub workers: Option<u16>,

    /// Build the tenant context from gateway headers. Only enable behind a
    /// gateway that strips these headers from client requests.
    #[arg(long, default_value_t = false)]
    pub trust_gateway_headers: bool,
}
