use clap::Parser;

use hotel_ops::cli::Args;
use hotel_ops::db::DatabaseConfig;

#[actix_web::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match DatabaseConfig::resolve() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(2);
        }
    };

    match args.command.run(&config).await {
        Ok(output) if output.is_empty() => {}
        Ok(output) => println!("{}", output),
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    }
}
