//! Weathervane CLI entry point.

use clap::Parser;

use weathervane::cli::{Cli, Commands};
use weathervane::infrastructure::{init_logging, ConfigLoader};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let logging_config = ConfigLoader::load()
        .map(|c| c.logging)
        .unwrap_or_default();
    let _log_guard = match init_logging(&logging_config) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("Warning: failed to initialize logging: {err:#}");
            None
        }
    };

    let result = match cli.command {
        Commands::Run(args) => weathervane::cli::commands::run::execute_run(args, cli.json).await,
        Commands::Tick => weathervane::cli::commands::run::execute_tick(cli.json).await,
        Commands::Rule(args) => weathervane::cli::commands::rule::execute(args, cli.json).await,
        Commands::User(args) => weathervane::cli::commands::user::execute(args, cli.json).await,
        Commands::Agent(args) => weathervane::cli::commands::agent::execute(args, cli.json).await,
    };

    if let Err(err) = result {
        weathervane::cli::handle_error(err, cli.json);
    }
}
