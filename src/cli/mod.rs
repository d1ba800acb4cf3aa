//! Command-line interface.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

pub use output::handle_error;

#[derive(Parser)]
#[command(name = "weathervane")]
#[command(about = "Weathervane - environmental rule scheduler", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the scheduler loop
    Run(commands::run::RunArgs),

    /// Evaluate all due rules once and exit
    Tick,

    /// Rule management commands
    Rule(commands::rule::RuleArgs),

    /// User management commands
    User(commands::user::UserArgs),

    /// Agent inspection commands
    Agent(commands::agent::AgentArgs),
}
