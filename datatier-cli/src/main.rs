//! datatier CLI - Command-line interface
//!
//! Runs the dataset coordinator and manages its configuration.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::run::RunArgs;

#[derive(Parser)]
#[command(name = "datatier")]
#[command(version = datatier::VERSION)]
#[command(about = "Coordinate write-back, archive and restore of datasets", long_about = None)]
struct Cli {
    /// Config file to use instead of ~/.datatier/config.ini
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the coordinator and read requests from stdin
    Run {
        /// Enable debug logging and mirror logs to stdout
        #[arg(long)]
        debug: bool,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// List datasets whose write-back has not completed
    Markers,
}

fn main() {
    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Run { debug } => commands::run::run(RunArgs {
            config: cli.config.clone(),
            debug,
        }),
        Commands::Config { command } => commands::config::run(command, config),
        Commands::Markers => commands::markers::run(config),
    };

    if let Err(e) = result {
        e.exit();
    }
}
