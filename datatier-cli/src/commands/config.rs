//! Configuration management CLI commands.
//!
//! Provides `config path`, `config show` and `config init`.

use std::path::Path;

use clap::Subcommand;
use datatier::config::ConfigFile;

use crate::error::CliError;
use crate::runner::resolve_config_path;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Print the effective configuration, defaults included
    Show,

    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, config_path: Option<&Path>) -> Result<(), CliError> {
    let path = resolve_config_path(config_path);
    match command {
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigCommands::Show => {
            let config = ConfigFile::load_from(&path)?;
            print!("{}", render(&config));
            Ok(())
        }
        ConfigCommands::Init { force } => run_init(&path, force),
    }
}

fn run_init(path: &Path, force: bool) -> Result<(), CliError> {
    if force {
        ConfigFile::default().save_to(path)?;
        println!("Wrote default configuration to {}", path.display());
    } else if ConfigFile::ensure_exists_at(path)? {
        println!("Created {}", path.display());
    } else {
        println!("{} already exists (use --force to overwrite)", path.display());
    }
    Ok(())
}

/// Effective settings, one `section.key = value` per line.
fn render(config: &ConfigFile) -> String {
    let c = &config.coordinator;
    let rows = [
        ("coordinator.write_delay_secs", c.write_delay_secs.to_string()),
        (
            "coordinator.process_queue_interval_secs",
            c.process_queue_interval_secs.to_string(),
        ),
        ("coordinator.cache_dir", c.cache_dir.display().to_string()),
        (
            "storage.online_dir",
            config.storage.online_dir.display().to_string(),
        ),
        (
            "storage.archive_dir",
            config.storage.archive_dir.display().to_string(),
        ),
        ("logging.file", config.logging.file.display().to_string()),
    ];

    rows.iter()
        .map(|(key, value)| format!("{} = {}\n", key, value))
        .collect()
}
