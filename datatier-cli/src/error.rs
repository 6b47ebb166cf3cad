//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use datatier::config::ConfigFileError;
use datatier::CoordinatorError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration file could not be read, parsed or written
    Config(ConfigFileError),
    /// Coordinator could not be created or started
    Coordinator(CoordinatorError),
    /// A storage tier directory could not be prepared
    Storage { path: PathBuf, error: std::io::Error },
    /// The async runtime could not be built
    Runtime(std::io::Error),
    /// Reading session commands from stdin failed
    Stdin(std::io::Error),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Config(ConfigFileError::InvalidValue { .. }) => {
                eprintln!();
                eprintln!("Fix the value in your config file, or regenerate defaults with:");
                eprintln!("  datatier config init --force");
            }
            CliError::Coordinator(e) if e.is_internal() => {
                eprintln!();
                eprintln!("Check that the cache directory exists and is writable:");
                eprintln!("  datatier config show");
            }
            CliError::Storage { .. } => {
                eprintln!();
                eprintln!("Set [storage] online_dir and archive_dir to writable directories.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Coordinator(e) => write!(f, "Coordinator error: {}", e),
            CliError::Storage { path, error } => {
                write!(f, "Storage directory '{}' unavailable: {}", path.display(), error)
            }
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::Stdin(e) => write!(f, "Failed to read commands: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Coordinator(e) => Some(e),
            CliError::Storage { error, .. } => Some(error),
            CliError::Runtime(e) => Some(e),
            CliError::Stdin(e) => Some(e),
            CliError::LoggingInit(_) => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<CoordinatorError> for CliError {
    fn from(e: CoordinatorError) -> Self {
        CliError::Coordinator(e)
    }
}
