//! User configuration for datatier.
//!
//! Configuration lives in an INI file at `~/.datatier/config.ini`:
//!
//! ```ini
//! [coordinator]
//! write_delay_secs = 60
//! process_queue_interval_secs = 5
//! cache_dir = ~/.datatier/cache
//!
//! [storage]
//! online_dir = ~/.datatier/online
//! archive_dir = ~/.datatier/archive
//!
//! [logging]
//! file = ~/.datatier/datatier.log
//! ```
//!
//! Missing keys fall back to defaults. [`ConfigFile::coordinator_config`]
//! turns the file into the runtime [`CoordinatorConfig`](crate::coordinator::CoordinatorConfig).

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::{
    DEFAULT_ARCHIVE_DIR_NAME, DEFAULT_CACHE_DIR_NAME, DEFAULT_LOG_FILE_NAME,
    DEFAULT_ONLINE_DIR_NAME,
};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{ConfigFile, CoordinatorSettings, LoggingSettings, StorageSettings};
