//! Default values for all configuration settings.

use super::file::config_directory;
use super::settings::*;
use crate::coordinator::{DEFAULT_PROCESS_QUEUE_INTERVAL_SECS, DEFAULT_WRITE_DELAY_SECS};

/// Default cache directory name under the config directory.
pub const DEFAULT_CACHE_DIR_NAME: &str = "cache";

/// Default online tier directory name under the config directory.
pub const DEFAULT_ONLINE_DIR_NAME: &str = "online";

/// Default archive tier directory name under the config directory.
pub const DEFAULT_ARCHIVE_DIR_NAME: &str = "archive";

/// Default log file name.
pub const DEFAULT_LOG_FILE_NAME: &str = "datatier.log";

impl Default for ConfigFile {
    fn default() -> Self {
        let config_dir = config_directory();

        Self {
            coordinator: CoordinatorSettings {
                write_delay_secs: DEFAULT_WRITE_DELAY_SECS,
                process_queue_interval_secs: DEFAULT_PROCESS_QUEUE_INTERVAL_SECS,
                cache_dir: config_dir.join(DEFAULT_CACHE_DIR_NAME),
            },
            storage: StorageSettings {
                online_dir: config_dir.join(DEFAULT_ONLINE_DIR_NAME),
                archive_dir: config_dir.join(DEFAULT_ARCHIVE_DIR_NAME),
            },
            logging: LoggingSettings {
                file: config_dir.join(DEFAULT_LOG_FILE_NAME),
            },
        }
    }
}
