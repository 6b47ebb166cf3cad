//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.

use std::path::PathBuf;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    /// Coordinator timing and cache location
    pub coordinator: CoordinatorSettings,
    /// Online and archive tier directories
    pub storage: StorageSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// `[coordinator]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorSettings {
    /// Seconds a write-back is deferred after the latest write request
    pub write_delay_secs: u64,
    /// Seconds between queue sweeps (must be > 0)
    pub process_queue_interval_secs: u64,
    /// Cache directory; dirty markers live in `<cache_dir>/marker`
    pub cache_dir: PathBuf,
}

/// `[storage]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSettings {
    /// Directory holding online dataset copies
    pub online_dir: PathBuf,
    /// Directory holding archived dataset copies
    pub archive_dir: PathBuf,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}
