//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::coordinator::MAX_WRITE_DELAY_SECS;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [coordinator] section
    if let Some(section) = ini.section(Some("coordinator")) {
        if let Some(v) = parse_secs(section, "coordinator", "write_delay_secs")? {
            if v > MAX_WRITE_DELAY_SECS {
                return Err(ConfigFileError::InvalidValue {
                    section: "coordinator".to_string(),
                    key: "write_delay_secs".to_string(),
                    value: v.to_string(),
                    reason: format!("must be at most {}", MAX_WRITE_DELAY_SECS),
                });
            }
            config.coordinator.write_delay_secs = v;
        }
        if let Some(v) = parse_secs(section, "coordinator", "process_queue_interval_secs")? {
            if v == 0 {
                return Err(ConfigFileError::InvalidValue {
                    section: "coordinator".to_string(),
                    key: "process_queue_interval_secs".to_string(),
                    value: v.to_string(),
                    reason: "must be greater than 0".to_string(),
                });
            }
            config.coordinator.process_queue_interval_secs = v;
        }
        if let Some(v) = non_empty(section, "cache_dir") {
            config.coordinator.cache_dir = expand_tilde(v);
        }
    }

    // [storage] section
    if let Some(section) = ini.section(Some("storage")) {
        if let Some(v) = non_empty(section, "online_dir") {
            config.storage.online_dir = expand_tilde(v);
        }
        if let Some(v) = non_empty(section, "archive_dir") {
            config.storage.archive_dir = expand_tilde(v);
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section, "file") {
            config.logging.file = expand_tilde(v);
        }
    }

    Ok(config)
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn parse_secs(
    section: &Properties,
    section_name: &str,
    key: &str,
) -> Result<Option<u64>, ConfigFileError> {
    let Some(v) = non_empty(section, key) else {
        return Ok(None);
    };
    v.parse()
        .map(Some)
        .map_err(|_| ConfigFileError::InvalidValue {
            section: section_name.to_string(),
            key: key.to_string(),
            value: v.to_string(),
            reason: "must be a whole number of seconds".to_string(),
        })
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
