//! INI serialization logic for converting `ConfigFile` → INI string.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        r#"[coordinator]
; Seconds to wait after the latest write request before writing a dataset back
; to the archive tier (default: 60). Repeated writes push the deadline out.
write_delay_secs = {}
; Seconds between queue sweeps (default: 5, must be greater than 0)
process_queue_interval_secs = {}
; Cache directory; dirty markers for pending write-backs are kept in <cache_dir>/marker
cache_dir = {}

[storage]
; Directory holding the online copy of each dataset
online_dir = {}
; Directory holding the archived copy of each dataset
archive_dir = {}

[logging]
; Log file path (default: ~/.datatier/datatier.log)
file = {}
"#,
        config.coordinator.write_delay_secs,
        config.coordinator.process_queue_interval_secs,
        path_to_string(&config.coordinator.cache_dir),
        path_to_string(&config.storage.online_dir),
        path_to_string(&config.storage.archive_dir),
        path_to_string(&config.logging.file),
    )
}

/// Convert path to string, collapsing home dir to ~.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.coordinator.write_delay_secs = 15;
        config.coordinator.process_queue_interval_secs = 1;
        config.storage.online_dir = PathBuf::from("/data/online");

        config.save_to(&config_path).unwrap();
        let loaded = ConfigFile::load_from(&config_path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_output_is_commented() {
        let content = to_config_string(&ConfigFile::default());
        assert!(content.contains("[coordinator]"));
        assert!(content.contains("; Seconds between queue sweeps"));
        assert!(content.contains("write_delay_secs = 60"));
    }

    #[test]
    fn test_home_paths_collapse_to_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(path_to_string(&home.join("x/y")), "~/x/y");
        }
        assert_eq!(path_to_string(Path::new("/opt/x")), "/opt/x");
    }
}
