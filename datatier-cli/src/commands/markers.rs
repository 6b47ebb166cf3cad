//! Markers command - list datasets with unfinished write-backs.

use std::path::Path;

use datatier::config::ConfigFile;
use datatier::coordinator::DirtyMarkerStore;

use crate::error::CliError;
use crate::runner::resolve_config_path;

/// Run the markers command.
pub fn run(config_path: Option<&Path>) -> Result<(), CliError> {
    let config = ConfigFile::load_from(&resolve_config_path(config_path))?;
    let store = DirtyMarkerStore::open(config.coordinator_config().marker_dir())?;
    let pending = store.pending()?;

    println!("Marker directory: {}", store.dir().display());
    if pending.is_empty() {
        println!("No pending write-backs");
    } else {
        for id in pending {
            println!("  dataset {}", id);
        }
    }
    Ok(())
}
