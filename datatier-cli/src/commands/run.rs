//! Run command - start the coordinator and accept requests on stdin.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use datatier::config::ConfigFile;
use datatier::coordinator::QueueSweeper;
use datatier::workers::SpawningDispatcher;
use datatier::Coordinator;

use super::session::{self, SessionCommand};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the run command.
#[derive(Debug, Default)]
pub struct RunArgs {
    pub config: Option<PathBuf>,
    pub debug: bool,
}

/// Run the run command.
pub fn run(args: RunArgs) -> Result<(), CliError> {
    let runner = CliRunner::with_debug(args.config.as_deref(), args.debug)?;
    runner.log_startup("run");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("datatier-worker")
        .build()
        .map_err(CliError::Runtime)?;

    runtime.block_on(serve(runner.config()))
}

async fn serve(config: &ConfigFile) -> Result<(), CliError> {
    prepare_storage(&config.storage.online_dir)?;
    prepare_storage(&config.storage.archive_dir)?;

    let coordinator = Coordinator::new(config.coordinator_config())?;
    let pending = coordinator.markers().pending()?;
    if !pending.is_empty() {
        warn!(
            count = pending.len(),
            "Datasets with unfinished write-backs from a previous run; request a write to flush them"
        );
    }

    let tiers = Arc::new(config.directory_tiers());
    let dispatcher = SpawningDispatcher::try_current(tiers, coordinator.markers().clone())?;

    let shutdown = CancellationToken::new();
    let sweeper = QueueSweeper::new(Arc::clone(&coordinator), Arc::new(dispatcher));
    let sweeper_handle = sweeper.spawn(shutdown.clone());

    println!("datatier v{} ready, type 'help' for commands", datatier::VERSION);
    let result = read_commands(&coordinator).await;

    info!("Stopping queue sweeper");
    shutdown.cancel();
    if let Err(e) = sweeper_handle.await {
        warn!(error = %e, "Queue sweeper task ended abnormally");
    }

    result
}

/// Reads session commands until `quit`, end of input or Ctrl-C.
async fn read_commands(coordinator: &Coordinator) -> Result<(), CliError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                return Ok(());
            }

            line = lines.next_line() => {
                let Some(line) = line.map_err(CliError::Stdin)? else {
                    return Ok(());
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<SessionCommand>() {
                    Ok(SessionCommand::Quit) => return Ok(()),
                    Ok(command) => match session::execute(coordinator, command) {
                        Ok(reply) => println!("{}", reply),
                        Err(msg) => println!("error: {}", msg),
                    },
                    Err(msg) => println!("error: {}", msg),
                }
            }
        }
    }
}

fn prepare_storage(dir: &Path) -> Result<(), CliError> {
    std::fs::create_dir_all(dir).map_err(|error| CliError::Storage {
        path: dir.to_path_buf(),
        error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn prepare_storage_creates_nested_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("a").join("b");
        prepare_storage(&dir).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn prepare_storage_reports_path() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file");
        std::fs::write(&file, "").unwrap();

        match prepare_storage(&file.join("sub")) {
            Err(CliError::Storage { path, .. }) => assert_eq!(path, file.join("sub")),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
