//! Line commands accepted by `datatier run` on stdin.
//!
//! ```text
//! write <id>            queue a write-back
//! archive <id>          queue archival
//! restore <id>          queue a restore
//! lock <id>[,<id>...]   lock datasets against archival, prints the lock id
//! unlock <lock-id>      release a lock
//! status                print the status document as JSON
//! restoring             list datasets being restored or changing
//! help                  list commands
//! quit                  stop the coordinator and exit
//! ```

use std::str::FromStr;

use datatier::coordinator::LockId;
use datatier::{Coordinator, DatasetId, DatasetRef, RequestedOp};

pub const HELP: &str = "\
commands:
  write <id>            queue a write-back
  archive <id>          queue archival
  restore <id>          queue a restore
  lock <id>[,<id>...]   lock datasets against archival
  unlock <lock-id>      release a lock
  status                print the status document
  restoring             list datasets being restored or changing
  quit                  exit";

/// One parsed session line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Request(RequestedOp, DatasetId),
    Lock(Vec<DatasetId>),
    Unlock(LockId),
    Status,
    Restoring,
    Help,
    Quit,
}

impl FromStr for SessionCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().ok_or_else(|| "empty command".to_string())?;
        let arg = parts.next();
        if parts.next().is_some() {
            return Err(format!("too many arguments for '{}'", verb));
        }

        let required = |what: &str| arg.ok_or_else(|| format!("'{}' needs {}", verb, what));

        match verb.to_ascii_lowercase().as_str() {
            "write" | "archive" | "restore" => {
                let op: RequestedOp = verb.parse()?;
                Ok(Self::Request(op, parse_id(required("a dataset id")?)?))
            }
            "lock" => {
                let ids = required("dataset ids")?
                    .split(',')
                    .filter(|s| !s.trim().is_empty())
                    .map(parse_id)
                    .collect::<Result<Vec<_>, _>>()?;
                if ids.is_empty() {
                    return Err("'lock' needs dataset ids".to_string());
                }
                Ok(Self::Lock(ids))
            }
            "unlock" => {
                let raw = required("a lock id")?;
                raw.parse()
                    .map(Self::Unlock)
                    .map_err(|_| format!("invalid lock id '{}'", raw))
            }
            "status" => Ok(Self::Status),
            "restoring" => Ok(Self::Restoring),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(format!("unknown command '{}'", other)),
        }
    }
}

fn parse_id(raw: &str) -> Result<DatasetId, String> {
    raw.parse()
        .map_err(|_| format!("invalid dataset id '{}'", raw.trim()))
}

/// Runs `command` against `coordinator` and returns the reply line.
///
/// `Quit` is handled by the caller.
pub fn execute(coordinator: &Coordinator, command: SessionCommand) -> Result<String, String> {
    match command {
        SessionCommand::Request(op, id) => {
            coordinator
                .queue(DatasetRef::from_id(id), op)
                .map_err(|e| e.to_string())?;
            Ok(format!("queued {} of dataset {}", op, id))
        }
        SessionCommand::Lock(ids) => Ok(coordinator.lock(ids).to_string()),
        SessionCommand::Unlock(lock) => {
            if coordinator.unlock(&lock) {
                Ok(format!("released {}", lock))
            } else {
                Err(format!("no lock {}", lock))
            }
        }
        SessionCommand::Status => coordinator
            .status()
            .to_json_pretty()
            .map_err(|e| e.to_string()),
        SessionCommand::Restoring => {
            let mut ids: Vec<DatasetId> = coordinator.restoring().iter().map(|d| d.id()).collect();
            ids.sort();
            Ok(ids
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(","))
        }
        SessionCommand::Help => Ok(HELP.to_string()),
        SessionCommand::Quit => Ok(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datatier::coordinator::{CoordinatorConfig, QueuedState};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn coordinator(temp_dir: &TempDir) -> Arc<Coordinator> {
        Coordinator::new(CoordinatorConfig::new(temp_dir.path())).unwrap()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Parsing
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn parses_requests() {
        assert_eq!(
            "write 5".parse::<SessionCommand>().unwrap(),
            SessionCommand::Request(RequestedOp::Write, DatasetId::new(5))
        );
        assert_eq!(
            "  ARCHIVE   9 ".parse::<SessionCommand>().unwrap(),
            SessionCommand::Request(RequestedOp::Archive, DatasetId::new(9))
        );
        assert_eq!(
            "restore 1".parse::<SessionCommand>().unwrap(),
            SessionCommand::Request(RequestedOp::Restore, DatasetId::new(1))
        );
    }

    #[test]
    fn parses_lock_lists() {
        assert_eq!(
            "lock 1,2,3".parse::<SessionCommand>().unwrap(),
            SessionCommand::Lock(vec![DatasetId::new(1), DatasetId::new(2), DatasetId::new(3)])
        );
        assert!("lock".parse::<SessionCommand>().is_err());
        assert!("lock ,".parse::<SessionCommand>().is_err());
        assert!("lock 1,x".parse::<SessionCommand>().is_err());
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!("".parse::<SessionCommand>().is_err());
        assert!("write".parse::<SessionCommand>().is_err());
        assert!("write abc".parse::<SessionCommand>().is_err());
        assert!("write 1 2".parse::<SessionCommand>().is_err());
        assert!("unlock not-a-uuid".parse::<SessionCommand>().is_err());
        assert!("frobnicate 1".parse::<SessionCommand>().is_err());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Execution
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn request_updates_queue() {
        let temp_dir = TempDir::new().unwrap();
        let coordinator = coordinator(&temp_dir);

        let reply = execute(
            &coordinator,
            SessionCommand::Request(RequestedOp::Archive, DatasetId::new(4)),
        )
        .unwrap();

        assert_eq!(reply, "queued archive of dataset 4");
        assert_eq!(
            coordinator.queued_state(DatasetId::new(4)),
            Some(QueuedState::ArchiveRequested)
        );
    }

    #[test]
    fn lock_then_unlock_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let coordinator = coordinator(&temp_dir);

        let lock_id = execute(&coordinator, SessionCommand::Lock(vec![DatasetId::new(2)])).unwrap();
        assert!(coordinator.is_locked(DatasetId::new(2)));

        let unlock: SessionCommand = format!("unlock {}", lock_id).parse().unwrap();
        assert!(execute(&coordinator, unlock.clone()).is_ok());
        assert!(!coordinator.is_locked(DatasetId::new(2)));
        assert!(execute(&coordinator, unlock).is_err());
    }

    #[test]
    fn status_and_restoring_replies() {
        let temp_dir = TempDir::new().unwrap();
        let coordinator = coordinator(&temp_dir);
        execute(
            &coordinator,
            SessionCommand::Request(RequestedOp::Restore, DatasetId::new(12)),
        )
        .unwrap();
        execute(
            &coordinator,
            SessionCommand::Request(RequestedOp::Restore, DatasetId::new(3)),
        )
        .unwrap();

        let status = execute(&coordinator, SessionCommand::Status).unwrap();
        assert!(status.contains("\"opsQueue\""));
        assert!(status.contains("RESTORE_REQUESTED"));

        assert_eq!(
            execute(&coordinator, SessionCommand::Restoring).unwrap(),
            "3,12"
        );
    }
}
