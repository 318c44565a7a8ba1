//! Executor that delegates schema transitions to an external program.
//!
//! The program receives the target pairs as a JSON array on stdin,
//! `[{"unit": "...", "version": "..."}, ...]`, and must record every
//! migration it applies or unapplies in the ledger. Exit status:
//! - 0: success
//! - 3: a requested migration is unknown
//! - 4: a target node cannot be resolved
//! - anything else: generic failure
//!
//! stderr is used as the failure message. The configured command is split
//! on whitespace into program and arguments; no shell quoting is applied.

use migsnap_core::executor::{ExecutorError, MigrationExecutor};
use migsnap_core::model::MigrationPair;
use std::io::Write;
use std::process::{Command, Stdio};

const EXIT_UNKNOWN_MIGRATION: i32 = 3;
const EXIT_NODE_NOT_FOUND: i32 = 4;

#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    program: String,
    db_path: String,
}

impl ProcessExecutor {
    /// `db_path` is exported to the program as `MIGSNAP_DB`.
    pub fn new(program: impl Into<String>, db_path: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            db_path: db_path.into(),
        }
    }
}

impl MigrationExecutor for ProcessExecutor {
    fn migrate(&self, targets: &[MigrationPair]) -> Result<(), ExecutorError> {
        let payload = serde_json::to_vec(targets)
            .map_err(|e| ExecutorError::Failed(format!("cannot encode targets: {}", e)))?;

        let mut parts = self.program.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| ExecutorError::Failed("executor command is empty".to_string()))?;

        let mut child = Command::new(program)
            .args(parts)
            .env("MIGSNAP_DB", &self.db_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ExecutorError::Failed(format!("cannot start {}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            // A program that exits before reading still reports via its status
            if let Err(e) = stdin.write_all(&payload) {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(ExecutorError::Failed(format!("cannot write targets: {}", e)));
                }
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|e| ExecutorError::Failed(format!("{} did not finish: {}", self.program, e)))?;

        if output.status.success() {
            return Ok(());
        }

        let message = String::from_utf8_lossy(&output.stderr).trim().to_string();
        match output.status.code() {
            Some(EXIT_UNKNOWN_MIGRATION) => {
                Err(ExecutorError::UnknownMigration { detail: message })
            }
            Some(EXIT_NODE_NOT_FOUND) => Err(ExecutorError::NodeNotFound(message)),
            _ => Err(ExecutorError::Failed(format!(
                "{} exited with {}: {}",
                self.program, output.status, message
            ))),
        }
    }
}
