//! Administrative command surface.
//!
//! Every entry surface (CLI, scripts, tests) builds an `EngineCommand` and
//! hands it to [`apply_engine_command`]; each arm is a single call into the
//! create, checkout or delete services.

use crate::commands::checkout::{checkout, CheckoutReport};
use crate::commands::create::{create_snapshot, CreateOptions, CreationResult};
use crate::commands::delete::{delete_history, delete_snapshot};
use migsnap_core::errors::{ExError, ExErrorKind, SnapshotError};
use migsnap_core::executor::MigrationExecutor;
use migsnap_core::settings::Settings;
use migsnap_store::errors::Result;
use migsnap_store::snapshot::{self, SnapshotSummary};
use rusqlite::Connection;

/// Engine-level commands that require I/O (database, executor).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    /// Capture the live ledger; `name = None` generates one.
    CreateSnapshot {
        name: Option<String>,
        overwrite: bool,
        dry_run: bool,
    },
    Checkout {
        name: String,
        force: bool,
    },
    /// Check out the most recently created snapshot.
    CheckoutLatest {
        force: bool,
    },
    /// Delete one snapshot; `confirmed = false` cancels without touching it.
    DeleteByName {
        name: String,
        confirmed: bool,
    },
    /// Delete every snapshot, the applied one included.
    DeleteHistory {
        confirmed: bool,
    },
    ListSnapshots,
}

impl EngineCommand {
    /// Operation name used in logs and errors.
    pub fn op(&self) -> &'static str {
        match self {
            EngineCommand::CreateSnapshot { .. } => "create_snapshot",
            EngineCommand::Checkout { .. } => "checkout",
            EngineCommand::CheckoutLatest { .. } => "checkout_latest",
            EngineCommand::DeleteByName { .. } => "delete_snapshot",
            EngineCommand::DeleteHistory { .. } => "delete_history",
            EngineCommand::ListSnapshots => "list_snapshots",
        }
    }

    /// Whether the command is refused when admin actions are disabled.
    ///
    /// Everything that writes snapshot rows is gated; a dry-run create only
    /// reads, so it stays available for validation.
    pub fn is_admin_action(&self) -> bool {
        match self {
            EngineCommand::CreateSnapshot { dry_run, .. } => !dry_run,
            EngineCommand::Checkout { .. }
            | EngineCommand::CheckoutLatest { .. }
            | EngineCommand::DeleteByName { .. }
            | EngineCommand::DeleteHistory { .. } => true,
            EngineCommand::ListSnapshots => false,
        }
    }
}

/// Result of applying an engine command.
#[derive(Debug, Clone)]
pub enum EngineCommandResult {
    SnapshotCreated(CreationResult),
    CheckedOut(CheckoutReport),
    Deleted { name: String, members: usize },
    HistoryDeleted { snapshots: usize, members: usize },
    Snapshots(Vec<SnapshotSummary>),
}

/// Apply an engine command.
///
/// # Errors
///
/// - `Forbidden`: an admin command while `settings.admin_actions` is false
/// - `Cancelled`: a delete that was not confirmed
/// - `NotFound`: the named (or latest) snapshot does not exist
/// - anything the underlying service returns
pub fn apply_engine_command(
    cmd: EngineCommand,
    conn: &mut Connection,
    settings: &Settings,
    executor: &dyn MigrationExecutor,
) -> Result<EngineCommandResult> {
    if cmd.is_admin_action() && !settings.admin_actions {
        return Err(SnapshotError::AdminActionsDisabled {
            op: cmd.op().to_string(),
        }
        .into());
    }

    let unit = settings.bookkeeping_unit.as_str();

    match cmd {
        EngineCommand::CreateSnapshot {
            name,
            overwrite,
            dry_run,
        } => {
            let options = CreateOptions { overwrite, dry_run };
            create_snapshot(conn, name.as_deref(), options, unit)
                .map(EngineCommandResult::SnapshotCreated)
        }
        EngineCommand::Checkout { name, force } => {
            let target = snapshot::get_by_name(conn, &name)?;
            checkout(conn, &target, force, executor, unit).map(EngineCommandResult::CheckedOut)
        }
        EngineCommand::CheckoutLatest { force } => {
            let target = snapshot::get_latest_by_id(conn)?.ok_or_else(|| {
                ExError::new(ExErrorKind::NotFound)
                    .with_op("checkout_latest")
                    .with_message("No snapshots recorded")
            })?;
            checkout(conn, &target, force, executor, unit).map(EngineCommandResult::CheckedOut)
        }
        EngineCommand::DeleteByName { name, confirmed } => {
            if !confirmed {
                return Err(SnapshotError::Cancelled {
                    op: "delete_snapshot".to_string(),
                }
                .into());
            }
            let members = delete_snapshot(conn, &name)?;
            Ok(EngineCommandResult::Deleted { name, members })
        }
        EngineCommand::DeleteHistory { confirmed } => {
            if !confirmed {
                return Err(SnapshotError::Cancelled {
                    op: "delete_history".to_string(),
                }
                .into());
            }
            let (snapshots, members) = delete_history(conn)?;
            Ok(EngineCommandResult::HistoryDeleted { snapshots, members })
        }
        EngineCommand::ListSnapshots => {
            snapshot::list_snapshots(conn).map(EngineCommandResult::Snapshots)
        }
    }
}
