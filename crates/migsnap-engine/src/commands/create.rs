//! Snapshot creation.
//!
//! ## Pipeline (in order):
//! 1. Name validation (`InvalidInput` when blank) and collision check
//!    (`DuplicateName` unless overwrite)
//! 2. Read the baseline (applied snapshot) and the live ledger
//! 3. No-op short-circuit when the baseline already matches the ledger
//! 4. dry_run short-circuit (no writes)
//! 5. One transaction: unflag baseline, write members, flag the result

use migsnap_core::errors::{ExError, SnapshotError};
use migsnap_core::model::{generate_snapshot_name, Snapshot};
use migsnap_core::{log_op_end, log_op_error, log_op_start};
use migsnap_store::errors::{persistence, Result};
use migsnap_store::ledger;
use migsnap_store::snapshot::{persist, query};
use rusqlite::Connection;
use std::time::Instant;

/// Options for snapshot creation.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateOptions {
    /// Replace the members of an existing snapshot with the same name
    pub overwrite: bool,
    /// Decide the outcome without writing anything
    pub dry_run: bool,
}

/// Outcome of a creation request.
#[derive(Debug, Clone)]
pub struct CreationResult {
    /// False when the applied snapshot already describes the live ledger
    pub created: bool,
    /// The written snapshot; `None` for no-ops and dry runs
    pub snapshot: Option<Snapshot>,
}

impl CreationResult {
    fn unchanged() -> Self {
        Self {
            created: false,
            snapshot: None,
        }
    }
}

/// Capture the live ledger state as a snapshot and make it the applied one.
///
/// `name = None` generates a name from a random salt and the current time.
/// `bookkeeping_unit` is excluded from the captured state.
///
/// # Errors
///
/// - `InvalidInput`: the supplied name is blank
/// - `DuplicateName`: the name exists and `overwrite` is false
/// - `InvariantViolation`: storage holds more than one applied snapshot
/// - `Persistence`: SQLite failure; nothing was written
pub fn create_snapshot(
    conn: &mut Connection,
    name: Option<&str>,
    options: CreateOptions,
    bookkeeping_unit: &str,
) -> Result<CreationResult> {
    let name = name
        .map(str::to_string)
        .unwrap_or_else(|| generate_snapshot_name(chrono::Utc::now()));

    let start = Instant::now();
    log_op_start!(
        "create_snapshot",
        snapshot_name = name.as_str(),
        overwrite = options.overwrite,
        dry_run = options.dry_run
    );

    let result = create_inner(conn, &name, options, bookkeeping_unit);

    let duration_ms = start.elapsed().as_millis() as u64;
    match &result {
        Ok(r) => {
            log_op_end!(
                "create_snapshot",
                duration_ms = duration_ms,
                created = r.created
            );
        }
        Err(e) => {
            log_op_error!("create_snapshot", e.clone(), duration_ms = duration_ms);
        }
    }
    result
}

fn create_inner(
    conn: &mut Connection,
    name: &str,
    options: CreateOptions,
    bookkeeping_unit: &str,
) -> Result<CreationResult> {
    if name.trim().is_empty() {
        return Err(ExError::from(SnapshotError::InvalidName {
            name: name.to_string(),
        })
        .with_op("create_snapshot"));
    }

    let existing = query::find_by_name(conn, name)?;
    if existing.is_some() && !options.overwrite {
        return Err(ExError::from(SnapshotError::DuplicateName {
            name: name.to_string(),
        })
        .with_op("create_snapshot"));
    }

    let baseline = query::get_applied(conn)?;
    // Captured once; the write below uses exactly this set
    let live = ledger::latest_applied(conn, bookkeeping_unit)?;
    let live_fingerprint = ledger::fingerprint_entries(&live);

    if let Some(b) = &baseline {
        if b.fingerprint() == live_fingerprint {
            tracing::debug!(
                snapshot_name = %b.name,
                fingerprint = %live_fingerprint,
                "Applied snapshot already matches the ledger"
            );
            return Ok(CreationResult::unchanged());
        }
    }

    if options.dry_run {
        return Ok(CreationResult {
            created: true,
            snapshot: None,
        });
    }

    let tx = conn
        .transaction()
        .map_err(|e| persistence("create_snapshot", e))?;

    if let Some(b) = &baseline {
        persist::clear_applied_tx(&tx, b.id)?;
    }

    let (id, created_at) = match &existing {
        Some(s) => {
            persist::delete_members_tx(&tx, s.id)?;
            (s.id, s.created_at)
        }
        None => {
            let now = chrono::Utc::now();
            (persist::insert_snapshot_tx(&tx, name, now, false)?, now)
        }
    };

    let members = persist::members_from_ledger(id, &live);
    persist::insert_members_tx(&tx, &members)?;
    persist::mark_applied_exclusive_tx(&tx, id)?;

    tx.commit()
        .map_err(|e| persistence("create_snapshot", e))?;

    Ok(CreationResult {
        created: true,
        snapshot: Some(Snapshot::new(id, name, created_at, true, members)),
    })
}
