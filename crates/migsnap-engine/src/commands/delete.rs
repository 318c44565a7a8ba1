//! Snapshot deletion.

use migsnap_core::{log_op_end, log_op_error, log_op_start};
use migsnap_store::errors::Result;
use migsnap_store::snapshot;
use rusqlite::Connection;
use std::time::Instant;

/// Delete one snapshot by name; returns the number of members removed.
///
/// # Errors
///
/// - `NotFound`: no snapshot has this name
/// - `Conflict`: the snapshot is applied
/// - `Persistence`: SQLite failure
pub fn delete_snapshot(conn: &mut Connection, name: &str) -> Result<usize> {
    let start = Instant::now();
    log_op_start!("delete_snapshot", snapshot_name = name);

    let result = snapshot::get_by_name(conn, name)
        .and_then(|target| snapshot::delete_snapshot(conn, &target));

    let duration_ms = start.elapsed().as_millis() as u64;
    match &result {
        Ok(members) => {
            log_op_end!(
                "delete_snapshot",
                duration_ms = duration_ms,
                member_count = *members
            );
        }
        Err(e) => {
            log_op_error!("delete_snapshot", e.clone(), duration_ms = duration_ms);
        }
    }
    result
}

/// Delete every snapshot including the applied one.
///
/// Returns `(snapshots, members)` removed. The ledger is untouched.
///
/// # Errors
///
/// `Persistence` on SQLite failure; nothing is deleted in that case.
pub fn delete_history(conn: &mut Connection) -> Result<(usize, usize)> {
    let start = Instant::now();
    log_op_start!("delete_history");

    let result = snapshot::delete_all(conn);

    let duration_ms = start.elapsed().as_millis() as u64;
    match &result {
        Ok((snapshots, members)) => {
            log_op_end!(
                "delete_history",
                duration_ms = duration_ms,
                snapshot_count = *snapshots,
                member_count = *members
            );
        }
        Err(e) => {
            log_op_error!("delete_history", e.clone(), duration_ms = duration_ms);
        }
    }
    result
}
