//! Snapshot mutations.
//!
//! Two layers:
//! - `*_tx` helpers run against an open transaction (any `&Connection`,
//!   including a `rusqlite::Transaction` by deref) so services can compose
//!   several steps into one atomic unit.
//! - Top-level operations open their own transaction. A transaction dropped
//!   on an error path rolls back, so none of them can leave partial writes.

use crate::errors::{persistence, Result};
use crate::snapshot::query::count_applied;
use chrono::{DateTime, Utc};
use migsnap_core::errors::{ExError, ExErrorKind, SnapshotError};
use migsnap_core::model::{LedgerEntry, Snapshot, SnapshotMember};
use rusqlite::Connection;

/// Insert a snapshot row and return its id.
pub fn insert_snapshot_tx(
    conn: &Connection,
    name: &str,
    created_at: DateTime<Utc>,
    applied: bool,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO snapshots (name, created_at, applied) VALUES (?1, ?2, ?3)",
        rusqlite::params![name, created_at.timestamp_millis(), applied],
    )
    .map_err(|e| persistence("insert_snapshot", e))?;
    Ok(conn.last_insert_rowid())
}

/// Bulk-insert members, silently skipping rows whose key already exists.
///
/// Returns the number of rows actually inserted.
pub fn insert_members_tx(conn: &Connection, members: &[SnapshotMember]) -> Result<usize> {
    let mut stmt = conn
        .prepare_cached(
            "INSERT OR IGNORE INTO snapshot_members
                (id, snapshot_id, unit, version, source_ledger_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .map_err(|e| persistence("insert_members", e))?;

    let mut inserted = 0;
    for m in members {
        inserted += stmt
            .execute(rusqlite::params![
                m.id.to_string(),
                m.snapshot_id,
                m.unit,
                m.version,
                m.source_ledger_id,
            ])
            .map_err(|e| persistence("insert_members", e))?;
    }
    Ok(inserted)
}

/// Delete every member of a snapshot; returns the number deleted.
pub fn delete_members_tx(conn: &Connection, snapshot_id: i64) -> Result<usize> {
    conn.execute(
        "DELETE FROM snapshot_members WHERE snapshot_id = ?1",
        [snapshot_id],
    )
    .map_err(|e| persistence("delete_members", e))
}

/// Clear the applied flag on one snapshot.
pub fn clear_applied_tx(conn: &Connection, snapshot_id: i64) -> Result<()> {
    conn.execute(
        "UPDATE snapshots SET applied = 0 WHERE id = ?1",
        [snapshot_id],
    )
    .map_err(|e| persistence("clear_applied", e))?;
    Ok(())
}

/// Make `snapshot_id` the only applied snapshot.
///
/// The current holder is cleared first; the partial unique index would
/// reject the reverse order.
pub fn mark_applied_exclusive_tx(conn: &Connection, snapshot_id: i64) -> Result<()> {
    conn.execute(
        "UPDATE snapshots SET applied = 0 WHERE applied = 1 AND id != ?1",
        [snapshot_id],
    )
    .map_err(|e| persistence("mark_applied_exclusive", e))?;
    let updated = conn
        .execute(
            "UPDATE snapshots SET applied = 1 WHERE id = ?1",
            [snapshot_id],
        )
        .map_err(|e| persistence("mark_applied_exclusive", e))?;
    if updated == 0 {
        return Err(ExError::new(ExErrorKind::NotFound)
            .with_op("mark_applied_exclusive")
            .with_entity_id(snapshot_id.to_string())
            .with_message("Snapshot row vanished before it could be applied"));
    }
    ensure_single_applied_tx(conn)
}

/// Re-check the single-applied invariant before commit.
pub fn ensure_single_applied_tx(conn: &Connection) -> Result<()> {
    let count = count_applied(conn)?;
    if count > 1 {
        return Err(ExError::from(SnapshotError::MultipleApplied { count })
            .with_op("ensure_single_applied"));
    }
    Ok(())
}

/// Build member rows for `snapshot_id` from ledger entries.
pub fn members_from_ledger(snapshot_id: i64, entries: &[LedgerEntry]) -> Vec<SnapshotMember> {
    entries
        .iter()
        .map(|e| SnapshotMember::from_ledger(snapshot_id, e))
        .collect()
}

/// Insert a new snapshot row and its members as one atomic unit.
///
/// The new snapshot is not applied; use [`set_applied_exclusive`] for that.
///
/// # Errors
///
/// - `Persistence`: the insert failed (e.g. the name is taken)
pub fn create_snapshot(
    conn: &mut Connection,
    name: &str,
    entries: &[LedgerEntry],
) -> Result<Snapshot> {
    let created_at = Utc::now();
    let tx = conn
        .transaction()
        .map_err(|e| persistence("create_snapshot", e))?;

    let id = insert_snapshot_tx(&tx, name, created_at, false)?;
    let members = members_from_ledger(id, entries);
    insert_members_tx(&tx, &members)?;

    tx.commit()
        .map_err(|e| persistence("create_snapshot", e))?;

    tracing::debug!(
        snapshot_id = id,
        snapshot_name = %name,
        member_count = members.len(),
        "Created snapshot"
    );

    Ok(Snapshot::new(id, name, created_at, false, members))
}

/// Atomically replace the whole member set of `snapshot`.
///
/// The in-memory snapshot is updated and its cached fingerprint dropped.
pub fn replace_members(
    conn: &mut Connection,
    snapshot: &mut Snapshot,
    entries: &[LedgerEntry],
) -> Result<()> {
    let tx = conn
        .transaction()
        .map_err(|e| persistence("replace_members", e))?;

    delete_members_tx(&tx, snapshot.id)?;
    let members = members_from_ledger(snapshot.id, entries);
    insert_members_tx(&tx, &members)?;

    tx.commit()
        .map_err(|e| persistence("replace_members", e))?;

    snapshot.replace_members(members);
    Ok(())
}

/// Make `target` the single applied snapshot.
///
/// Returns `false` without writing when `target` already holds the flag.
pub fn set_applied_exclusive(conn: &mut Connection, target: &mut Snapshot) -> Result<bool> {
    let already: bool = conn
        .query_row(
            "SELECT applied FROM snapshots WHERE id = ?1",
            [target.id],
            |row| row.get(0),
        )
        .map_err(|e| persistence("set_applied_exclusive", e))?;
    if already {
        target.applied = true;
        return Ok(false);
    }

    let tx = conn
        .transaction()
        .map_err(|e| persistence("set_applied_exclusive", e))?;
    mark_applied_exclusive_tx(&tx, target.id)?;
    tx.commit()
        .map_err(|e| persistence("set_applied_exclusive", e))?;

    target.applied = true;
    Ok(true)
}

/// Delete a snapshot and its members; returns the number of members deleted.
///
/// # Errors
///
/// - `Conflict`: the snapshot is currently applied
/// - `Persistence`: SQLite failure
pub fn delete_snapshot(conn: &mut Connection, snapshot: &Snapshot) -> Result<usize> {
    let tx = conn
        .transaction()
        .map_err(|e| persistence("delete_snapshot", e))?;

    // Re-read inside the transaction; the caller's copy may be stale
    let applied: bool = tx
        .query_row(
            "SELECT applied FROM snapshots WHERE id = ?1",
            [snapshot.id],
            |row| row.get(0),
        )
        .map_err(|e| persistence("delete_snapshot", e))?;
    if applied {
        return Err(ExError::from(SnapshotError::AppliedSnapshotDelete {
            name: snapshot.name.clone(),
        })
        .with_op("delete_snapshot"));
    }

    let members = delete_members_tx(&tx, snapshot.id)?;
    tx.execute("DELETE FROM snapshots WHERE id = ?1", [snapshot.id])
        .map_err(|e| persistence("delete_snapshot", e))?;

    tx.commit()
        .map_err(|e| persistence("delete_snapshot", e))?;
    Ok(members)
}

/// Delete every snapshot, applied or not; returns `(snapshots, members)`.
pub fn delete_all(conn: &mut Connection) -> Result<(usize, usize)> {
    let tx = conn
        .transaction()
        .map_err(|e| persistence("delete_all", e))?;

    let members = tx
        .execute("DELETE FROM snapshot_members", [])
        .map_err(|e| persistence("delete_all", e))?;
    let snapshots = tx
        .execute("DELETE FROM snapshots", [])
        .map_err(|e| persistence("delete_all", e))?;

    tx.commit().map_err(|e| persistence("delete_all", e))?;
    Ok((snapshots, members))
}
