//! Read-only snapshot queries.
//!
//! Every loader returns fully hydrated `Snapshot`s (header plus members) so
//! their fingerprints can be computed without further queries.

use crate::errors::{persistence, Result};
use chrono::{DateTime, TimeZone, Utc};
use migsnap_core::errors::{ExError, SnapshotError};
use migsnap_core::model::{Snapshot, SnapshotMember};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

const SNAPSHOT_COLUMNS: &str = "id, name, created_at, applied";

/// A snapshot row with its member count, for listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotSummary {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub applied: bool,
    pub member_count: i64,
}

struct SnapshotHeader {
    id: i64,
    name: String,
    created_at: DateTime<Utc>,
    applied: bool,
}

fn millis_to_datetime(idx: usize, ms: i64) -> rusqlite::Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single().ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            format!("timestamp out of range: {}", ms).into(),
        )
    })
}

fn row_to_header(row: &rusqlite::Row<'_>) -> rusqlite::Result<SnapshotHeader> {
    Ok(SnapshotHeader {
        id: row.get(0)?,
        name: row.get(1)?,
        created_at: millis_to_datetime(2, row.get(2)?)?,
        applied: row.get(3)?,
    })
}

fn row_to_member(row: &rusqlite::Row<'_>) -> rusqlite::Result<SnapshotMember> {
    let raw_id: String = row.get(0)?;
    let id = Uuid::parse_str(&raw_id)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;
    Ok(SnapshotMember {
        id,
        snapshot_id: row.get(1)?,
        unit: row.get(2)?,
        version: row.get(3)?,
        source_ledger_id: row.get(4)?,
    })
}

/// Load the members of a snapshot, ordered by (unit, version).
pub fn load_members(conn: &Connection, snapshot_id: i64) -> Result<Vec<SnapshotMember>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, snapshot_id, unit, version, source_ledger_id
             FROM snapshot_members
             WHERE snapshot_id = ?1
             ORDER BY unit, version",
        )
        .map_err(|e| persistence("load_members", e))?;
    let members: std::result::Result<Vec<_>, _> = stmt
        .query_map([snapshot_id], row_to_member)
        .map_err(|e| persistence("load_members", e))?
        .collect();
    members.map_err(|e| persistence("load_members", e))
}

fn hydrate(conn: &Connection, header: SnapshotHeader) -> Result<Snapshot> {
    let members = load_members(conn, header.id)?;
    Ok(Snapshot::new(
        header.id,
        header.name,
        header.created_at,
        header.applied,
        members,
    ))
}

fn find_one(
    conn: &Connection,
    op: &str,
    clause: &str,
    params: impl rusqlite::Params,
) -> Result<Option<Snapshot>> {
    let sql = format!("SELECT {} FROM snapshots {}", SNAPSHOT_COLUMNS, clause);
    let header = conn
        .query_row(&sql, params, row_to_header)
        .optional()
        .map_err(|e| persistence(op, e))?;
    header.map(|h| hydrate(conn, h)).transpose()
}

/// Find a snapshot by its unique name.
pub fn find_by_name(conn: &Connection, name: &str) -> Result<Option<Snapshot>> {
    find_one(conn, "find_by_name", "WHERE name = ?1", [name])
}

/// Find a snapshot by name, failing with `NotFound` when absent.
pub fn get_by_name(conn: &Connection, name: &str) -> Result<Snapshot> {
    find_by_name(conn, name)?.ok_or_else(|| {
        ExError::from(SnapshotError::SnapshotNotFound {
            name: name.to_string(),
        })
        .with_op("get_by_name")
    })
}

/// Whether a snapshot with this name exists.
pub fn exists_by_name(conn: &Connection, name: &str) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM snapshots WHERE name = ?1)",
        [name],
        |row| row.get(0),
    )
    .map_err(|e| persistence("exists_by_name", e))
}

/// Number of snapshots currently flagged applied.
pub fn count_applied(conn: &Connection) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM snapshots WHERE applied = 1",
        [],
        |row| row.get(0),
    )
    .map_err(|e| persistence("count_applied", e))
}

/// The applied snapshot, if any.
///
/// # Errors
///
/// - `InvariantViolation`: more than one snapshot is flagged applied
/// - `Persistence`: SQLite query failed
pub fn get_applied(conn: &Connection) -> Result<Option<Snapshot>> {
    let count = count_applied(conn)?;
    if count > 1 {
        return Err(ExError::from(SnapshotError::MultipleApplied { count }).with_op("get_applied"));
    }
    find_one(conn, "get_applied", "WHERE applied = 1", [])
}

/// The most recently created snapshot (highest id).
pub fn get_latest_by_id(conn: &Connection) -> Result<Option<Snapshot>> {
    find_one(conn, "get_latest_by_id", "ORDER BY id DESC LIMIT 1", [])
}

/// All snapshots in creation order with their member counts.
pub fn list_snapshots(conn: &Connection) -> Result<Vec<SnapshotSummary>> {
    let mut stmt = conn
        .prepare(
            "SELECT s.id, s.name, s.created_at, s.applied, COUNT(m.id)
             FROM snapshots s
             LEFT JOIN snapshot_members m ON m.snapshot_id = s.id
             GROUP BY s.id
             ORDER BY s.id",
        )
        .map_err(|e| persistence("list_snapshots", e))?;
    let rows: std::result::Result<Vec<_>, _> = stmt
        .query_map([], |row| {
            Ok(SnapshotSummary {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: millis_to_datetime(2, row.get(2)?)?,
                applied: row.get(3)?,
                member_count: row.get(4)?,
            })
        })
        .map_err(|e| persistence("list_snapshots", e))?
        .collect();
    rows.map_err(|e| persistence("list_snapshots", e))
}
