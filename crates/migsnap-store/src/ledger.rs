//! Ledger reader
//!
//! Read-only view over the `migration_ledger` table: for every unit, the row
//! with the highest id is its latest applied migration. The bookkeeping unit
//! under which migsnap records its own schema is always excluded, so the
//! snapshot tables never appear in the state they describe.

use crate::errors::{persistence, Result};
use migsnap_core::fingerprint::fingerprint;
use migsnap_core::model::LedgerEntry;
use rusqlite::Connection;

/// Latest applied ledger row per unit, excluding `excluded_unit`, ordered by
/// unit.
///
/// # Errors
///
/// - `Persistence`: SQLite query failed (including a missing ledger table)
pub fn latest_applied(conn: &Connection, excluded_unit: &str) -> Result<Vec<LedgerEntry>> {
    let mut stmt = conn
        .prepare(
            "SELECT l.id, l.unit, l.version
             FROM migration_ledger l
             JOIN (
                 SELECT unit, MAX(id) AS max_id
                 FROM migration_ledger
                 WHERE unit != ?1
                 GROUP BY unit
             ) latest ON l.id = latest.max_id
             ORDER BY l.unit",
        )
        .map_err(|e| persistence("latest_applied", e))?;

    let rows: std::result::Result<Vec<_>, _> = stmt
        .query_map([excluded_unit], |row| {
            Ok(LedgerEntry {
                id: row.get(0)?,
                unit: row.get(1)?,
                version: row.get(2)?,
            })
        })
        .map_err(|e| persistence("latest_applied", e))?
        .collect();

    rows.map_err(|e| persistence("latest_applied", e))
}

/// Fingerprint of the live ledger's latest-per-unit set.
pub fn live_fingerprint(conn: &Connection, excluded_unit: &str) -> Result<String> {
    let entries = latest_applied(conn, excluded_unit)?;
    Ok(fingerprint_entries(&entries))
}

/// Fingerprint of a set of ledger entries (ids are ignored).
pub fn fingerprint_entries(entries: &[LedgerEntry]) -> String {
    fingerprint(entries.iter().map(|e| (e.unit.as_str(), e.version.as_str())))
}

/// Append a ledger row and return its id.
///
/// Executors call this when they apply a migration; the migration runner
/// calls it for the store's own schema.
pub fn record_applied(conn: &Connection, unit: &str, version: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO migration_ledger (unit, version, applied_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![unit, version, chrono::Utc::now().timestamp_millis()],
    )
    .map_err(|e| persistence("record_applied", e))?;
    Ok(conn.last_insert_rowid())
}
