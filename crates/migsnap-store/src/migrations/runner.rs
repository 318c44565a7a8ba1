//! Migration runner
//!
//! Applies embedded migrations in order. Each one runs in its own
//! transaction together with its `schema_version` row and its ledger row
//! under the bookkeeping unit, so a failed migration leaves no trace.

use crate::errors::{checksum_mismatch, from_rusqlite, migration_error, Result};
use crate::ledger::record_applied;
use crate::migrations::checksums::compute_checksum;
use crate::migrations::embedded::get_migrations;
use migsnap_core::settings::DEFAULT_BOOKKEEPING_UNIT;
use rusqlite::{Connection, OptionalExtension};

/// Apply all pending migrations, recording them under the default
/// bookkeeping unit.
pub fn apply_migrations(conn: &mut Connection) -> Result<()> {
    apply_migrations_for_unit(conn, DEFAULT_BOOKKEEPING_UNIT)
}

/// Apply all pending migrations, recording them in the ledger under
/// `bookkeeping_unit`.
pub fn apply_migrations_for_unit(conn: &mut Connection, bookkeeping_unit: &str) -> Result<()> {
    create_schema_version_table(conn)?;

    for migration in get_migrations() {
        apply_migration(conn, migration.id, migration.sql, bookkeeping_unit)?;
    }

    Ok(())
}

/// Create the schema_version table if it doesn't exist
fn create_schema_version_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY,
            migration_id TEXT NOT NULL UNIQUE,
            applied_at INTEGER NOT NULL,
            checksum TEXT
        )",
        [],
    )
    .map_err(from_rusqlite)?;

    Ok(())
}

/// Apply a single migration if not already applied
fn apply_migration(
    conn: &mut Connection,
    migration_id: &str,
    sql: &str,
    bookkeeping_unit: &str,
) -> Result<()> {
    let checksum = compute_checksum(sql);

    let recorded: Option<Option<String>> = conn
        .query_row(
            "SELECT checksum FROM schema_version WHERE migration_id = ?1",
            [migration_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(from_rusqlite)?;

    match recorded {
        Some(Some(existing)) if existing != checksum => {
            return Err(checksum_mismatch(migration_id, &existing, &checksum));
        }
        // Idempotent: already applied
        Some(_) => return Ok(()),
        None => {}
    }

    let tx = conn.transaction().map_err(from_rusqlite)?;

    tx.execute_batch(sql)
        .map_err(|e| migration_error(migration_id, &e.to_string()))?;

    let now = chrono::Utc::now().timestamp();
    tx.execute(
        "INSERT INTO schema_version (migration_id, applied_at, checksum) VALUES (?1, ?2, ?3)",
        rusqlite::params![migration_id, now, checksum],
    )
    .map_err(from_rusqlite)?;

    record_applied(&tx, bookkeeping_unit, migration_id)?;

    tx.commit().map_err(from_rusqlite)?;

    tracing::debug!(
        migration_id = %migration_id,
        unit = %bookkeeping_unit,
        "Applied store migration"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_migrations() {
        let mut conn = Connection::open_in_memory().unwrap();
        let result = apply_migrations(&mut conn);
        assert!(result.is_ok());
    }

    #[test]
    fn test_idempotency() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();
        let result = apply_migrations(&mut conn);
        assert!(result.is_ok());
    }

    #[test]
    fn test_tampered_checksum_detected() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();
        conn.execute(
            "UPDATE schema_version SET checksum = 'bogus' \
             WHERE migration_id = '001_migration_ledger'",
            [],
        )
        .unwrap();

        let err = apply_migrations(&mut conn).unwrap_err();
        assert_eq!(
            err.kind(),
            migsnap_core::errors::ExErrorKind::InvariantViolation
        );
    }
}
