//! Database connection management
//!
//! Provides utilities for opening and managing SQLite connections

use crate::errors::{from_rusqlite, Result};
use crate::migrations::apply_migrations_for_unit;
use rusqlite::Connection;
use std::path::Path;

/// Open a SQLite database at the given path
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    Connection::open(path).map_err(from_rusqlite)
}

/// Open an in-memory SQLite database (for testing)
pub fn open_in_memory() -> Result<Connection> {
    Connection::open_in_memory().map_err(from_rusqlite)
}

/// Configure a connection with optimal settings
pub fn configure(conn: &Connection) -> Result<()> {
    // Member rows cascade with their snapshot
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(from_rusqlite)?;

    // journal_mode reports the resulting mode as a row
    let _mode: String = conn
        .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
        .map_err(from_rusqlite)?;

    Ok(())
}

/// Open, configure and migrate a database in one step.
///
/// `bookkeeping_unit` is the ledger unit under which the store's own schema
/// migrations are recorded.
pub fn open_store<P: AsRef<Path>>(path: P, bookkeeping_unit: &str) -> Result<Connection> {
    let mut conn = open(path)?;
    configure(&conn)?;
    apply_migrations_for_unit(&mut conn, bookkeeping_unit)?;
    Ok(conn)
}
