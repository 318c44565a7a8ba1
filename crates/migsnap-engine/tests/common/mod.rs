//! Shared fixtures for engine integration tests.
#![allow(dead_code)]

use migsnap_core::executor::{ExecutorError, MigrationExecutor};
use migsnap_core::model::MigrationPair;
use migsnap_store::ledger;
use rusqlite::Connection;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const UNIT: &str = "migsnap";

pub struct TestStore {
    _dir: TempDir,
    pub path: PathBuf,
    pub conn: Connection,
}

pub fn setup() -> TestStore {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.db");
    let conn = migsnap_store::db::open_store(&path, UNIT).unwrap();
    TestStore {
        _dir: dir,
        path,
        conn,
    }
}

impl TestStore {
    /// Append ledger rows, as a schema executor would.
    pub fn apply(&self, pairs: &[(&str, &str)]) {
        for (unit, version) in pairs {
            ledger::record_applied(&self.conn, unit, version).unwrap();
        }
    }

    pub fn live_pairs(&self) -> Vec<MigrationPair> {
        ledger::latest_applied(&self.conn, UNIT)
            .unwrap()
            .iter()
            .map(|e| e.pair())
            .collect()
    }

    pub fn applied_name(&self) -> Option<String> {
        migsnap_store::snapshot::get_applied(&self.conn)
            .unwrap()
            .map(|s| s.name)
    }

    pub fn executor(&self) -> LedgerRewritingExecutor {
        LedgerRewritingExecutor::new(&self.path)
    }
}

pub fn pairs(raw: &[(&str, &str)]) -> Vec<MigrationPair> {
    let mut out: Vec<MigrationPair> = raw.iter().map(|p| MigrationPair::from(*p)).collect();
    out.sort();
    out
}

/// Executor that rewrites the ledger on its own connection: units absent
/// from the targets are rolled back to nothing, listed units get a new
/// latest row at the requested version.
pub struct LedgerRewritingExecutor {
    path: PathBuf,
    pub calls: RefCell<Vec<Vec<MigrationPair>>>,
}

impl LedgerRewritingExecutor {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl MigrationExecutor for LedgerRewritingExecutor {
    fn migrate(&self, targets: &[MigrationPair]) -> Result<(), ExecutorError> {
        self.calls.borrow_mut().push(targets.to_vec());

        let conn = Connection::open(&self.path).map_err(|e| ExecutorError::Failed(e.to_string()))?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT unit FROM migration_ledger WHERE unit != ?1")
            .map_err(|e| ExecutorError::Failed(e.to_string()))?;
        let units: Vec<String> = stmt
            .query_map([UNIT], |row| row.get(0))
            .and_then(|rows| rows.collect())
            .map_err(|e| ExecutorError::Failed(e.to_string()))?;

        for unit in units {
            if !targets.iter().any(|t| t.unit == unit) {
                conn.execute("DELETE FROM migration_ledger WHERE unit = ?1", [&unit])
                    .map_err(|e| ExecutorError::Failed(e.to_string()))?;
            }
        }
        for target in targets {
            ledger::record_applied(&conn, &target.unit, &target.version)
                .map_err(|e| ExecutorError::Failed(e.to_string()))?;
        }
        Ok(())
    }
}

/// Executor that always fails with a fixed error and records nothing.
pub struct FailingExecutor(pub ExecutorError);

impl MigrationExecutor for FailingExecutor {
    fn migrate(&self, _targets: &[MigrationPair]) -> Result<(), ExecutorError> {
        Err(self.0.clone())
    }
}
