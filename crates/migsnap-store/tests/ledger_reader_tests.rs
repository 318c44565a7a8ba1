// Ledger reader behaviour against a file-backed store

use migsnap_core::fingerprint::{fingerprint, EMPTY_FINGERPRINT};
use migsnap_store::ledger::{fingerprint_entries, latest_applied, live_fingerprint, record_applied};
use rusqlite::Connection;
use tempfile::TempDir;

fn setup() -> (TempDir, Connection) {
    let dir = TempDir::new().unwrap();
    let conn = migsnap_store::db::open_store(dir.path().join("store.db"), "migsnap").unwrap();
    (dir, conn)
}

#[test]
fn test_fresh_store_has_empty_fingerprint() {
    let (_dir, conn) = setup();
    assert_eq!(live_fingerprint(&conn, "migsnap").unwrap(), EMPTY_FINGERPRINT);
}

#[test]
fn test_rollback_row_becomes_latest() {
    // A rollback appends an older version; the highest id still wins
    let (_dir, conn) = setup();
    record_applied(&conn, "orders", "0001").unwrap();
    record_applied(&conn, "orders", "0002").unwrap();
    record_applied(&conn, "orders", "0001").unwrap();

    let entries = latest_applied(&conn, "migsnap").unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].version, "0001");
}

#[test]
fn test_live_fingerprint_matches_pair_fingerprint() {
    let (_dir, conn) = setup();
    record_applied(&conn, "billing", "0003").unwrap();
    record_applied(&conn, "accounts", "0007").unwrap();

    let expected = fingerprint([("accounts", "0007"), ("billing", "0003")]);
    assert_eq!(live_fingerprint(&conn, "migsnap").unwrap(), expected);

    let entries = latest_applied(&conn, "migsnap").unwrap();
    assert_eq!(fingerprint_entries(&entries), expected);
}

#[test]
fn test_ledger_ids_do_not_affect_fingerprint() {
    let (_dir_a, a) = setup();
    let (_dir_b, b) = setup();

    record_applied(&a, "app", "0001").unwrap();
    record_applied(&b, "noise", "0001").unwrap();
    record_applied(&b, "app", "0001").unwrap();
    b.execute("DELETE FROM migration_ledger WHERE unit = 'noise'", [])
        .unwrap();

    assert_eq!(
        live_fingerprint(&a, "migsnap").unwrap(),
        live_fingerprint(&b, "migsnap").unwrap()
    );
}

#[test]
fn test_missing_ledger_table_is_persistence_error() {
    let conn = Connection::open_in_memory().unwrap();
    let err = latest_applied(&conn, "migsnap").unwrap_err();
    assert_eq!(err.kind(), migsnap_core::ExErrorKind::Persistence);
}
