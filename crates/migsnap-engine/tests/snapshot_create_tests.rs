mod common;

use common::{pairs, setup, UNIT};
use migsnap_core::errors::ExErrorKind;
use migsnap_engine::{create_snapshot, CreateOptions};
use migsnap_store::snapshot;

#[test]
fn test_create_captures_latest_per_unit_and_applies() {
    let mut store = setup();
    store.apply(&[("app1", "0001"), ("app1", "0002"), ("app2", "0001")]);

    let result =
        create_snapshot(&mut store.conn, Some("s1"), CreateOptions::default(), UNIT).unwrap();

    assert!(result.created);
    let created = result.snapshot.unwrap();
    assert!(created.applied);
    assert_eq!(created.pairs(), pairs(&[("app1", "0002"), ("app2", "0001")]));
    assert_eq!(store.applied_name().as_deref(), Some("s1"));
}

#[test]
fn test_create_is_noop_when_baseline_matches_ledger() {
    let mut store = setup();
    store.apply(&[("app1", "0001")]);
    create_snapshot(&mut store.conn, Some("s1"), CreateOptions::default(), UNIT).unwrap();

    let again =
        create_snapshot(&mut store.conn, Some("s2"), CreateOptions::default(), UNIT).unwrap();

    assert!(!again.created);
    assert!(again.snapshot.is_none());
    assert!(!snapshot::exists_by_name(&store.conn, "s2").unwrap());
    assert_eq!(store.applied_name().as_deref(), Some("s1"));
}

#[test]
fn test_create_moves_applied_flag_to_new_snapshot() {
    let mut store = setup();
    store.apply(&[("app1", "0001")]);
    create_snapshot(&mut store.conn, Some("s1"), CreateOptions::default(), UNIT).unwrap();
    store.apply(&[("app1", "0002")]);
    create_snapshot(&mut store.conn, Some("s2"), CreateOptions::default(), UNIT).unwrap();

    assert_eq!(snapshot::query::count_applied(&store.conn).unwrap(), 1);
    assert_eq!(store.applied_name().as_deref(), Some("s2"));
    assert!(!snapshot::get_by_name(&store.conn, "s1").unwrap().applied);
}

#[test]
fn test_blank_name_rejected_before_any_write() {
    let mut store = setup();
    store.apply(&[("app1", "0001")]);

    for name in ["", "   "] {
        let options = CreateOptions {
            overwrite: true,
            dry_run: false,
        };
        let err = create_snapshot(&mut store.conn, Some(name), options, UNIT).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidInput);
        assert_eq!(err.op(), Some("create_snapshot"));
    }
    assert!(snapshot::list_snapshots(&store.conn).unwrap().is_empty());
}

#[test]
fn test_duplicate_name_without_overwrite() {
    let mut store = setup();
    store.apply(&[("app1", "0001")]);
    create_snapshot(&mut store.conn, Some("s1"), CreateOptions::default(), UNIT).unwrap();
    store.apply(&[("app1", "0002")]);

    let err =
        create_snapshot(&mut store.conn, Some("s1"), CreateOptions::default(), UNIT).unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::DuplicateName);
    assert_eq!(err.entity_id(), Some("s1"));
    let kept = snapshot::get_by_name(&store.conn, "s1").unwrap();
    assert_eq!(kept.pairs(), pairs(&[("app1", "0001")]));
}

#[test]
fn test_overwrite_replaces_members_in_place() {
    let mut store = setup();
    store.apply(&[("app1", "0001")]);
    let first = create_snapshot(&mut store.conn, Some("s1"), CreateOptions::default(), UNIT)
        .unwrap()
        .snapshot
        .unwrap();
    store.apply(&[("app1", "0002"), ("app2", "0001")]);

    let options = CreateOptions {
        overwrite: true,
        dry_run: false,
    };
    let second = create_snapshot(&mut store.conn, Some("s1"), options, UNIT)
        .unwrap()
        .snapshot
        .unwrap();

    assert_eq!(second.id, first.id);
    assert!(!second.content_equals(&first));
    let stored = snapshot::get_by_name(&store.conn, "s1").unwrap();
    assert_eq!(stored.pairs(), pairs(&[("app1", "0002"), ("app2", "0001")]));
    assert_eq!(snapshot::list_snapshots(&store.conn).unwrap().len(), 1);
}

#[test]
fn test_overwrite_of_other_snapshot_moves_flag() {
    let mut store = setup();
    store.apply(&[("app1", "0001")]);
    create_snapshot(&mut store.conn, Some("old"), CreateOptions::default(), UNIT).unwrap();
    store.apply(&[("app1", "0002")]);
    create_snapshot(&mut store.conn, Some("new"), CreateOptions::default(), UNIT).unwrap();
    store.apply(&[("app1", "0003")]);

    let options = CreateOptions {
        overwrite: true,
        dry_run: false,
    };
    create_snapshot(&mut store.conn, Some("old"), options, UNIT).unwrap();

    assert_eq!(store.applied_name().as_deref(), Some("old"));
    assert_eq!(snapshot::query::count_applied(&store.conn).unwrap(), 1);
}

#[test]
fn test_dry_run_writes_nothing() {
    let mut store = setup();
    store.apply(&[("app1", "0001")]);
    create_snapshot(&mut store.conn, Some("s1"), CreateOptions::default(), UNIT).unwrap();
    store.apply(&[("app1", "0002")]);

    let options = CreateOptions {
        overwrite: false,
        dry_run: true,
    };
    let result = create_snapshot(&mut store.conn, Some("s2"), options, UNIT).unwrap();

    assert!(result.created);
    assert!(result.snapshot.is_none());
    assert!(!snapshot::exists_by_name(&store.conn, "s2").unwrap());
    assert_eq!(store.applied_name().as_deref(), Some("s1"));
}

#[test]
fn test_dry_run_still_reports_noop() {
    let mut store = setup();
    store.apply(&[("app1", "0001")]);
    create_snapshot(&mut store.conn, Some("s1"), CreateOptions::default(), UNIT).unwrap();

    let options = CreateOptions {
        overwrite: false,
        dry_run: true,
    };
    let result = create_snapshot(&mut store.conn, Some("s2"), options, UNIT).unwrap();
    assert!(!result.created);
}

#[test]
fn test_generated_name_shape() {
    let mut store = setup();
    store.apply(&[("app1", "0001")]);

    let created = create_snapshot(&mut store.conn, None, CreateOptions::default(), UNIT)
        .unwrap()
        .snapshot
        .unwrap();

    // {6-char salt}_{dd-mm-YYYYTHH:MM:SS}
    assert_eq!(created.name.len(), 26);
    assert_eq!(&created.name[6..7], "_");
    assert!(snapshot::exists_by_name(&store.conn, &created.name).unwrap());
}

#[test]
fn test_bookkeeping_unit_never_captured() {
    let mut store = setup();
    store.apply(&[("app1", "0001"), (UNIT, "999_extra")]);

    let created = create_snapshot(&mut store.conn, Some("s1"), CreateOptions::default(), UNIT)
        .unwrap()
        .snapshot
        .unwrap();

    assert!(created.members().iter().all(|m| m.unit != UNIT));
    assert_eq!(created.members().len(), 1);
}
