use crate::fingerprint::fingerprint;
use crate::model::{LedgerEntry, MigrationPair};
use chrono::{DateTime, Utc};
use std::cell::OnceCell;
use uuid::Uuid;

/// One recorded (unit, version) member of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotMember {
    /// Random identifier, independent of ledger row ids
    pub id: Uuid,
    pub snapshot_id: i64,
    pub unit: String,
    pub version: String,
    /// Ledger row this member was copied from; diagnostic only
    pub source_ledger_id: i64,
}

impl SnapshotMember {
    /// Build a member for `snapshot_id` from a live ledger entry.
    pub fn from_ledger(snapshot_id: i64, entry: &LedgerEntry) -> Self {
        Self {
            id: Uuid::new_v4(),
            snapshot_id,
            unit: entry.unit.clone(),
            version: entry.version.clone(),
            source_ledger_id: entry.id,
        }
    }

    pub fn pair(&self) -> MigrationPair {
        MigrationPair::new(self.unit.clone(), self.version.clone())
    }
}

/// A named capture of "latest applied version per unit".
///
/// Snapshots deliberately do not implement `PartialEq`: two snapshots are
/// interchangeable when their member sets are, which is asked through
/// [`Snapshot::content_equals`].
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub applied: bool,
    members: Vec<SnapshotMember>,
    fingerprint: OnceCell<String>,
}

impl Snapshot {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        created_at: DateTime<Utc>,
        applied: bool,
        members: Vec<SnapshotMember>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            created_at,
            applied,
            members,
            fingerprint: OnceCell::new(),
        }
    }

    pub fn members(&self) -> &[SnapshotMember] {
        &self.members
    }

    /// Member pairs in (unit, version) order.
    pub fn pairs(&self) -> Vec<MigrationPair> {
        let mut pairs: Vec<MigrationPair> = self.members.iter().map(|m| m.pair()).collect();
        pairs.sort();
        pairs
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Content fingerprint of the member set, computed on first use.
    pub fn fingerprint(&self) -> &str {
        self.fingerprint.get_or_init(|| {
            fingerprint(
                self.members
                    .iter()
                    .map(|m| (m.unit.as_str(), m.version.as_str())),
            )
        })
    }

    /// True when both snapshots record the same set of (unit, version) pairs,
    /// regardless of id, name or creation time.
    pub fn content_equals(&self, other: &Snapshot) -> bool {
        self.fingerprint() == other.fingerprint()
    }

    /// Swap in a new member set. Only overwrite does this; the cached
    /// fingerprint is dropped with the old members.
    pub fn replace_members(&mut self, members: Vec<SnapshotMember>) {
        self.members = members;
        self.fingerprint = OnceCell::new();
    }
}

/// Generate a snapshot name of the form `{salt}_{dd-mm-YYYYTHH:MM:SS}`.
pub fn generate_snapshot_name(now: DateTime<Utc>) -> String {
    let salt: String = Uuid::new_v4().simple().to_string().chars().take(6).collect();
    format!("{}_{}", salt, now.format("%d-%m-%YT%H:%M:%S"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(snapshot_id: i64, unit: &str, version: &str, ledger_id: i64) -> SnapshotMember {
        SnapshotMember::from_ledger(
            snapshot_id,
            &LedgerEntry {
                id: ledger_id,
                unit: unit.to_string(),
                version: version.to_string(),
            },
        )
    }

    #[test]
    fn test_content_equals_ignores_identity() {
        let a = Snapshot::new(
            1,
            "a",
            Utc::now(),
            true,
            vec![member(1, "app1", "0001", 10), member(1, "app2", "0005", 11)],
        );
        let b = Snapshot::new(
            7,
            "b",
            Utc::now(),
            false,
            vec![member(7, "app2", "0005", 99), member(7, "app1", "0001", 98)],
        );

        assert!(a.content_equals(&b));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_replace_members_invalidates_fingerprint() {
        let mut snapshot =
            Snapshot::new(1, "a", Utc::now(), true, vec![member(1, "app1", "0001", 1)]);
        let before = snapshot.fingerprint().to_string();

        snapshot.replace_members(vec![member(1, "app1", "0002", 2)]);

        assert_ne!(snapshot.fingerprint(), before);
    }

    #[test]
    fn test_generated_name_shape() {
        let now = DateTime::parse_from_rfc3339("2024-03-05T07:08:09Z")
            .unwrap()
            .with_timezone(&Utc);
        let name = generate_snapshot_name(now);
        let (salt, stamp) = name.split_once('_').unwrap();
        assert_eq!(salt.len(), 6);
        assert_eq!(stamp, "05-03-2024T07:08:09");
    }

    #[test]
    fn test_generated_names_differ() {
        let now = Utc::now();
        assert_ne!(generate_snapshot_name(now), generate_snapshot_name(now));
    }
}
