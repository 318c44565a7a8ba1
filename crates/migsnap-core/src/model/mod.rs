//! Domain models: migration pairs, ledger entries and snapshots.

pub mod pair;
pub mod snapshot;

pub use pair::{LedgerEntry, MigrationPair};
pub use snapshot::{generate_snapshot_name, Snapshot, SnapshotMember};
