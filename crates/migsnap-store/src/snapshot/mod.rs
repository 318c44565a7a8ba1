//! Snapshot store.
//!
//! Persistence and invariants for snapshots and their members:
//!
//! - names are unique (`UNIQUE` column)
//! - at most one snapshot is applied (partial unique index, re-checked in
//!   every transaction that flips the flag)
//! - members are written and replaced only as a whole set
//! - the applied snapshot cannot be deleted individually
//!
//! ## Non-Responsibilities
//!
//! - Deciding when to snapshot or check out (handled by `migsnap-engine`)
//! - Reading the migration ledger (see [`crate::ledger`])

pub mod persist;
pub mod query;

// Re-export primary operations
pub use persist::{
    create_snapshot, delete_all, delete_snapshot, replace_members, set_applied_exclusive,
};
pub use query::{
    exists_by_name, find_by_name, get_applied, get_by_name, get_latest_by_id, list_snapshots,
    SnapshotSummary,
};
