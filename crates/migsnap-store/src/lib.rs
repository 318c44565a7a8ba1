//! migsnap store - SQLite persistence for migration-state snapshots
//!
//! Provides:
//! - Embedded schema migrations with checksums, recorded in the ledger
//! - The ledger reader ("latest applied version per unit")
//! - The snapshot store: snapshots, members and the single-applied invariant

pub mod db;
pub mod errors;
pub mod ledger;
pub mod migrations;
pub mod snapshot;

// Re-export key types
pub use errors::Result;
