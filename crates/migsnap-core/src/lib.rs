//! migsnap core - domain kernel for migration-state snapshots
//!
//! This crate provides the storage-agnostic pieces of migsnap:
//! - Snapshot and member models with content-identity comparison
//! - The fingerprint engine over (unit, version) pair sets
//! - The canonical error facility shared by store and engine
//! - The executor seam through which schema transitions are delegated
//! - Settings loading and the structured logging facility

pub mod errors;
pub mod executor;
pub mod fingerprint;
pub mod logging_facility;
pub mod model;
pub mod settings;

// Re-export commonly used types
pub use errors::{ExError, ExErrorKind, Result, SnapshotError};
pub use executor::{ExecutorError, MigrationExecutor, RejectingExecutor};
pub use fingerprint::{fingerprint, EMPTY_FINGERPRINT};
pub use model::{LedgerEntry, MigrationPair, Snapshot, SnapshotMember};
pub use settings::Settings;
