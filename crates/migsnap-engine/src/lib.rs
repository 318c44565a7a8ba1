//! migsnap engine - orchestration layer
//!
//! Coordinates the ledger reader, the snapshot store and the migration
//! executor into the user-level operations: create a snapshot, check one
//! out, delete snapshots, and the administrative command surface that
//! dispatches to them.

pub mod commands;

pub use commands::checkout::{checkout, CheckoutOutcome, CheckoutReport, DriftReport};
pub use commands::create::{create_snapshot, CreateOptions, CreationResult};
pub use commands::engine_command::{apply_engine_command, EngineCommand, EngineCommandResult};
