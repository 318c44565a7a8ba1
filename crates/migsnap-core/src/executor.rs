//! Schema migration executor seam
//!
//! migsnap never transforms schema itself. A checkout hands the full target
//! set to a `MigrationExecutor`, which brings every unit to exactly the
//! requested version (forwards or backwards) and records the result in the
//! migration ledger.
//!
//! The executor is injected into the checkout service the same way for every
//! entry surface.

use crate::model::MigrationPair;
use thiserror::Error;

/// Failures an executor may report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    /// A requested migration is not registered for its unit
    #[error("unknown migration: {detail}")]
    UnknownMigration { detail: String },

    /// A named node cannot be resolved in the executor's migration graph
    #[error("{0}")]
    NodeNotFound(String),

    /// Any other executor failure
    #[error("executor failed: {0}")]
    Failed(String),
}

/// Brings the schema to exactly the given (unit, version) targets.
pub trait MigrationExecutor {
    /// Migrate every unit in `targets` to its listed version.
    ///
    /// # Errors
    ///
    /// Returns an `ExecutorError` describing why the transition failed; the
    /// schema is expected to be left as the executor found it.
    fn migrate(&self, targets: &[MigrationPair]) -> Result<(), ExecutorError>;
}

/// Executor that refuses every transition.
///
/// Default when no executor is configured, so a checkout can never report
/// success without schema actually moving.
///
/// # Example
/// ```
/// use migsnap_core::executor::{MigrationExecutor, RejectingExecutor};
/// use migsnap_core::model::MigrationPair;
///
/// let result = RejectingExecutor.migrate(&[MigrationPair::new("app1", "0001")]);
/// assert!(result.is_err());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectingExecutor;

impl MigrationExecutor for RejectingExecutor {
    fn migrate(&self, _targets: &[MigrationPair]) -> Result<(), ExecutorError> {
        Err(ExecutorError::Failed(
            "no migration executor configured".to_string(),
        ))
    }
}

impl<T: MigrationExecutor + ?Sized> MigrationExecutor for &T {
    fn migrate(&self, targets: &[MigrationPair]) -> Result<(), ExecutorError> {
        (**self).migrate(targets)
    }
}
