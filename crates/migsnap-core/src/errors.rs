use crate::model::MigrationPair;
use thiserror::Error;

/// Result type alias using the canonical error
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every failure surfaced by migsnap maps to exactly one kind, and each kind
/// maps to a stable code usable by callers, tests and exit-code translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Snapshot lifecycle
    /// A snapshot with the requested name exists and overwrite was not allowed
    DuplicateName,
    NotFound,
    /// Attempt to delete the currently applied snapshot
    Conflict,

    // Checkout protocol
    /// No applied snapshot exists to act as a baseline
    NoBaseline,
    /// Live ledger drifted from the baseline and the caller did not force
    InconsistentState,
    /// Checkout target has no recorded members
    EmptyTarget,

    // Executor
    /// The executor does not know one of the requested migrations
    MissingMigration,
    /// The executor could not resolve a node in its migration graph
    UnresolvableTarget,
    ExternalService,

    // Administrative surface
    Forbidden,
    Cancelled,
    /// Caller-supplied value rejected before any storage access
    InvalidInput,

    // Integrity
    /// Storage holds a state the invariants forbid (e.g. two applied snapshots)
    InvariantViolation,

    // Integration/IO
    Io,
    Persistence,
    Config,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::DuplicateName => "ERR_DUPLICATE_NAME",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::Conflict => "ERR_CONFLICT",
            ExErrorKind::NoBaseline => "ERR_NO_BASELINE",
            ExErrorKind::InconsistentState => "ERR_INCONSISTENT_STATE",
            ExErrorKind::EmptyTarget => "ERR_EMPTY_TARGET",
            ExErrorKind::MissingMigration => "ERR_MISSING_MIGRATION",
            ExErrorKind::UnresolvableTarget => "ERR_UNRESOLVABLE_TARGET",
            ExErrorKind::ExternalService => "ERR_EXTERNAL_SERVICE",
            ExErrorKind::Forbidden => "ERR_FORBIDDEN",
            ExErrorKind::Cancelled => "ERR_CANCELLED",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::InvariantViolation => "ERR_INVARIANT_VIOLATION",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Config => "ERR_CONFIG",
        }
    }

    /// Whether an operator can act on this error (re-prompt, force, pick
    /// another target) as opposed to a storage or integrity fault.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            ExErrorKind::DuplicateName
                | ExErrorKind::NotFound
                | ExErrorKind::Conflict
                | ExErrorKind::NoBaseline
                | ExErrorKind::InconsistentState
                | ExErrorKind::EmptyTarget
                | ExErrorKind::MissingMigration
                | ExErrorKind::UnresolvableTarget
                | ExErrorKind::Forbidden
                | ExErrorKind::Cancelled
                | ExErrorKind::InvalidInput
        )
    }
}

/// Canonical structured error type
///
/// Carries a kind for programmatic handling plus optional context: the
/// operation, the entity (usually a snapshot name) and, for executor
/// failures, the full list of requested (unit, version) targets.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    message: String,
    targets: Option<Vec<MigrationPair>>,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            message: String::new(),
            targets: None,
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attach the migration targets that were requested when this failed
    pub fn with_targets(mut self, targets: Vec<MigrationPair>) -> Self {
        self.targets = Some(targets);
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the entity ID context, if any
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Requested targets, populated on executor failures
    pub fn targets(&self) -> Option<&[MigrationPair]> {
        self.targets.as_deref()
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(source) = &self.source {
            write!(f, " caused by {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain failures of the snapshot and checkout protocol
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SnapshotError {
    /// Name collision without overwrite permission
    #[error("Snapshot with given name {name} already exists")]
    DuplicateName { name: String },

    #[error("Snapshot with name \"{name}\" doesn't exist")]
    SnapshotNotFound { name: String },

    /// Snapshot names must contain a non-whitespace character
    #[error("Snapshot name {name:?} is blank")]
    InvalidName { name: String },

    /// The applied snapshot cannot be deleted
    #[error("Snapshot with name {name} is applied and couldn't be deleted")]
    AppliedSnapshotDelete { name: String },

    #[error("No applied snapshot present")]
    NoBaseline,

    /// Live ledger no longer matches the baseline snapshot
    #[error(
        "Migration state is inconsistent: applied snapshot \"{baseline}\" does not hold all \
         currently applied migrations. Use force to checkout anyway"
    )]
    InconsistentState {
        baseline: String,
        baseline_fingerprint: String,
        live_fingerprint: String,
    },

    #[error("No connected migrations found for snapshot {name}")]
    EmptyTarget { name: String },

    /// Executor reported a migration it does not know
    #[error("Some migrations are missing for snapshot \"{snapshot}\"")]
    MissingMigration {
        snapshot: String,
        requested: Vec<MigrationPair>,
    },

    /// Executor graph could not resolve a target; message is the executor's
    #[error("{message}")]
    UnresolvableTarget {
        snapshot: String,
        message: String,
        requested: Vec<MigrationPair>,
    },

    /// More than one snapshot row is flagged applied
    #[error("Found {count} applied snapshots; at most one is allowed")]
    MultipleApplied { count: i64 },

    #[error("Snapshot administrative actions are disabled: {op}")]
    AdminActionsDisabled { op: String },

    #[error("Operation cancelled: {op}")]
    Cancelled { op: String },
}

/// Render requested targets the way operators read them in a terminal.
fn describe_targets(targets: &[MigrationPair]) -> String {
    targets
        .iter()
        .map(|p| format!("* Unit: {} ; Migration: {}", p.unit, p.version))
        .collect::<Vec<_>>()
        .join("\n")
}

impl From<SnapshotError> for ExError {
    fn from(err: SnapshotError) -> Self {
        match err {
            SnapshotError::DuplicateName { name } => ExError::new(ExErrorKind::DuplicateName)
                .with_entity_id(name.clone())
                .with_message(format!("Snapshot with given name {} already exists", name)),

            SnapshotError::SnapshotNotFound { name } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(name.clone())
                .with_message(format!("Snapshot with name \"{}\" doesn't exist", name)),

            SnapshotError::InvalidName { name } => ExError::new(ExErrorKind::InvalidInput)
                .with_entity_id(name)
                .with_message("Snapshot name must not be blank"),

            SnapshotError::AppliedSnapshotDelete { name } => ExError::new(ExErrorKind::Conflict)
                .with_entity_id(name.clone())
                .with_message(format!(
                    "Snapshot with name {} is applied and couldn't be deleted",
                    name
                )),

            SnapshotError::NoBaseline => ExError::new(ExErrorKind::NoBaseline)
                .with_message("No applied snapshot present; create a snapshot first"),

            SnapshotError::InconsistentState {
                baseline,
                baseline_fingerprint,
                live_fingerprint,
            } => ExError::new(ExErrorKind::InconsistentState)
                .with_entity_id(baseline)
                .with_message(format!(
                    "Migration state is inconsistent: latest applied snapshot does not hold \
                     all currently applied migrations (snapshot {}, ledger {}). \
                     Use force to checkout anyway",
                    baseline_fingerprint, live_fingerprint
                )),

            SnapshotError::EmptyTarget { name } => ExError::new(ExErrorKind::EmptyTarget)
                .with_entity_id(name.clone())
                .with_message(format!(
                    "No connected migrations found for snapshot {}",
                    name
                )),

            SnapshotError::MissingMigration {
                snapshot,
                requested,
            } => ExError::new(ExErrorKind::MissingMigration)
                .with_entity_id(snapshot.clone())
                .with_message(format!(
                    "Some migrations are missing. Make sure all migrations in snapshot \
                     \"{}\" are present in their units:\n{}",
                    snapshot,
                    describe_targets(&requested)
                ))
                .with_targets(requested),

            SnapshotError::UnresolvableTarget {
                snapshot,
                message,
                requested,
            } => ExError::new(ExErrorKind::UnresolvableTarget)
                .with_entity_id(snapshot)
                .with_message(message)
                .with_targets(requested),

            SnapshotError::MultipleApplied { count } => {
                ExError::new(ExErrorKind::InvariantViolation).with_message(format!(
                    "Found {} applied snapshots; at most one is allowed",
                    count
                ))
            }

            SnapshotError::AdminActionsDisabled { op } => ExError::new(ExErrorKind::Forbidden)
                .with_op(op)
                .with_message("Snapshot administrative actions are disabled"),

            SnapshotError::Cancelled { op } => ExError::new(ExErrorKind::Cancelled)
                .with_op(op)
                .with_message("Operation cancelled; nothing was changed"),
        }
    }
}
