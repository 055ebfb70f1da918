//! Error types for strata-engine

use strata_core::CoreError;
use strata_db::DbError;
use thiserror::Error;

/// Migration engine error taxonomy.
///
/// `DependencyCycle` surfaces through the wrapped [`CoreError`]; everything
/// the executor, verifier, and versioned entity manager can raise carries
/// the unit or entity it concerns.
#[derive(Error, Debug)]
pub enum EngineError {
    /// M001: An applied unit's content diverged from its recorded checksum
    #[error("[M001] Checksum mismatch for applied unit '{unit}': recorded {recorded}, current {current}")]
    ChecksumMismatch {
        unit: String,
        recorded: String,
        current: String,
    },

    /// M002: A precondition probe itself failed
    #[error("[M002] Precondition probe failed for {operation} in unit '{unit}': {source}")]
    PreconditionAmbiguous {
        unit: String,
        operation: String,
        source: DbError,
    },

    /// M003: A constraint was violated while applying an operation
    #[error("[M003] Constraint violation in unit '{unit}' ({operation}): {message}")]
    ConstraintViolation {
        unit: String,
        operation: String,
        message: String,
        /// Violating row count, when obtainable
        violating_rows: Option<usize>,
    },

    /// M004: A tenant-scoped table is reachable without an isolation guard
    #[error("[M004] Isolation gap on table '{table}': {reason}")]
    IsolationGap { table: String, reason: String },

    /// M005: An operation exceeded the statement timeout
    #[error("[M005] Operation timed out after {timeout_ms}ms in unit '{unit}' ({operation})")]
    TimeoutExceeded {
        unit: String,
        operation: String,
        timeout_ms: u64,
    },

    /// M006: Write attempted against a locked version
    #[error("[M006] Version {version} of entity {id} is locked and immutable")]
    ImmutableVersion { id: String, version: i64 },

    /// M007: Concurrent fork race lost; caller should re-read the head
    #[error("[M007] Version conflict on chain {root}: version {version} is no longer the head")]
    VersionConflict { root: String, version: i64 },

    /// M008: Another migration run holds the schema lock
    #[error("[M008] Another migration run holds the schema lock (held by {owner})")]
    LockHeld { owner: String },

    /// M009: An operation failed; the unit was rolled back
    #[error("[M009] Unit '{unit}' failed at {operation}: {source}")]
    UnitFailed {
        unit: String,
        operation: String,
        source: DbError,
    },

    /// M010: Versioned entity row not found (or not visible to the caller)
    #[error("[M010] Entity {id} not found in {table}")]
    EntityNotFound { table: String, id: String },

    /// M011: Versioned entity operation against the wrong state
    #[error("[M011] Invalid entity state: {message}")]
    InvalidEntityState { message: String },

    /// Core error (catalog, config, dependency resolution)
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Database error outside a unit's operations
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Result type alias for EngineError
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Whether the caller can recover by retrying (vs. operator intervention).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EngineError::VersionConflict { .. })
    }
}
