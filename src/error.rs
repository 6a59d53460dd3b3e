//! Unified error types for Tenantry.
//!
//! This module provides a clean error type that wraps internal errors
//! and presents a consistent interface to users.

use thiserror::Error;

/// All Tenantry errors.
///
/// Negative answers (identifier taken, tenant missing, lost race) are not
/// errors; the store reports them as `false` / `None`.
#[derive(Debug, Error)]
pub enum Error {
    /// Required input missing or malformed
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Version conflict that could not be reported as a negative result
    #[error("conflict: {0}")]
    Conflict(String),

    /// The document store could not be reached
    ///
    /// The failed call may or may not have been applied.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The caller and the unit of work disagree about the tenant's state
    #[error("inconsistent state: {0}")]
    InconsistentState(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Internal error (bug or invariant violation)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for Tenantry operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is retryable.
    ///
    /// Conflicts may succeed with fresh data; connectivity failures may
    /// succeed once the store is reachable again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Conflict(_) | Error::Unavailable(_))
    }

    /// Check if this is a conflict error.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }

    /// Check if this is a connectivity error.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::Unavailable(_))
    }

    /// Check if this error points at a programming error in the caller.
    pub fn is_serious(&self) -> bool {
        matches!(self, Error::InconsistentState(_) | Error::Internal(_))
    }
}

// Convert from internal core errors
impl From<tenantry_core::Error> for Error {
    fn from(e: tenantry_core::Error) -> Self {
        use tenantry_core::Error as CoreError;
        match e {
            CoreError::InvalidInput { message } => Error::InvalidInput(message),
            e @ CoreError::NotLoaded { .. } => Error::InconsistentState(e.to_string()),
            e @ CoreError::InconsistentChange { .. } => Error::InconsistentState(e.to_string()),
            e @ CoreError::ClusterWideModeRequired => Error::InconsistentState(e.to_string()),
            e @ CoreError::ReservationAlreadyStaged { .. } => {
                Error::InconsistentState(e.to_string())
            }
            CoreError::Conflict { reason } => Error::Conflict(reason),
            CoreError::Unavailable { operation, message } => {
                Error::Unavailable(format!("{}: {}", operation, message))
            }
            CoreError::Serialization(msg) => Error::Serialization(msg),
            CoreError::Internal(msg) => Error::Internal(msg),
        }
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
