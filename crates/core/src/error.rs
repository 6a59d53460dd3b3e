//! Internal error type shared by all tenantry crates
//!
//! Expected negative results (identifier taken, record missing, lost race)
//! are not errors; they travel as [`crate::Outcome`]. This type carries the
//! cases the caller cannot treat as an ordinary answer:
//!
//! | Variant | Meaning |
//! |---------|---------|
//! | InvalidInput | Caller-fixable validation failure |
//! | NotLoaded | Update attempted without a tracked snapshot |
//! | InconsistentChange | Caller value disagrees with the change tracker |
//! | ClusterWideModeRequired | Shadow reservation staged outside cluster-wide mode |
//! | ReservationAlreadyStaged | Same reservation staged twice in one unit of work |
//! | Conflict | Version token or atomic guard mismatch at commit |
//! | Unavailable | Store call failed (connectivity, timeout) |
//! | Serialization | Document body could not be (de)serialized |
//! | Internal | Invariant violation |

use thiserror::Error;

/// Result type for tenantry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the store, the reservation protocol and the coordinator
#[derive(Debug, Error)]
pub enum Error {
    /// Required input missing or malformed
    #[error("invalid input: {message}")]
    InvalidInput {
        /// What was wrong with the input
        message: String,
    },

    /// Document must already be tracked by the unit of work
    #[error("document '{id}' is expected to be loaded in the session")]
    NotLoaded {
        /// Document id
        id: String,
    },

    /// Caller asserted a field value the change tracker did not record
    #[error(
        "{field} value '{asserted}' on '{id}' does not match the change tracker's recorded value '{tracked}'"
    )]
    InconsistentChange {
        /// Document id
        id: String,
        /// Field name
        field: String,
        /// Value the caller presented
        asserted: String,
        /// Value the tracker recorded
        tracked: String,
    },

    /// Operation needs the session in cluster-wide transaction mode
    #[error("cluster-wide transaction mode required")]
    ClusterWideModeRequired,

    /// A reservation document was staged twice in one unit of work
    #[error("reservation '{id}' was already added to the unit of work")]
    ReservationAlreadyStaged {
        /// Reservation document id
        id: String,
    },

    /// Concurrency conflict detected at commit
    #[error("conflict: {reason}")]
    Conflict {
        /// Human-readable description of the conflict(s)
        reason: String,
    },

    /// Store operation failed to complete
    #[error("store unavailable during {operation}: {message}")]
    Unavailable {
        /// Operation that failed
        operation: String,
        /// Failure detail
        message: String,
    },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Internal error (bug or invariant violation)
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for [`Error::InvalidInput`]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Error::InvalidInput {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::Conflict`]
    pub fn conflict(reason: impl Into<String>) -> Self {
        Error::Conflict {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`Error::Unavailable`]
    pub fn unavailable(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Unavailable {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Check if this is a concurrency conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }

    /// Check if the store could not be reached
    ///
    /// The outcome of the failed call is unknown: it may or may not have
    /// been applied.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::Unavailable { .. })
    }

    /// Check if this error signals a programming error in the caller
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::NotLoaded { .. }
                | Error::InconsistentChange { .. }
                | Error::ClusterWideModeRequired
                | Error::ReservationAlreadyStaged { .. }
                | Error::Internal(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
