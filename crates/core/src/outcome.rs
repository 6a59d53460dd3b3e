//! Operation outcomes
//!
//! Not-unique, not-found and lost races are frequent, expected answers.
//! They are returned as values, never raised as errors.

use serde::{Deserialize, Serialize};

/// Result of a coordinator operation that completed normally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Record and reservation were committed together
    Success,
    /// The unique value is already claimed by another record
    NotUnique,
    /// The record does not exist
    NotFound,
    /// Another writer modified the record first
    Conflict,
}

impl Outcome {
    /// Check if the operation took effect
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    /// Short identifier (for logging)
    pub const fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::NotUnique => "not_unique",
            Outcome::NotFound => "not_found",
            Outcome::Conflict => "conflict",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
