//! Commit-time validation results

use std::fmt;

/// Why a staged write was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictType {
    /// The document's version token differs from the one the write expected
    DocumentVersionMismatch {
        /// Document id
        id: String,
        /// Version the write was staged against (`None` = must be absent)
        expected: Option<u64>,
        /// Version found in the store (`None` = absent)
        actual: Option<u64>,
    },
    /// A cluster-wide insert hit an existing document
    DocumentAlreadyExists {
        /// Document id
        id: String,
    },
    /// The document's atomic guard moved since it was loaded
    AtomicGuardMismatch {
        /// Document id
        id: String,
        /// Guard revision observed at load
        expected: Option<u64>,
        /// Guard revision at commit
        actual: Option<u64>,
    },
}

impl ConflictType {
    /// Id of the conflicting document
    pub fn document_id(&self) -> &str {
        match self {
            ConflictType::DocumentVersionMismatch { id, .. }
            | ConflictType::DocumentAlreadyExists { id }
            | ConflictType::AtomicGuardMismatch { id, .. } => id,
        }
    }
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictType::DocumentVersionMismatch {
                id,
                expected,
                actual,
            } => write!(
                f,
                "document '{}' version mismatch (expected {:?}, found {:?})",
                id, expected, actual
            ),
            ConflictType::DocumentAlreadyExists { id } => {
                write!(f, "document '{}' already exists", id)
            }
            ConflictType::AtomicGuardMismatch {
                id,
                expected,
                actual,
            } => write!(
                f,
                "atomic guard of '{}' changed (expected {:?}, found {:?})",
                id, expected, actual
            ),
        }
    }
}

/// Outcome of validating a commit batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    /// Every conflict found; empty means the batch may be applied
    pub conflicts: Vec<ConflictType>,
}

impl ValidationResult {
    /// A passing result
    pub fn ok() -> Self {
        Self::default()
    }

    /// Record a conflict
    pub fn push(&mut self, conflict: ConflictType) {
        self.conflicts.push(conflict);
    }

    /// Whether the batch may be applied
    pub fn is_valid(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Number of conflicts
    pub fn conflict_count(&self) -> usize {
        self.conflicts.len()
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.conflicts.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join("; "))
    }
}
