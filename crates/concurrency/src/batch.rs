//! Commit batches
//!
//! A session turns its pending changes into a [`CommitBatch`]: one
//! [`StagedWrite`] per document, each carrying the precondition the commit
//! manager must check before anything is applied.

use tenantry_storage::DocumentWrite;

/// Consistency scope of a unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionMode {
    /// Per-document optimistic checks via version tokens
    #[default]
    SingleNode,
    /// Every written document is protected by its atomic guard
    ClusterWide,
}

/// Version precondition of a single-node write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expected {
    /// No precondition
    #[default]
    Any,
    /// The document must not exist
    Absent,
    /// The document must exist with exactly this version
    Version(u64),
}

/// A document write together with its preconditions
#[derive(Debug, Clone)]
pub struct StagedWrite {
    /// The write itself
    pub write: DocumentWrite,
    /// Single-node precondition
    pub expected: Expected,
    /// Atomic guard revision observed when the document was loaded
    pub guard_revision: Option<u64>,
    /// Whether the session loaded this document from the store
    pub loaded: bool,
}

impl StagedWrite {
    /// Id of the written document
    pub fn id(&self) -> &str {
        match &self.write {
            DocumentWrite::Put { id, .. } | DocumentWrite::Delete { id, .. } => id,
        }
    }

    /// Collection of the written document
    pub fn collection(&self) -> &str {
        match &self.write {
            DocumentWrite::Put { collection, .. } | DocumentWrite::Delete { collection, .. } => {
                collection
            }
        }
    }

    /// Whether this write removes the document
    pub fn is_delete(&self) -> bool {
        matches!(self.write, DocumentWrite::Delete { .. })
    }
}

/// Everything one unit of work commits
#[derive(Debug, Clone, Default)]
pub struct CommitBatch {
    /// Consistency scope
    pub mode: TransactionMode,
    /// Staged writes, at most one per document
    pub writes: Vec<StagedWrite>,
}

impl CommitBatch {
    /// Check if there is nothing to commit
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Result of a successful commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommitReceipt {
    /// Version stamped on every written document (0 when nothing was written)
    pub version: u64,
    /// Number of documents inserted or replaced
    pub written: usize,
    /// Number of documents deleted
    pub deleted: usize,
}
