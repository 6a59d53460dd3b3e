//! Commit manager
//!
//! Provides atomic commit by orchestrating:
//! 1. Validation (version tokens or atomic guards)
//! 2. Version allocation
//! 3. Storage application (documents and guards)
//!
//! ## Commit Sequence
//!
//! ```text
//! 1. acquire commit_lock
//! 2. validate() - check every staged write against current state
//! 3. IF conflicts: return ValidationFailed, nothing applied
//! 4. allocate commit version (one per batch)
//! 5. apply documents, then atomic guards
//! 6. release commit_lock
//! ```
//!
//! Direct compare-exchange writes take the same lock, so a reservation
//! claimed outside a commit is ordered against every commit.

use crate::batch::{CommitBatch, CommitReceipt, Expected, StagedWrite, TransactionMode};
use crate::validation::{ConflictType, ValidationResult};
use parking_lot::Mutex;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tenantry_core::Error;
use tenantry_storage::{
    atomic_guard_key, CompareExchangeTable, CompareExchangeValue, DocumentStore, DocumentWrite,
};

/// Commit failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitError {
    /// At least one precondition did not hold; nothing was applied
    ValidationFailed(ValidationResult),
    /// The commit call did not complete; it may or may not have been applied
    Unavailable {
        /// Failure detail
        message: String,
    },
}

impl fmt::Display for CommitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitError::ValidationFailed(result) => {
                write!(f, "commit validation failed: {}", result)
            }
            CommitError::Unavailable { message } => write!(f, "commit unavailable: {}", message),
        }
    }
}

impl std::error::Error for CommitError {}

impl From<CommitError> for Error {
    fn from(e: CommitError) -> Self {
        match e {
            CommitError::ValidationFailed(result) => Error::conflict(result.to_string()),
            CommitError::Unavailable { message } => Error::unavailable("commit", message),
        }
    }
}

/// Outcome of a direct compare-exchange call
#[derive(Debug, Clone, PartialEq)]
pub struct CompareExchangeResult {
    /// Whether the write or delete happened
    pub successful: bool,
    /// Entry value after the call (`None` when absent)
    pub value: Option<Value>,
    /// Entry revision after the call (0 when absent)
    pub revision: u64,
}

impl CompareExchangeResult {
    fn from_entry(successful: bool, entry: Option<CompareExchangeValue>) -> Self {
        match entry {
            Some(entry) => Self {
                successful,
                value: Some(entry.value),
                revision: entry.revision,
            },
            None => Self {
                successful,
                value: None,
                revision: 0,
            },
        }
    }
}

/// Serializes commits and direct compare-exchange writes
///
/// # Thread Safety
///
/// Validation and apply run under one lock, so no other commit can change
/// a document or guard between the check and the write.
pub struct CommitManager {
    /// Commit serialization lock
    commit_lock: Mutex<()>,
    committed: AtomicU64,
    aborted: AtomicU64,
}

impl CommitManager {
    /// Create a new commit manager
    pub fn new() -> Self {
        Self {
            commit_lock: Mutex::new(()),
            committed: AtomicU64::new(0),
            aborted: AtomicU64::new(0),
        }
    }

    /// Number of batches committed
    pub fn committed_count(&self) -> u64 {
        self.committed.load(Ordering::Relaxed)
    }

    /// Number of batches refused by validation
    pub fn aborted_count(&self) -> u64 {
        self.aborted.load(Ordering::Relaxed)
    }

    /// Run `f` with no commit in flight
    ///
    /// Used by reads that must see a document and its atomic guard from
    /// the same commit.
    pub fn consistent_read<R>(&self, f: impl FnOnce() -> R) -> R {
        let _commit_guard = self.commit_lock.lock();
        f()
    }

    /// Commit a batch atomically
    ///
    /// # Returns
    /// - Ok(receipt) when every precondition held and all writes were applied
    /// - Err(ValidationFailed) when any precondition failed; nothing applied
    pub fn commit(
        &self,
        documents: &DocumentStore,
        guards: &CompareExchangeTable,
        batch: &CommitBatch,
    ) -> Result<CommitReceipt, CommitError> {
        if batch.is_empty() {
            return Ok(CommitReceipt::default());
        }

        let _commit_guard = self.commit_lock.lock();

        let validation = validate(documents, guards, batch);
        if !validation.is_valid() {
            self.aborted.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                mode = ?batch.mode,
                conflicts = validation.conflict_count(),
                "commit refused"
            );
            return Err(CommitError::ValidationFailed(validation));
        }

        let version = documents.next_version();
        let writes: Vec<DocumentWrite> = batch.writes.iter().map(|w| w.write.clone()).collect();
        documents.apply_batch(&writes, version);
        apply_guards(guards, batch, version);

        self.committed.fetch_add(1, Ordering::Relaxed);
        let deleted = batch.writes.iter().filter(|w| w.is_delete()).count();
        let receipt = CommitReceipt {
            version,
            written: batch.writes.len() - deleted,
            deleted,
        };
        tracing::trace!(version, written = receipt.written, deleted, "commit applied");
        Ok(receipt)
    }

    /// Write a compare-exchange entry if its revision matches
    ///
    /// `expected_revision == 0` creates the entry only if it is absent.
    pub fn compare_exchange_put(
        &self,
        documents: &DocumentStore,
        table: &CompareExchangeTable,
        key: &str,
        value: Value,
        expected_revision: u64,
    ) -> CompareExchangeResult {
        let _commit_guard = self.commit_lock.lock();
        // Only consume a version when the write can happen.
        let current = table.revision(key).unwrap_or(0);
        if current != expected_revision {
            return CompareExchangeResult::from_entry(false, table.get(key));
        }
        let version = documents.next_version();
        let (successful, entry) = table.put(key, value, expected_revision, version);
        CompareExchangeResult::from_entry(successful, entry)
    }

    /// Delete a compare-exchange entry if its revision matches
    pub fn compare_exchange_delete(
        &self,
        table: &CompareExchangeTable,
        key: &str,
        expected_revision: u64,
    ) -> CompareExchangeResult {
        let _commit_guard = self.commit_lock.lock();
        let (successful, entry) = table.delete(key, expected_revision);
        CompareExchangeResult::from_entry(successful, entry)
    }
}

impl Default for CommitManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CommitManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommitManager")
            .field("committed", &self.committed_count())
            .field("aborted", &self.aborted_count())
            .finish()
    }
}

/// Check every staged write of `batch` against the current state
pub fn validate(
    documents: &DocumentStore,
    guards: &CompareExchangeTable,
    batch: &CommitBatch,
) -> ValidationResult {
    let mut result = ValidationResult::ok();
    for staged in &batch.writes {
        match batch.mode {
            TransactionMode::SingleNode => validate_version(documents, staged, &mut result),
            TransactionMode::ClusterWide => {
                validate_guard(documents, guards, staged, &mut result)
            }
        }
    }
    result
}

fn validate_version(documents: &DocumentStore, staged: &StagedWrite, result: &mut ValidationResult) {
    let actual = documents
        .get(staged.collection(), staged.id())
        .map(|doc| doc.version);
    let holds = match staged.expected {
        Expected::Any => true,
        Expected::Absent => actual.is_none(),
        Expected::Version(v) => actual == Some(v),
    };
    if !holds {
        let expected = match staged.expected {
            Expected::Version(v) => Some(v),
            _ => None,
        };
        result.push(ConflictType::DocumentVersionMismatch {
            id: staged.id().to_string(),
            expected,
            actual,
        });
    }
}

fn validate_guard(
    documents: &DocumentStore,
    guards: &CompareExchangeTable,
    staged: &StagedWrite,
    result: &mut ValidationResult,
) {
    let actual = guards.revision(&atomic_guard_key(staged.id()));
    if actual != staged.guard_revision {
        result.push(ConflictType::AtomicGuardMismatch {
            id: staged.id().to_string(),
            expected: staged.guard_revision,
            actual,
        });
        return;
    }
    if !staged.loaded
        && !staged.is_delete()
        && documents.contains(staged.collection(), staged.id())
    {
        result.push(ConflictType::DocumentAlreadyExists {
            id: staged.id().to_string(),
        });
    }
}

fn apply_guards(guards: &CompareExchangeTable, batch: &CommitBatch, version: u64) {
    for staged in &batch.writes {
        let key = atomic_guard_key(staged.id());
        match (batch.mode, staged.is_delete()) {
            (_, true) => {
                guards.remove(&key);
            }
            (TransactionMode::ClusterWide, false) => {
                guards.set(&key, Value::String(staged.id().to_string()), version);
            }
            // A single-node write of a guarded document still invalidates
            // snapshots taken by cluster-wide sessions.
            (TransactionMode::SingleNode, false) => {
                if guards.revision(&key).is_some() {
                    guards.set(&key, Value::String(staged.id().to_string()), version);
                }
            }
        }
    }
}
