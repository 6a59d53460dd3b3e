//! Unit of work
//!
//! A [`Session`] tracks every document it loads or stores in an identity
//! map and writes all pending changes in one atomic commit on
//! [`Session::save_changes`].
//!
//! Loading a tracked id returns the tracked copy without a round trip, so
//! a long-lived session may hold a stale snapshot; the commit-time checks
//! (version tokens or atomic guards) are what catch it.
//!
//! Sessions are single-threaded. Open one per request or per worker.

use crate::batch::{CommitBatch, CommitReceipt, Expected, StagedWrite, TransactionMode};
use crate::changes::{diff_fields, ChangeType, DocumentChange, WhatChanged};
use crate::database::{Database, LoadedDocument};
use serde_json::Value;
use std::collections::BTreeMap;
use tenantry_core::{Document, Error, Result};
use tenantry_storage::DocumentWrite;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryState {
    Loaded,
    Modified,
    New,
    Deleted,
}

#[derive(Debug, Clone)]
struct TrackedDocument {
    collection: String,
    /// Body as read from the store (`None` when never loaded)
    original: Option<Value>,
    current: Value,
    loaded_version: Option<u64>,
    guard_revision: Option<u64>,
    state: EntryState,
    /// Explicit precondition set by `store_with`
    expected: Option<Expected>,
}

impl TrackedDocument {
    fn from_store(collection: &str, loaded: LoadedDocument) -> Self {
        Self {
            collection: collection.to_string(),
            original: Some(loaded.document.body.clone()),
            current: loaded.document.body,
            loaded_version: Some(loaded.document.version),
            guard_revision: loaded.guard_revision,
            state: EntryState::Loaded,
            expected: None,
        }
    }

    fn is_pending(&self) -> bool {
        self.state != EntryState::Loaded
    }
}

/// Unit of work over a [`Database`]
pub struct Session {
    db: Database,
    mode: TransactionMode,
    use_optimistic_concurrency: bool,
    tracked: BTreeMap<String, TrackedDocument>,
}

impl Session {
    pub(crate) fn new(db: Database) -> Self {
        Self {
            db,
            mode: TransactionMode::SingleNode,
            use_optimistic_concurrency: false,
            tracked: BTreeMap::new(),
        }
    }

    /// Database this session writes to
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Current transaction mode
    pub fn transaction_mode(&self) -> TransactionMode {
        self.mode
    }

    /// Switch transaction mode for the next commit
    pub fn set_transaction_mode(&mut self, mode: TransactionMode) {
        self.mode = mode;
    }

    /// Whether single-node commits check version tokens
    pub fn use_optimistic_concurrency(&self) -> bool {
        self.use_optimistic_concurrency
    }

    /// Enable or disable version-token checks for single-node commits
    ///
    /// Ignored in cluster-wide mode, where atomic guards take over.
    pub fn set_use_optimistic_concurrency(&mut self, enabled: bool) {
        self.use_optimistic_concurrency = enabled;
    }

    /// Load a document, returning the tracked copy if there is one
    pub fn load<T: Document>(&mut self, id: &str) -> Result<Option<T>> {
        if let Some(entry) = self.tracked.get(id) {
            if entry.state == EntryState::Deleted || entry.collection != T::COLLECTION {
                return Ok(None);
            }
            return Ok(Some(serde_json::from_value(entry.current.clone())?));
        }

        let loaded = match self.db.load_document(T::COLLECTION, id)? {
            Some(loaded) => loaded,
            None => return Ok(None),
        };
        let entity: T = serde_json::from_value(loaded.document.body.clone())?;
        tracing::trace!(id, version = loaded.document.version, "document loaded");
        self.tracked
            .insert(id.to_string(), TrackedDocument::from_store(T::COLLECTION, loaded));
        Ok(Some(entity))
    }

    /// Check whether a document exists in the store (ignores pending changes)
    pub fn exists(&self, collection: &str, id: &str) -> Result<bool> {
        self.db.document_exists(collection, id)
    }

    /// Whether the session tracks `id` as a live document
    pub fn is_loaded(&self, id: &str) -> bool {
        self.tracked
            .get(id)
            .map(|e| e.state != EntryState::Deleted)
            .unwrap_or(false)
    }

    /// Whether `id` is staged as an insert that was never committed
    pub fn is_new(&self, id: &str) -> bool {
        self.tracked
            .get(id)
            .map(|e| e.state == EntryState::New)
            .unwrap_or(false)
    }

    /// Version token recorded when `id` was loaded or last committed
    pub fn version_for(&self, id: &str) -> Option<u64> {
        self.tracked.get(id).and_then(|e| e.loaded_version)
    }

    /// Stage an insert or update
    ///
    /// Assigns `<collection prefix>/<uuid>` when the entity has no id.
    pub fn store<T: Document>(&mut self, entity: &mut T) -> Result<()> {
        self.store_inner(entity, None)
    }

    /// Stage an insert or update with an explicit version precondition
    pub fn store_with<T: Document>(&mut self, entity: &mut T, expected: Expected) -> Result<()> {
        self.store_inner(entity, Some(expected))
    }

    fn store_inner<T: Document>(&mut self, entity: &mut T, expected: Option<Expected>) -> Result<()> {
        if entity.id().is_empty() {
            let conventions = self.db.conventions();
            let prefix = conventions.collection_prefix(T::COLLECTION);
            let suffix = Uuid::new_v4().to_string();
            entity.set_id(conventions.document_id(&[&prefix, &suffix]));
        }
        let id = entity.id().to_string();
        let body = serde_json::to_value(&*entity)?;

        match self.tracked.get_mut(&id) {
            Some(entry) => {
                if entry.state == EntryState::Deleted {
                    return Err(Error::invalid_input(format!(
                        "document '{}' was deleted in this session",
                        id
                    )));
                }
                if entry.collection != T::COLLECTION {
                    return Err(Error::invalid_input(format!(
                        "document '{}' belongs to collection '{}'",
                        id, entry.collection
                    )));
                }
                if expected.is_some() {
                    entry.expected = expected;
                }
                if entry.state != EntryState::New {
                    let unchanged = entry.original.as_ref() == Some(&body);
                    entry.state = if unchanged && entry.expected.is_none() {
                        EntryState::Loaded
                    } else {
                        EntryState::Modified
                    };
                }
                entry.current = body;
            }
            None => {
                self.tracked.insert(
                    id,
                    TrackedDocument {
                        collection: T::COLLECTION.to_string(),
                        original: None,
                        current: body,
                        loaded_version: None,
                        guard_revision: None,
                        state: EntryState::New,
                        expected,
                    },
                );
            }
        }
        Ok(())
    }

    /// Stage a delete
    ///
    /// Deleting a document stored (but never committed) in this session
    /// simply forgets it.
    pub fn delete<T: Document>(&mut self, id: &str) -> Result<()> {
        if id.is_empty() {
            return Err(Error::invalid_input("document id must not be empty"));
        }
        match self.tracked.get(id).map(|e| e.state) {
            Some(EntryState::New) => {
                self.tracked.remove(id);
            }
            Some(_) => {
                if let Some(entry) = self.tracked.get_mut(id) {
                    entry.state = EntryState::Deleted;
                }
            }
            None => {
                self.tracked.insert(
                    id.to_string(),
                    TrackedDocument {
                        collection: T::COLLECTION.to_string(),
                        original: None,
                        current: Value::Null,
                        loaded_version: None,
                        guard_revision: None,
                        state: EntryState::Deleted,
                        expected: None,
                    },
                );
            }
        }
        Ok(())
    }

    /// Whether anything would be written on commit
    pub fn has_changes(&self) -> bool {
        self.tracked.values().any(TrackedDocument::is_pending)
    }

    /// Pending changes per document id
    pub fn what_changed(&self) -> WhatChanged {
        let mut changes = BTreeMap::new();
        for (id, entry) in &self.tracked {
            let list = match entry.state {
                EntryState::Loaded => continue,
                EntryState::Modified => {
                    let original = entry.original.as_ref().unwrap_or(&Value::Null);
                    let diff = diff_fields(original, &entry.current);
                    if diff.is_empty() {
                        continue;
                    }
                    diff
                }
                EntryState::New => vec![DocumentChange {
                    change: ChangeType::DocumentAdded,
                    field_name: None,
                    old_value: Value::Null,
                    new_value: entry.current.clone(),
                }],
                EntryState::Deleted => vec![DocumentChange {
                    change: ChangeType::DocumentDeleted,
                    field_name: None,
                    old_value: entry.original.clone().unwrap_or(Value::Null),
                    new_value: Value::Null,
                }],
            };
            changes.insert(id.clone(), list);
        }
        changes
    }

    fn implicit_expected(&self, entry: &TrackedDocument) -> Expected {
        if !self.use_optimistic_concurrency {
            return Expected::Any;
        }
        match (entry.state, entry.loaded_version) {
            (EntryState::New, _) => Expected::Absent,
            (_, Some(version)) => Expected::Version(version),
            (_, None) => Expected::Any,
        }
    }

    fn build_batch(&self) -> CommitBatch {
        let mut writes = Vec::new();
        for (id, entry) in &self.tracked {
            let write = match entry.state {
                EntryState::Loaded => continue,
                EntryState::New | EntryState::Modified => DocumentWrite::Put {
                    collection: entry.collection.clone(),
                    id: id.clone(),
                    body: entry.current.clone(),
                },
                EntryState::Deleted => DocumentWrite::Delete {
                    collection: entry.collection.clone(),
                    id: id.clone(),
                },
            };
            writes.push(StagedWrite {
                write,
                expected: entry
                    .expected
                    .unwrap_or_else(|| self.implicit_expected(entry)),
                guard_revision: entry.guard_revision,
                loaded: entry.loaded_version.is_some(),
            });
        }
        CommitBatch {
            mode: self.mode,
            writes,
        }
    }

    /// Commit every pending change atomically
    ///
    /// On failure nothing is cleared; call [`Session::discard_pending`] to
    /// roll the session back to its loaded state.
    pub fn save_changes(&mut self) -> Result<CommitReceipt> {
        let batch = self.build_batch();
        if batch.is_empty() {
            return Ok(CommitReceipt::default());
        }
        let receipt = self.db.commit(&batch).map_err(Error::from)?;
        tracing::debug!(
            mode = ?self.mode,
            version = receipt.version,
            written = receipt.written,
            deleted = receipt.deleted,
            "session changes saved"
        );
        self.mark_committed(receipt.version);
        Ok(receipt)
    }

    fn mark_committed(&mut self, version: u64) {
        let guarded = self.mode == TransactionMode::ClusterWide;
        self.tracked.retain(|_, e| e.state != EntryState::Deleted);
        for entry in self.tracked.values_mut() {
            if matches!(entry.state, EntryState::New | EntryState::Modified) {
                entry.original = Some(entry.current.clone());
                entry.loaded_version = Some(version);
                if guarded || entry.guard_revision.is_some() {
                    entry.guard_revision = Some(version);
                }
                entry.state = EntryState::Loaded;
                entry.expected = None;
            }
        }
    }

    /// Drop every pending change, keeping loaded snapshots
    pub fn discard_pending(&mut self) {
        self.tracked.retain(|_, e| match e.state {
            EntryState::New => false,
            EntryState::Deleted => e.original.is_some(),
            _ => true,
        });
        for entry in self.tracked.values_mut() {
            if entry.is_pending() {
                if let Some(original) = &entry.original {
                    entry.current = original.clone();
                }
                entry.state = EntryState::Loaded;
                entry.expected = None;
            }
        }
    }

    /// Stop tracking `id`
    pub fn evict(&mut self, id: &str) {
        self.tracked.remove(id);
    }

    /// Stop tracking everything
    pub fn clear(&mut self) {
        self.tracked.clear();
    }

    /// Every document of `T`'s collection, sorted by id, tracked
    pub fn query<T: Document>(&mut self) -> Result<Vec<T>> {
        let docs = self.db.query_all(T::COLLECTION)?;
        self.materialize(docs)
    }

    /// One page of `T`'s collection plus the collection size, tracked
    pub fn query_page<T: Document>(&mut self, skip: usize, take: usize) -> Result<(usize, Vec<T>)> {
        let (total, docs) = self.db.query_page(T::COLLECTION, skip, take)?;
        Ok((total, self.materialize(docs)?))
    }

    /// Every document of `T`'s collection without tracking them
    pub fn stream<T: Document>(&self) -> Result<Vec<T>> {
        self.db
            .query_all(T::COLLECTION)?
            .into_iter()
            .map(|loaded| Ok(serde_json::from_value(loaded.document.body)?))
            .collect()
    }

    fn materialize<T: Document>(&mut self, docs: Vec<LoadedDocument>) -> Result<Vec<T>> {
        let mut entities = Vec::with_capacity(docs.len());
        for loaded in docs {
            match self.tracked.get(&loaded.id) {
                Some(entry) if entry.state == EntryState::Deleted => {}
                Some(entry) => entities.push(serde_json::from_value(entry.current.clone())?),
                None => {
                    entities.push(serde_json::from_value(loaded.document.body.clone())?);
                    self.tracked.insert(
                        loaded.id.clone(),
                        TrackedDocument::from_store(T::COLLECTION, loaded),
                    );
                }
            }
        }
        Ok(entities)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("mode", &self.mode)
            .field("use_optimistic_concurrency", &self.use_optimistic_concurrency)
            .field("tracked", &self.tracked.len())
            .finish()
    }
}
