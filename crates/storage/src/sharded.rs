//! Sharded document storage
//!
//! DashMap of collection name to an FxHashMap of documents.
//! Lock-free reads, sharded writes, O(1) lookups.
//!
//! # Design
//!
//! - DashMap: sharded by collection, lock-free reads
//! - FxHashMap: O(1) lookups by document id, fast non-crypto hash
//! - Per-collection: listing a collection never scans other collections
//!
//! Writes here are unconditional. Preconditions (version tokens, atomic
//! guards) are validated by the commit manager before it calls
//! [`DocumentStore::apply_batch`].

use dashmap::DashMap;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};

/// A persisted document with its version token
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    /// Document body
    pub body: Value,
    /// Commit version that last wrote this document
    pub version: u64,
    /// Unix timestamp (seconds) of the last write
    pub last_modified: i64,
}

/// Per-collection shard
#[derive(Debug, Default)]
pub struct Shard {
    pub(crate) data: FxHashMap<String, StoredDocument>,
}

impl Shard {
    /// Create a new empty shard
    pub fn new() -> Self {
        Self {
            data: FxHashMap::default(),
        }
    }

    /// Get number of documents in this shard
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if shard is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A staged document write, as applied by a commit
#[derive(Debug, Clone)]
pub enum DocumentWrite {
    /// Insert or replace the document body
    Put {
        /// Collection name
        collection: String,
        /// Document id
        id: String,
        /// New body
        body: Value,
    },
    /// Remove the document
    Delete {
        /// Collection name
        collection: String,
        /// Document id
        id: String,
    },
}

/// Sharded document store - DashMap by collection, HashMap within
///
/// # Thread Safety
///
/// All operations are thread-safe:
/// - get(): Lock-free read via DashMap
/// - put(): Only locks the target collection's shard
pub struct DocumentStore {
    shards: DashMap<String, Shard>,
    /// Global commit version, shared with compare-exchange revisions
    version: AtomicU64,
}

impl DocumentStore {
    /// Create new document store
    pub fn new() -> Self {
        Self {
            shards: DashMap::new(),
            version: AtomicU64::new(0),
        }
    }

    /// Get current version
    #[inline]
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Increment version and return new value
    #[inline]
    pub fn next_version(&self) -> u64 {
        self.version.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Get number of collections
    pub fn collection_count(&self) -> usize {
        self.shards.len()
    }

    /// Get total number of documents across all collections
    pub fn total_documents(&self) -> usize {
        self.shards.iter().map(|entry| entry.value().len()).sum()
    }

    /// Get a document by collection and id
    #[inline]
    pub fn get(&self, collection: &str, id: &str) -> Option<StoredDocument> {
        self.shards
            .get(collection)
            .and_then(|shard| shard.data.get(id).cloned())
    }

    /// Check if a document exists
    #[inline]
    pub fn contains(&self, collection: &str, id: &str) -> bool {
        self.shards
            .get(collection)
            .map(|shard| shard.data.contains_key(id))
            .unwrap_or(false)
    }

    /// Put a document
    pub fn put(&self, collection: &str, id: &str, body: Value, version: u64) {
        let stored = StoredDocument {
            body,
            version,
            last_modified: chrono::Utc::now().timestamp(),
        };
        self.shards
            .entry(collection.to_string())
            .or_insert_with(Shard::new)
            .data
            .insert(id.to_string(), stored);
    }

    /// Delete a document, returning it if it existed
    pub fn delete(&self, collection: &str, id: &str) -> Option<StoredDocument> {
        self.shards
            .get_mut(collection)
            .and_then(|mut shard| shard.data.remove(id))
    }

    /// Apply a batch of writes, all stamped with the same version
    pub fn apply_batch(&self, writes: &[DocumentWrite], version: u64) {
        for write in writes {
            match write {
                DocumentWrite::Put {
                    collection,
                    id,
                    body,
                } => self.put(collection, id, body.clone(), version),
                DocumentWrite::Delete { collection, id } => {
                    self.delete(collection, id);
                }
            }
        }
    }

    /// Count documents in a collection
    pub fn count(&self, collection: &str) -> usize {
        self.shards
            .get(collection)
            .map(|shard| shard.len())
            .unwrap_or(0)
    }

    /// List all documents of a collection, sorted by id
    ///
    /// NOTE: Requires collect + sort. Listing is not on the hot path.
    pub fn list(&self, collection: &str) -> Vec<(String, StoredDocument)> {
        self.shards
            .get(collection)
            .map(|shard| {
                let mut results: Vec<_> = shard
                    .data
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                results.sort_by(|(a, _), (b, _)| a.cmp(b));
                results
            })
            .unwrap_or_default()
    }

    /// List one page of a collection, sorted by id
    ///
    /// Returns the total number of documents along with the page.
    pub fn list_page(
        &self,
        collection: &str,
        skip: usize,
        take: usize,
    ) -> (usize, Vec<(String, StoredDocument)>) {
        let all = self.list(collection);
        let total = all.len();
        let page = all.into_iter().skip(skip).take(take).collect();
        (total, page)
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("collection_count", &self.collection_count())
            .field("version", &self.version())
            .field("total_documents", &self.total_documents())
            .finish()
    }
}
