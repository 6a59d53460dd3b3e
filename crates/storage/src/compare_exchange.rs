//! Compare-exchange table
//!
//! Cluster-level key/value entries carrying a revision. A write succeeds
//! only when the caller presents the current revision (0 meaning "must not
//! exist"), which makes each key a CAS cell.
//!
//! The table also stores atomic guards: hidden entries under
//! [`ATOMIC_GUARD_PREFIX`] that track the latest cluster-wide write of a
//! document.
//!
//! The check-and-set methods here are only atomic per key. Callers that
//! must be linearizable against multi-key commits hold the commit lock.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;

/// Key prefix of atomic guard entries
pub const ATOMIC_GUARD_PREFIX: &str = "rvn-atomic/";

/// Atomic guard key for a document id
pub fn atomic_guard_key(document_id: &str) -> String {
    format!("{}{}", ATOMIC_GUARD_PREFIX, document_id)
}

/// A compare-exchange entry with its revision
#[derive(Debug, Clone, PartialEq)]
pub struct CompareExchangeValue {
    /// Entry key
    pub key: String,
    /// Entry payload
    pub value: Value,
    /// Commit version of the last write of this entry
    pub revision: u64,
}

/// Revisioned key/value table
#[derive(Debug, Default)]
pub struct CompareExchangeTable {
    entries: DashMap<String, CompareExchangeValue>,
}

impl CompareExchangeTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an entry
    pub fn get(&self, key: &str) -> Option<CompareExchangeValue> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    /// Current revision of a key, if present
    pub fn revision(&self, key: &str) -> Option<u64> {
        self.entries.get(key).map(|e| e.value().revision)
    }

    /// Write `value` if the key's current revision equals `expected_revision`
    ///
    /// `expected_revision == 0` means the key must be absent. On success the
    /// entry is stamped with `new_revision`. Returns the entry as it is after
    /// the call, and whether the write happened.
    pub fn put(
        &self,
        key: &str,
        value: Value,
        expected_revision: u64,
        new_revision: u64,
    ) -> (bool, Option<CompareExchangeValue>) {
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().revision != expected_revision {
                    return (false, Some(occupied.get().clone()));
                }
                let entry = CompareExchangeValue {
                    key: key.to_string(),
                    value,
                    revision: new_revision,
                };
                occupied.insert(entry.clone());
                (true, Some(entry))
            }
            Entry::Vacant(vacant) => {
                if expected_revision != 0 {
                    return (false, None);
                }
                let entry = CompareExchangeValue {
                    key: key.to_string(),
                    value,
                    revision: new_revision,
                };
                vacant.insert(entry.clone());
                (true, Some(entry))
            }
        }
    }

    /// Remove the key if its current revision equals `expected_revision`
    ///
    /// Returns whether the entry was removed, plus the entry still present
    /// when the revision did not match.
    pub fn delete(
        &self,
        key: &str,
        expected_revision: u64,
    ) -> (bool, Option<CompareExchangeValue>) {
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(occupied) => {
                if occupied.get().revision != expected_revision {
                    return (false, Some(occupied.get().clone()));
                }
                occupied.remove();
                (true, None)
            }
            Entry::Vacant(_) => (false, None),
        }
    }

    /// Unconditional write (commit apply path)
    pub fn set(&self, key: &str, value: Value, revision: u64) {
        self.entries.insert(
            key.to_string(),
            CompareExchangeValue {
                key: key.to_string(),
                value,
                revision,
            },
        );
    }

    /// Unconditional removal (commit apply path)
    pub fn remove(&self, key: &str) -> Option<CompareExchangeValue> {
        self.entries.remove(key).map(|(_, v)| v)
    }

    /// Number of entries, atomic guards excluded
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| !e.key().starts_with(ATOMIC_GUARD_PREFIX))
            .count()
    }

    /// Check if there are no entries besides atomic guards
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys starting with `prefix`, sorted
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|e| e.key().starts_with(prefix))
            .map(|e| e.key().clone())
            .collect();
        keys.sort();
        keys
    }
}
