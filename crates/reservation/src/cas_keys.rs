//! CasKeyStore adapter
//!
//! Thin wrapper over the store's compare-exchange facility with string
//! payloads. Every call is a remote call; connectivity failures are
//! returned to the caller as [`Error::Unavailable`].

use serde_json::Value;
use tenantry_concurrency::Database;
use tenantry_core::{Error, Result};

/// A compare-exchange entry with a string payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CasEntry {
    /// Payload (the owner id for reservations)
    pub value: String,
    /// Revision to present on delete
    pub revision: u64,
}

/// String-valued compare-exchange access
#[derive(Debug, Clone)]
pub struct CasKeyStore {
    db: Database,
}

impl CasKeyStore {
    /// Create an adapter over `db`
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create `key` with `value` only if it does not exist
    ///
    /// Returns the revision written, or `None` when the key is already
    /// present.
    pub fn create(&self, key: &str, value: &str) -> Result<Option<u64>> {
        let result = self
            .db
            .put_compare_exchange(key, Value::String(value.to_string()), 0)?;
        Ok(result.successful.then_some(result.revision))
    }

    /// Create `key` with `value` only if it does not exist
    ///
    /// Returns `false` when the key is already present.
    pub fn try_create(&self, key: &str, value: &str) -> Result<bool> {
        Ok(self.create(key, value)?.is_some())
    }

    /// Read `key`
    pub fn get(&self, key: &str) -> Result<Option<CasEntry>> {
        match self.db.get_compare_exchange(key)? {
            None => Ok(None),
            Some(entry) => match entry.value {
                Value::String(value) => Ok(Some(CasEntry {
                    value,
                    revision: entry.revision,
                })),
                other => Err(Error::Serialization(format!(
                    "compare-exchange '{}' holds a non-string value: {}",
                    key, other
                ))),
            },
        }
    }

    /// Delete `key` if its revision is `expected_revision`
    ///
    /// An absent key counts as deleted. Returns `false` only when the key
    /// exists with another revision.
    pub fn delete(&self, key: &str, expected_revision: u64) -> Result<bool> {
        let result = self.db.delete_compare_exchange(key, expected_revision)?;
        Ok(result.successful || result.value.is_none())
    }
}
