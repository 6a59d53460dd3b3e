//! Shared store handle
//!
//! [`Database`] owns the document store, the compare-exchange table and the
//! commit manager. Every public call stands for a remote round trip and
//! consults the [`FaultInjector`] first.

use crate::batch::{CommitBatch, CommitReceipt};
use crate::manager::{CommitError, CommitManager, CompareExchangeResult};
use crate::session::Session;
use serde_json::Value;
use std::sync::Arc;
use tenantry_core::{Error, Result};
use tenantry_storage::{
    atomic_guard_key, CompareExchangeTable, CompareExchangeValue, DocumentStore, FaultInjector,
    FaultMode, Operation, StoreConventions, StoredDocument,
};

struct DatabaseInner {
    documents: DocumentStore,
    compare_exchange: CompareExchangeTable,
    manager: CommitManager,
    conventions: StoreConventions,
    faults: FaultInjector,
}

/// A document read together with its atomic guard revision
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    /// Document id
    pub id: String,
    /// Stored body and version
    pub document: StoredDocument,
    /// Atomic guard revision at read time
    pub guard_revision: Option<u64>,
}

/// Cheaply cloneable handle to one in-memory database
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Database {
    /// Create an empty database with default conventions
    pub fn new() -> Self {
        Self::with_conventions(StoreConventions::default())
    }

    /// Create an empty database with the given conventions
    pub fn with_conventions(conventions: StoreConventions) -> Self {
        Self {
            inner: Arc::new(DatabaseInner {
                documents: DocumentStore::new(),
                compare_exchange: CompareExchangeTable::new(),
                manager: CommitManager::new(),
                conventions,
                faults: FaultInjector::new(),
            }),
        }
    }

    /// Open a new unit of work
    pub fn open_session(&self) -> Session {
        Session::new(self.clone())
    }

    /// Id conventions
    pub fn conventions(&self) -> &StoreConventions {
        &self.inner.conventions
    }

    /// Fault injector for simulated store failures
    pub fn faults(&self) -> &FaultInjector {
        &self.inner.faults
    }

    /// Underlying document store (for inspection)
    pub fn documents(&self) -> &DocumentStore {
        &self.inner.documents
    }

    /// Underlying compare-exchange table (for inspection)
    pub fn compare_exchange_table(&self) -> &CompareExchangeTable {
        &self.inner.compare_exchange
    }

    /// Commit manager (for statistics)
    pub fn manager(&self) -> &CommitManager {
        &self.inner.manager
    }

    fn check_fault(&self, operation: Operation) -> Result<Option<FaultMode>> {
        match self.inner.faults.take(operation) {
            Some(FaultMode::Reject) => Err(FaultMode::Reject.to_error(operation)),
            other => Ok(other),
        }
    }

    fn ack(mode: Option<FaultMode>, operation: Operation) -> Result<()> {
        match mode {
            Some(mode) => Err(mode.to_error(operation)),
            None => Ok(()),
        }
    }

    /// Read a document and its atomic guard from the same commit
    pub fn load_document(&self, collection: &str, id: &str) -> Result<Option<LoadedDocument>> {
        let fault = self.check_fault(Operation::Load)?;
        let inner = &self.inner;
        let loaded = inner.manager.consistent_read(|| {
            inner.documents.get(collection, id).map(|document| LoadedDocument {
                id: id.to_string(),
                document,
                guard_revision: inner.compare_exchange.revision(&atomic_guard_key(id)),
            })
        });
        Self::ack(fault, Operation::Load)?;
        Ok(loaded)
    }

    /// Check whether a document exists in the store
    pub fn document_exists(&self, collection: &str, id: &str) -> Result<bool> {
        let fault = self.check_fault(Operation::Exists)?;
        let exists = self.inner.documents.contains(collection, id);
        Self::ack(fault, Operation::Exists)?;
        Ok(exists)
    }

    /// Read one page of a collection, sorted by id
    ///
    /// Returns the collection size along with the page.
    pub fn query_page(
        &self,
        collection: &str,
        skip: usize,
        take: usize,
    ) -> Result<(usize, Vec<LoadedDocument>)> {
        let fault = self.check_fault(Operation::Query)?;
        let inner = &self.inner;
        let page = inner.manager.consistent_read(|| {
            let (total, page) = inner.documents.list_page(collection, skip, take);
            let docs = page
                .into_iter()
                .map(|(id, document)| LoadedDocument {
                    guard_revision: inner.compare_exchange.revision(&atomic_guard_key(&id)),
                    id,
                    document,
                })
                .collect();
            (total, docs)
        });
        Self::ack(fault, Operation::Query)?;
        Ok(page)
    }

    /// Read every document of a collection, sorted by id
    pub fn query_all(&self, collection: &str) -> Result<Vec<LoadedDocument>> {
        let (_, docs) = self.query_page(collection, 0, usize::MAX)?;
        Ok(docs)
    }

    /// Commit a batch of staged writes
    ///
    /// A lost acknowledgement applies the batch and still reports failure.
    pub fn commit(&self, batch: &CommitBatch) -> std::result::Result<CommitReceipt, CommitError> {
        let fault = self
            .check_fault(Operation::Commit)
            .map_err(|e| CommitError::Unavailable {
                message: e.to_string(),
            })?;
        let receipt =
            self.inner
                .manager
                .commit(&self.inner.documents, &self.inner.compare_exchange, batch)?;
        if let Some(mode) = fault {
            return Err(CommitError::Unavailable {
                message: mode.to_error(Operation::Commit).to_string(),
            });
        }
        Ok(receipt)
    }

    /// Read a compare-exchange entry
    pub fn get_compare_exchange(&self, key: &str) -> Result<Option<CompareExchangeValue>> {
        let fault = self.check_fault(Operation::CompareExchangeGet)?;
        let entry = self.inner.compare_exchange.get(key);
        Self::ack(fault, Operation::CompareExchangeGet)?;
        Ok(entry)
    }

    /// Write a compare-exchange entry if its revision is `expected_revision`
    ///
    /// `expected_revision == 0` means create-if-absent.
    pub fn put_compare_exchange(
        &self,
        key: &str,
        value: Value,
        expected_revision: u64,
    ) -> Result<CompareExchangeResult> {
        if key.is_empty() {
            return Err(Error::invalid_input("compare-exchange key must not be empty"));
        }
        let fault = self.check_fault(Operation::CompareExchangePut)?;
        let result = self.inner.manager.compare_exchange_put(
            &self.inner.documents,
            &self.inner.compare_exchange,
            key,
            value,
            expected_revision,
        );
        Self::ack(fault, Operation::CompareExchangePut)?;
        Ok(result)
    }

    /// Delete a compare-exchange entry if its revision is `expected_revision`
    pub fn delete_compare_exchange(
        &self,
        key: &str,
        expected_revision: u64,
    ) -> Result<CompareExchangeResult> {
        let fault = self.check_fault(Operation::CompareExchangeDelete)?;
        let result = self.inner.manager.compare_exchange_delete(
            &self.inner.compare_exchange,
            key,
            expected_revision,
        );
        Self::ack(fault, Operation::CompareExchangeDelete)?;
        Ok(result)
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("documents", &self.inner.documents)
            .field("compare_exchange_entries", &self.inner.compare_exchange.len())
            .field("manager", &self.inner.manager)
            .finish()
    }
}
