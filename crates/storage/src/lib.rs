//! Storage layer for tenantry
//!
//! This crate implements the in-memory document store backend with:
//! - DocumentStore: per-collection shards (DashMap + FxHashMap) of JSON documents
//! - CompareExchangeTable: revisioned key/value entries for CAS
//! - StoreConventions: document id prefixes and separators
//! - FaultInjector: simulated connectivity failures
//! - Version management with AtomicU64
//!
//! This crate only holds state. Validation and atomic commit live in
//! `tenantry-concurrency`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod compare_exchange;
pub mod conventions;
pub mod fault;
pub mod sharded;

pub use compare_exchange::{
    atomic_guard_key, CompareExchangeTable, CompareExchangeValue, ATOMIC_GUARD_PREFIX,
};
pub use conventions::StoreConventions;
pub use fault::{FaultInjector, FaultMode, Operation};
pub use sharded::{DocumentStore, DocumentWrite, Shard, StoredDocument};
