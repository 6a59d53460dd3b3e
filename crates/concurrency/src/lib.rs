//! Concurrency layer for tenantry
//!
//! This crate implements the unit of work over the document store:
//! - Database: shared handle with fault-injectable remote calls
//! - Session: identity map, change tracking and atomic commit
//! - CommitManager: serialized validate-then-apply of commit batches
//! - Version-token (single-node) and atomic-guard (cluster-wide) checks
//! - Linearizable compare-exchange writes

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod batch;
pub mod changes;
pub mod database;
pub mod manager;
pub mod session;
pub mod validation;

pub use batch::{CommitBatch, CommitReceipt, Expected, StagedWrite, TransactionMode};
pub use changes::{diff_fields, ChangeType, DocumentChange, WhatChanged};
pub use database::{Database, LoadedDocument};
pub use manager::{CommitError, CommitManager, CompareExchangeResult};
pub use session::Session;
pub use validation::{ConflictType, ValidationResult};
