//! # Tenantry
//!
//! Tenant directory with cluster-safe unique identifier reservations.
//!
//! Every tenant record carries a human-facing identifier (`acme`,
//! `contoso-eu`) that must be unique across the directory, compared after
//! Unicode normalization and lower-casing. Tenantry keeps that guarantee
//! under concurrent writers by claiming each identifier through a
//! compare-and-swap reservation tied to the record's lifecycle.
//!
//! ## Quick Start
//!
//! ```ignore
//! use tenantry::prelude::*;
//!
//! let tenantry = Tenantry::new();
//!
//! // One store per request
//! let mut store = tenantry.tenant_store();
//! let mut acme = TenantRecord::new("", "acme", "Acme Corp");
//! assert!(store.try_add(&mut acme)?);
//!
//! // The same identifier in another case is taken
//! let mut clash = TenantRecord::new("", "ACME", "Impostor");
//! assert!(!store.try_add(&mut clash)?);
//! ```
//!
//! ## Reservation strategies
//!
//! - **Direct values** (default): the identifier is claimed as a
//!   compare-exchange key before the record is committed. A failed commit
//!   releases the claim again.
//! - **Shadow documents** ([`TenantryBuilder::shadow_documents`]): the
//!   reservation is a document committed in the same cluster-wide unit of
//!   work as the record.
//!
//! The strategy is chosen once per dataset.

#![warn(missing_docs)]

mod database;
mod error;
mod store;
mod types;

pub mod prelude;

// Re-export main entry points
pub use database::{Tenantry, TenantryBuilder, TenantryMetrics};
pub use error::{Error, Result};
pub use store::{MultiTenantStore, TenantStore};

// Re-export types
pub use types::*;
