//! Convenient imports for Tenantry.
//!
//! This module re-exports the most commonly used types so you can get started
//! with a single import:
//!
//! ```ignore
//! use tenantry::prelude::*;
//!
//! let tenantry = Tenantry::new();
//! let mut store = tenantry.tenant_store();
//! store.try_add(&mut TenantRecord::new("", "acme", "Acme Corp"))?;
//! ```

// Main entry point
pub use crate::database::{Tenantry, TenantryBuilder};

// Error handling
pub use crate::error::{Error, Result};

// Tenant store
pub use crate::store::{MultiTenantStore, TenantStore};

// Core types
pub use crate::types::{Outcome, PaginatedResult, TenantRecord};

// Configuration
pub use crate::types::{ReservationOptions, TenantryConfig};
