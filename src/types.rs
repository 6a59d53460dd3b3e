//! Public types for the Tenantry API.
//!
//! This module re-exports types from internal crates with a clean public interface.

// Tenant record and results
pub use tenantry_core::Outcome;
pub use tenantry_core::PaginatedResult;
pub use tenantry_core::TenantRecord;

// Reservations
pub use tenantry_core::normalize_unique_value;
pub use tenantry_core::ReservationType;

// Configuration
pub use tenantry_directory::ReservationOptions;
pub use tenantry_directory::TenantryConfig;

// Store plumbing, for tests and diagnostics
pub use tenantry_concurrency::{Database, Session};
pub use tenantry_storage::{FaultMode, Operation, StoreConventions};
