//! Tenant directory for tenantry
//!
//! This crate provides:
//! - [`TenantRecordCoordinator`]: create / update / delete with reservations
//! - [`queries`]: reads by id, by identifier, full and paginated listings
//! - [`ReservationOptions`] and [`TenantryConfig`]: strategy selection

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod coordinator;
pub mod options;
pub mod queries;

pub use coordinator::TenantRecordCoordinator;
pub use options::{ReservationOptions, TenantryConfig};
