//! Core types for the tenant directory
//!
//! This crate defines the types shared by every layer:
//! - [`Error`]: the internal error type with conflict/unavailable classification
//! - [`Document`]: how an entity is addressed inside the document store
//! - [`TenantRecord`]: the guarded entity
//! - [`ReservationType`] and [`normalize_unique_value`]: reservation namespacing
//! - [`Outcome`] and [`PaginatedResult`]: operation results

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod change;
pub mod document;
pub mod error;
pub mod outcome;
pub mod pagination;
pub mod reservation;
pub mod tenant;

pub use change::PropertyChange;
pub use document::Document;
pub use error::{Error, Result};
pub use outcome::Outcome;
pub use pagination::PaginatedResult;
pub use reservation::{normalize_unique_value, ReservationType};
pub use tenant::TenantRecord;
