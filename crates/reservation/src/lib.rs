//! Uniqueness reservations for tenantry
//!
//! This crate turns the store's compare-and-swap primitives into a
//! "claim this value or fail" protocol:
//! - [`CasKeyStore`]: string-valued compare-exchange adapter
//! - [`UniquenessGuard`]: check / claim / move / release contract
//! - [`DirectValueGuard`]: reservations as raw compare-exchange keys
//! - [`ShadowDocumentGuard`]: reservations as documents under atomic guards
//! - [`detect_change`]: guarded-field change detection from session tracking

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cas_keys;
pub mod change_detector;
pub mod direct;
pub mod guard;
pub mod keys;
pub mod shadow;

pub use cas_keys::{CasEntry, CasKeyStore};
pub use change_detector::detect_change;
pub use direct::DirectValueGuard;
pub use guard::{Claim, UniquenessGuard};
pub use keys::{compare_exchange_key, reservation_document_id, RESERVATION_COLLECTION};
pub use shadow::{ShadowDocumentGuard, UniqueReservation};
