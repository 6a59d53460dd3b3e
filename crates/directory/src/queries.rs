//! Read queries over tenant records
//!
//! Plain reads with no reservation side effects. Lookups by identifier
//! share the normalization rule of the reservation guard.

use tenantry_concurrency::Session;
use tenantry_core::{
    normalize_unique_value, Error, PaginatedResult, ReservationType, Result, TenantRecord,
};
use tenantry_reservation::UniquenessGuard;

/// Load a record by id (tracked by the session)
pub fn get_by_id(session: &mut Session, id: &str) -> Result<Option<TenantRecord>> {
    if id.trim().is_empty() {
        return Err(Error::invalid_input("tenant id must not be empty"));
    }
    session.load::<TenantRecord>(id)
}

/// Find the record holding `identifier` (raw or normalized)
///
/// Resolves the owner through its reservation, then checks that the owner
/// still carries the identifier.
pub fn get_by_identifier(
    session: &mut Session,
    guard: &dyn UniquenessGuard,
    identifier: &str,
) -> Result<Option<TenantRecord>> {
    if identifier.trim().is_empty() {
        return Err(Error::invalid_input("identifier must not be empty"));
    }
    let normalized = normalize_unique_value(identifier);
    let owner = match guard.owner_of(session, ReservationType::Identifier, &normalized)? {
        Some(owner) => owner,
        None => return Ok(None),
    };
    let record = session.load::<TenantRecord>(&owner)?;
    Ok(record.filter(|r| r.normalized_identifier() == normalized))
}

/// Every record, sorted by id, without tracking
pub fn get_all(session: &Session) -> Result<Vec<TenantRecord>> {
    session.stream::<TenantRecord>()
}

/// One page of records, sorted by id
///
/// `page` is 1-based. A page past the end is empty but still reports the
/// total count.
pub fn get_all_paginated(
    session: &mut Session,
    page: usize,
    page_size: usize,
) -> Result<PaginatedResult<TenantRecord>> {
    if page < 1 {
        return Err(Error::invalid_input("page must not be lower than 1"));
    }
    if page_size < 1 {
        return Err(Error::invalid_input("page size must not be lower than 1"));
    }
    let skip = (page - 1).saturating_mul(page_size);
    let (total, items) = session.query_page::<TenantRecord>(skip, page_size)?;
    Ok(PaginatedResult::new(total, items))
}
