//! Request-scoped tenant store.
//!
//! A [`TenantStore`] owns one unit of work. Open one per request with
//! [`Tenantry::tenant_store`](crate::Tenantry::tenant_store) and drop it
//! when the request ends; records read through it stay tracked, which is
//! what [`MultiTenantStore::try_update`] relies on.
//!
//! # Example
//!
//! ```ignore
//! use tenantry::prelude::*;
//!
//! let tenantry = Tenantry::builder().shadow_documents(true).open();
//!
//! let mut store = tenantry.tenant_store();
//! let mut acme = TenantRecord::new("", "acme", "Acme Corp");
//! assert!(store.try_add(&mut acme)?);
//!
//! let mut store = tenantry.tenant_store();
//! let mut acme = store.try_get_by_identifier("ACME")?.unwrap();
//! acme.identifier = "acme-corp".into();
//! assert!(store.try_update(&mut acme)?);
//! ```

use crate::error::Result;
use tenantry_concurrency::Session;
use tenantry_core::{Outcome, PaginatedResult, TenantRecord};
use tenantry_directory::{queries, TenantRecordCoordinator};

/// Tenant storage as seen by a multi-tenancy host.
///
/// Expected negative answers come back as `false` or `None`: the identifier
/// is taken, the tenant does not exist, or a concurrent writer got there
/// first. Errors are reserved for invalid input, programming errors and
/// store connectivity failures.
pub trait MultiTenantStore {
    /// Add a tenant, reserving its identifier. Assigns an id when empty.
    fn try_add(&mut self, record: &mut TenantRecord) -> Result<bool>;

    /// Save changes to a tenant previously read through this store.
    fn try_update(&mut self, record: &mut TenantRecord) -> Result<bool>;

    /// Remove a tenant and release its identifier.
    fn try_remove(&mut self, id: &str) -> Result<bool>;

    /// Tenant by id.
    fn try_get(&mut self, id: &str) -> Result<Option<TenantRecord>>;

    /// Tenant by identifier, raw or normalized.
    fn try_get_by_identifier(&mut self, identifier: &str) -> Result<Option<TenantRecord>>;

    /// Every tenant, sorted by id.
    fn get_all(&mut self) -> Result<Vec<TenantRecord>>;

    /// One page of tenants. `page` and `page_size` start at 1.
    fn get_all_paginated(
        &mut self,
        page: usize,
        page_size: usize,
    ) -> Result<PaginatedResult<TenantRecord>>;
}

/// [`MultiTenantStore`] over one session.
#[derive(Debug)]
pub struct TenantStore {
    session: Session,
    coordinator: TenantRecordCoordinator,
}

impl TenantStore {
    pub(crate) fn new(session: Session, coordinator: TenantRecordCoordinator) -> Self {
        Self {
            session,
            coordinator,
        }
    }

    /// Add a tenant and report exactly why it was refused.
    pub fn add(&mut self, record: &mut TenantRecord) -> Result<Outcome> {
        Ok(self.coordinator.create(&mut self.session, record)?)
    }

    /// Update a tenant and report exactly why it was refused.
    pub fn update(&mut self, record: &mut TenantRecord) -> Result<Outcome> {
        Ok(self.coordinator.update(&mut self.session, record)?)
    }

    /// Remove a tenant and report exactly why it was refused.
    pub fn remove(&mut self, id: &str) -> Result<Outcome> {
        Ok(self.coordinator.delete(&mut self.session, id)?)
    }

    /// The unit of work behind this store.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Mutable access to the unit of work.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }
}

impl MultiTenantStore for TenantStore {
    fn try_add(&mut self, record: &mut TenantRecord) -> Result<bool> {
        self.add(record).map(|outcome| outcome.is_success())
    }

    fn try_update(&mut self, record: &mut TenantRecord) -> Result<bool> {
        self.update(record).map(|outcome| outcome.is_success())
    }

    fn try_remove(&mut self, id: &str) -> Result<bool> {
        self.remove(id).map(|outcome| outcome.is_success())
    }

    fn try_get(&mut self, id: &str) -> Result<Option<TenantRecord>> {
        Ok(queries::get_by_id(&mut self.session, id)?)
    }

    fn try_get_by_identifier(&mut self, identifier: &str) -> Result<Option<TenantRecord>> {
        Ok(queries::get_by_identifier(
            &mut self.session,
            self.coordinator.guard(),
            identifier,
        )?)
    }

    fn get_all(&mut self) -> Result<Vec<TenantRecord>> {
        Ok(queries::get_all(&self.session)?)
    }

    fn get_all_paginated(
        &mut self,
        page: usize,
        page_size: usize,
    ) -> Result<PaginatedResult<TenantRecord>> {
        Ok(queries::get_all_paginated(
            &mut self.session,
            page,
            page_size,
        )?)
    }
}
