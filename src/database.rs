//! Main entry point for Tenantry.
//!
//! This module provides the `Tenantry` struct, which owns the document
//! store and the reservation strategy, and hands out request-scoped
//! [`TenantStore`]s.

use crate::error::Result;
use crate::store::TenantStore;
use std::path::Path;
use tenantry_concurrency::Database;
use tenantry_core::{Document, ReservationType, TenantRecord};
use tenantry_directory::{ReservationOptions, TenantRecordCoordinator, TenantryConfig};
use tenantry_reservation::{compare_exchange_key, RESERVATION_COLLECTION};
use tenantry_storage::StoreConventions;

/// The tenant directory.
///
/// Cheap to clone; clones share the same store. Create one with
/// [`Tenantry::new`] or [`Tenantry::builder`].
///
/// # Example
///
/// ```ignore
/// use tenantry::prelude::*;
///
/// let tenantry = Tenantry::builder()
///     .shadow_documents(true)
///     .open();
///
/// let mut store = tenantry.tenant_store();
/// store.try_add(&mut TenantRecord::new("", "acme", "Acme Corp"))?;
/// ```
#[derive(Debug, Clone)]
pub struct Tenantry {
    db: Database,
    options: ReservationOptions,
    coordinator: TenantRecordCoordinator,
}

impl Tenantry {
    /// Open a directory with default settings (direct-value reservations).
    pub fn new() -> Self {
        Self::builder().open()
    }

    /// Open a directory configured by a TOML file.
    ///
    /// ```toml
    /// [reservations]
    /// use_shadow_documents_for_unique_values = true
    /// ```
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        let config = TenantryConfig::from_file(path)?;
        Ok(Self::builder().config(&config).open())
    }

    /// Create a builder for directory configuration.
    pub fn builder() -> TenantryBuilder {
        TenantryBuilder::new()
    }

    /// Open a request-scoped store with its own unit of work.
    pub fn tenant_store(&self) -> TenantStore {
        TenantStore::new(self.db.open_session(), self.coordinator.clone())
    }

    /// The underlying document store.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Reservation options in effect.
    pub fn options(&self) -> ReservationOptions {
        self.options
    }

    /// Get directory metrics.
    pub fn metrics(&self) -> TenantryMetrics {
        let manager = self.db.manager();
        let reservations = if self.options.use_shadow_documents_for_unique_values {
            self.db.documents().count(RESERVATION_COLLECTION)
        } else {
            let prefix = compare_exchange_key(ReservationType::Identifier, "");
            self.db.compare_exchange_table().keys_with_prefix(&prefix).len()
        };
        TenantryMetrics {
            commits: manager.committed_count(),
            conflicts: manager.aborted_count(),
            tenants: self.db.documents().count(TenantRecord::COLLECTION),
            reservations,
            version: self.db.documents().version(),
        }
    }
}

impl Default for Tenantry {
    fn default() -> Self {
        Self::new()
    }
}

/// Directory metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantryMetrics {
    /// Committed units of work
    pub commits: u64,
    /// Units of work rejected by concurrency checks
    pub conflicts: u64,
    /// Stored tenant records
    pub tenants: usize,
    /// Identifier reservations held by the active strategy
    pub reservations: usize,
    /// Latest store version
    pub version: u64,
}

/// Builder for directory configuration.
///
/// # Example
///
/// ```ignore
/// // Reservations as shadow documents under atomic guards
/// let tenantry = Tenantry::builder()
///     .shadow_documents(true)
///     .open();
///
/// // Settings from a config file
/// let config = TenantryConfig::from_file("tenantry.toml")?;
/// let tenantry = Tenantry::builder().config(&config).open();
/// ```
#[derive(Debug, Clone, Default)]
pub struct TenantryBuilder {
    options: ReservationOptions,
    conventions: StoreConventions,
}

impl TenantryBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve identifiers with shadow documents instead of raw
    /// compare-exchange keys.
    ///
    /// Pick once per dataset. Existing reservations are not migrated.
    pub fn shadow_documents(mut self, enabled: bool) -> Self {
        self.options = self.options.shadow_documents(enabled);
        self
    }

    /// Use the given reservation options.
    pub fn options(mut self, options: ReservationOptions) -> Self {
        self.options = options;
        self
    }

    /// Apply a loaded configuration.
    pub fn config(mut self, config: &TenantryConfig) -> Self {
        self.options = config.reservations;
        self
    }

    /// Override the store's document id conventions.
    pub fn conventions(mut self, conventions: StoreConventions) -> Self {
        self.conventions = conventions;
        self
    }

    /// Open the directory.
    pub fn open(self) -> Tenantry {
        let db = Database::with_conventions(self.conventions);
        tracing::debug!(
            shadow_documents = self.options.use_shadow_documents_for_unique_values,
            "tenant directory opened"
        );
        Tenantry {
            db,
            coordinator: TenantRecordCoordinator::from_options(&self.options),
            options: self.options,
        }
    }
}
