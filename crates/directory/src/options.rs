//! Configuration for the tenant directory.
//!
//! This module provides [`ReservationOptions`], which selects the
//! reservation strategy, and [`TenantryConfig`], the file-level
//! configuration that wraps it.
//!
//! ```toml
//! [reservations]
//! use_shadow_documents_for_unique_values = true
//! ```
//!
//! The strategy is chosen once per dataset. Switching it on existing data
//! leaves previously claimed values unprotected until they are migrated.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tenantry_core::{Error, Result};
use tenantry_reservation::{DirectValueGuard, ShadowDocumentGuard, UniquenessGuard};

/// How unique values are reserved.
///
/// Use the builder pattern to configure options:
///
/// ```ignore
/// use tenantry_directory::ReservationOptions;
///
/// let opts = ReservationOptions::new().shadow_documents(true);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservationOptions {
    /// Reserve values with shadow documents instead of raw compare-exchange keys
    #[serde(alias = "useShadowDocumentsForUniqueValues")]
    pub use_shadow_documents_for_unique_values: bool,
}

impl ReservationOptions {
    /// Create default options (direct-value reservations)
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve values with shadow documents when `enabled`
    pub fn shadow_documents(mut self, enabled: bool) -> Self {
        self.use_shadow_documents_for_unique_values = enabled;
        self
    }

    /// Guard implementing the selected strategy
    pub fn guard(&self) -> Arc<dyn UniquenessGuard> {
        if self.use_shadow_documents_for_unique_values {
            Arc::new(ShadowDocumentGuard::new())
        } else {
            Arc::new(DirectValueGuard::new())
        }
    }
}

/// File-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TenantryConfig {
    /// Reservation strategy
    pub reservations: ReservationOptions,
}

impl TenantryConfig {
    /// Parse a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source)
            .map_err(|e| Error::invalid_input(format!("invalid configuration: {}", e)))
    }

    /// Read and parse a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            Error::invalid_input(format!(
                "cannot read configuration {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&source)
    }
}
