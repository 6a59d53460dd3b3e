//! The tenant record guarded by identifier reservations

use crate::document::Document;
use crate::error::{Error, Result};
use crate::reservation::normalize_unique_value;
use serde::{Deserialize, Serialize};

/// A tenant in the directory
///
/// `id` is immutable once stored. `identifier` is the human-chosen,
/// globally unique handle; it must only change through the coordinator so
/// the matching reservation moves with it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantRecord {
    /// Primary key
    pub id: String,
    /// Unique identifier (display form; normalized for reservations)
    pub identifier: String,
    /// Display name
    pub name: String,
    /// Optional per-tenant connection string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,
}

impl TenantRecord {
    /// Field name of the identifier as it appears in the stored document
    pub const IDENTIFIER_FIELD: &'static str = "identifier";

    /// Create a record with the given id, identifier and name
    pub fn new(
        id: impl Into<String>,
        identifier: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            identifier: identifier.into(),
            name: name.into(),
            connection_string: None,
        }
    }

    /// Set the connection string
    pub fn with_connection_string(mut self, connection_string: impl Into<String>) -> Self {
        self.connection_string = Some(connection_string.into());
        self
    }

    /// Check that identifier and name are present
    pub fn validate(&self) -> Result<()> {
        if self.identifier.trim().is_empty() {
            return Err(Error::invalid_input("identifier must not be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(Error::invalid_input("name must not be empty"));
        }
        Ok(())
    }

    /// Identifier in its normalized (reservation key) form
    pub fn normalized_identifier(&self) -> String {
        normalize_unique_value(&self.identifier)
    }
}

impl Document for TenantRecord {
    const COLLECTION: &'static str = "TenantRecords";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}
