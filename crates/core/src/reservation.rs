//! Reservation dimensions and value normalization
//!
//! A reservation key is built from the reservation type prefix and the
//! normalized value, so separate uniqueness dimensions never collide and
//! lookups are insensitive to case and Unicode composition.

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// Guarded uniqueness dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReservationType {
    /// Tenant identifier
    Identifier,
}

impl ReservationType {
    /// All reservation types (for iteration)
    pub const ALL: [ReservationType; 1] = [ReservationType::Identifier];

    /// Prefix of the raw compare-exchange key
    pub const fn key_prefix(&self) -> &'static str {
        match self {
            ReservationType::Identifier => "tidentifier",
        }
    }

    /// Prefix inside a shadow reservation document id
    pub const fn document_prefix(&self) -> &'static str {
        match self {
            ReservationType::Identifier => "tntident",
        }
    }
}

impl std::fmt::Display for ReservationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReservationType::Identifier => write!(f, "Identifier"),
        }
    }
}

/// Canonical form of a unique value: Unicode NFC, then lower-case
pub fn normalize_unique_value(value: &str) -> String {
    value.nfc().collect::<String>().to_lowercase()
}
