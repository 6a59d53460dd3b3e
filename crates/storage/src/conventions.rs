//! Document id conventions

use serde::{Deserialize, Serialize};

/// How document ids are composed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConventions {
    /// Separator between id parts
    pub identity_parts_separator: char,
}

impl StoreConventions {
    /// Id prefix for a collection (the collection name, lower-cased)
    pub fn collection_prefix(&self, collection: &str) -> String {
        collection.to_lowercase()
    }

    /// Join id parts with the separator
    pub fn document_id(&self, parts: &[&str]) -> String {
        let mut sep = [0u8; 4];
        let sep: &str = self.identity_parts_separator.encode_utf8(&mut sep);
        parts.join(sep)
    }
}

impl Default for StoreConventions {
    fn default() -> Self {
        Self {
            identity_parts_separator: '/',
        }
    }
}
