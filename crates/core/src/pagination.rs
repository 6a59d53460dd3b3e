//! Paginated listing result

use serde::{Deserialize, Serialize};

/// One page of items plus the total number of items across all pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginatedResult<T> {
    /// Total number of items in the collection
    pub total_items_count: usize,
    /// Items on the requested page
    pub items: Vec<T>,
}

impl<T> PaginatedResult<T> {
    /// Create a paginated result
    pub fn new(total_items_count: usize, items: Vec<T>) -> Self {
        Self {
            total_items_count,
            items,
        }
    }
}
