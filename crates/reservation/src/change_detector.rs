//! Field change detection for guarded values
//!
//! Reads the session's pending changes to decide whether a guarded field
//! really changed between the loaded snapshot and what will be written.

use serde_json::Value;
use tenantry_concurrency::{ChangeType, WhatChanged};
use tenantry_core::{Error, PropertyChange, Result};

fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Old and new value of `field` on `entity_id`, if it changed
///
/// Fails with [`Error::InconsistentChange`] when the tracked new value
/// differs from `asserted_new_value`.
pub fn detect_change(
    changes: &WhatChanged,
    entity_id: &str,
    field: &str,
    asserted_new_value: &str,
) -> Result<Option<PropertyChange<String>>> {
    let Some(document_changes) = changes.get(entity_id) else {
        return Ok(None);
    };
    let Some(change) = document_changes
        .iter()
        .find(|c| c.change == ChangeType::FieldChanged && c.is_field(field))
    else {
        return Ok(None);
    };

    let tracked = field_text(&change.new_value);
    if tracked != asserted_new_value {
        return Err(Error::InconsistentChange {
            id: entity_id.to_string(),
            field: field.to_string(),
            asserted: asserted_new_value.to_string(),
            tracked,
        });
    }
    Ok(Some(PropertyChange::new(
        field_text(&change.old_value),
        tracked,
    )))
}
