//! Pending-change inspection
//!
//! A session can report, per document id, what it would write on commit.
//! Modified documents are diffed field by field at the top level of their
//! JSON body; inserts and deletes are reported as a single document-level
//! entry.

use serde_json::Value;
use std::collections::BTreeMap;

/// Kind of pending change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    /// The document will be inserted
    DocumentAdded,
    /// The document will be deleted
    DocumentDeleted,
    /// An existing field has a new value
    FieldChanged,
    /// A field was added to the body
    NewField,
    /// A field was removed from the body
    RemovedField,
}

/// One pending change of a document
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentChange {
    /// What kind of change this is
    pub change: ChangeType,
    /// Top-level field name, `None` for document-level changes
    pub field_name: Option<String>,
    /// Value as tracked at load (`Null` when absent)
    pub old_value: Value,
    /// Value that will be written (`Null` when absent)
    pub new_value: Value,
}

impl DocumentChange {
    /// Whether this change concerns `field`
    pub fn is_field(&self, field: &str) -> bool {
        self.field_name.as_deref() == Some(field)
    }
}

/// Pending changes keyed by document id
pub type WhatChanged = BTreeMap<String, Vec<DocumentChange>>;

/// Diff two document bodies at the top level
///
/// Non-object bodies are compared as a whole and reported as a single
/// field-less `FieldChanged`.
pub fn diff_fields(old: &Value, new: &Value) -> Vec<DocumentChange> {
    let (old_map, new_map) = match (old.as_object(), new.as_object()) {
        (Some(o), Some(n)) => (o, n),
        _ => {
            if old == new {
                return Vec::new();
            }
            return vec![DocumentChange {
                change: ChangeType::FieldChanged,
                field_name: None,
                old_value: old.clone(),
                new_value: new.clone(),
            }];
        }
    };

    let mut changes = Vec::new();
    for (name, old_value) in old_map {
        match new_map.get(name) {
            Some(new_value) if new_value != old_value => changes.push(DocumentChange {
                change: ChangeType::FieldChanged,
                field_name: Some(name.clone()),
                old_value: old_value.clone(),
                new_value: new_value.clone(),
            }),
            Some(_) => {}
            None => changes.push(DocumentChange {
                change: ChangeType::RemovedField,
                field_name: Some(name.clone()),
                old_value: old_value.clone(),
                new_value: Value::Null,
            }),
        }
    }
    for (name, new_value) in new_map {
        if !old_map.contains_key(name) {
            changes.push(DocumentChange {
                change: ChangeType::NewField,
                field_name: Some(name.clone()),
                old_value: Value::Null,
                new_value: new_value.clone(),
            });
        }
    }
    changes
}
