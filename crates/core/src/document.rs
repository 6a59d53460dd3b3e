//! Document addressing
//!
//! Every entity persisted in the document store belongs to a collection and
//! carries its own id. The id is assigned by the session when empty.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// An entity that can be stored in the document store
pub trait Document: Serialize + DeserializeOwned + Clone {
    /// Collection the document belongs to
    const COLLECTION: &'static str;

    /// Document id (empty until assigned)
    fn id(&self) -> &str;

    /// Assign the document id
    fn set_id(&mut self, id: String);
}
