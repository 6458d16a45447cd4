//! Previously used entry descriptions, kept independent of any live list.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// A previously entered item description.
///
/// Equality and hashing are defined over `(name, unit_of_quantity,
/// details, image_ref)` only - two elements with different uids but the
/// same four fields are duplicates. Comparison is case-sensitive, as
/// stored.
#[derive(Debug, Clone, Serialize, Deserialize, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryElement {
    /// Stable identifier of the history document; not part of equality.
    pub uid: String,
    pub name: String,
    pub unit_of_quantity: String,
    pub details: String,
    pub image_ref: Option<String>,
}

impl HistoryElement {
    /// Creates a new element with a fresh uid.
    pub fn new(
        name: impl Into<String>,
        unit_of_quantity: impl Into<String>,
        details: impl Into<String>,
        image_ref: Option<String>,
    ) -> Self {
        Self {
            uid: Uuid::new_v4().to_string(),
            name: name.into(),
            unit_of_quantity: unit_of_quantity.into(),
            details: details.into(),
            image_ref,
        }
    }
}

impl PartialEq for HistoryElement {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.unit_of_quantity == other.unit_of_quantity
            && self.details == other.details
            && self.image_ref == other.image_ref
    }
}

impl Hash for HistoryElement {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.unit_of_quantity.hash(state);
        self.details.hash(state);
        self.image_ref.hash(state);
    }
}
