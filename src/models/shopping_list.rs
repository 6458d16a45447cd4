//! Shopping list document model.
//!
//! A list owns its entries as a child collection in the document store.
//! The counter fields and `next_free_position` are derived state written
//! only by the sync core, never directly by a UI layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A shopping list document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingList {
    /// Stable identifier, generated client-side.
    pub uid: String,
    /// Display name.
    pub name: String,
    /// Number of entries with `done == true` at the last recompute.
    pub done_count: u64,
    /// Number of entries at the last recompute.
    pub total_count: u64,
    /// Monotonic insertion marker for the position allocator.
    pub next_free_position: i64,
}

impl ShoppingList {
    /// Creates a new empty list with a fresh uid.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            uid: Uuid::new_v4().to_string(),
            name: name.into(),
            done_count: 0,
            total_count: 0,
            next_free_position: 0,
        }
    }
}

impl fmt::Display for ShoppingList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}/{})", self.name, self.done_count, self.total_count)
    }
}
