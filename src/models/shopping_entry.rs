//! Shopping entry document model.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::HistoryElement;

/// A single entry in a shopping list.
///
/// Entries live in a child collection under their list document.
/// `position` is assigned once by the position allocator when the entry
/// is created and is otherwise only changed through an explicit reorder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingEntry {
    /// Stable identifier, generated client-side.
    pub uid: String,
    /// Item name.
    pub name: String,
    /// Non-negative amount.
    pub quantity: f64,
    /// Unit the quantity is measured in (e.g. "L", "kg").
    pub unit_of_quantity: String,
    /// Optional free text.
    pub details: String,
    /// Whether the item has been checked off.
    pub done: bool,
    /// Insertion slot within the list.
    pub position: i64,
    /// Either a resolved remote reference or a pending local reference.
    pub image_ref: Option<String>,
}

impl ShoppingEntry {
    /// Creates a new unchecked entry at the given position with a fresh uid.
    pub fn new(
        name: impl Into<String>,
        quantity: f64,
        unit_of_quantity: impl Into<String>,
        details: impl Into<String>,
        position: i64,
    ) -> Self {
        Self {
            uid: Uuid::new_v4().to_string(),
            name: name.into(),
            quantity,
            unit_of_quantity: unit_of_quantity.into(),
            details: details.into(),
            done: false,
            position,
            image_ref: None,
        }
    }

    /// Extracts the reusable part of this entry as a history element.
    ///
    /// The quantity is not considered reusable; the element gets a fresh uid.
    pub fn extract_history_element(&self) -> HistoryElement {
        HistoryElement::new(
            &self.name,
            &self.unit_of_quantity,
            &self.details,
            self.image_ref.clone(),
        )
    }
}

impl fmt::Display for ShoppingEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let check = if self.done { "[x]" } else { "[ ]" };
        if self.unit_of_quantity.is_empty() {
            write!(f, "{} {} {}", check, self.quantity, self.name)
        } else {
            write!(
                f,
                "{} {} {} {}",
                check, self.quantity, self.unit_of_quantity, self.name
            )
        }
    }
}

/// User-supplied fields for a new entry, before the core assigns
/// a uid and a position.
#[derive(Debug, Clone, Default)]
pub struct EntryDraft {
    pub name: String,
    pub quantity: f64,
    pub unit_of_quantity: String,
    pub details: String,
}

impl EntryDraft {
    pub fn new(
        name: impl Into<String>,
        quantity: f64,
        unit_of_quantity: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            quantity,
            unit_of_quantity: unit_of_quantity.into(),
            details: details.into(),
        }
    }

    /// Builds the entry document at the allocated position.
    pub(crate) fn into_entry(self, position: i64) -> ShoppingEntry {
        ShoppingEntry::new(
            self.name,
            self.quantity,
            self.unit_of_quantity,
            self.details,
            position,
        )
    }
}
