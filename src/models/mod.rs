mod history_element;
mod shopping_entry;
mod shopping_list;

pub use history_element::HistoryElement;
pub use shopping_entry::{EntryDraft, ShoppingEntry};
pub use shopping_list::ShoppingList;
