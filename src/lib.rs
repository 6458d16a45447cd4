//! ShopList Core Library
//!
//! Shared models and synchronization logic for ShopList applications.
//! The sync core keeps derived aggregates (list counters, entry
//! positions, history deduplication) consistent across independent async
//! writes to a remote document store, and coordinates multi-document
//! teardown where the store offers no atomic recursive delete.

pub mod blob;
pub mod config;
pub mod models;
pub mod notify;
pub mod store;
pub mod sync;

pub use blob::{BlobStore, HttpBlobStore, MemoryBlobStore};
pub use config::{Config, ConfigError};
pub use models::{EntryDraft, HistoryElement, ShoppingEntry, ShoppingList};
pub use notify::{ChannelNotifier, LogNotifier, Notifier, RecordingNotifier};
pub use store::{
    Document, DocumentStore, Filter, HttpDocumentStore, MemoryDocumentStore, StoreError,
};
pub use sync::{ImageCompressor, ImageSource, NoCompression, SyncCore, SyncError};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
