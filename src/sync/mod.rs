//! Synchronization core.
//!
//! Coordinates lists, entries and history against the async document
//! store: every UI-level action fans out into one or more gateway calls,
//! and each completed write triggers the dependent recomputation
//! (counters, history, image pipeline). There are no cross-document
//! transactions anywhere - consistency is eventual, converging after the
//! triggering mutation's continuations complete.
//!
//! Failure policy: a failure of the primary write aborts the operation
//! with an error. Failures of the derived follow-up steps (position
//! marker, counters, history) are surfaced through the [`Notifier`] and
//! logged, but never roll back the already-committed write; the next
//! successful mutation heals the drift.

mod cascade;
mod counters;
mod error;
mod history;
mod image;
mod position;

pub use error::SyncError;
pub use image::{ImageCompressor, ImageSource, NoCompression};

use std::sync::Arc;

use serde_json::Map;
use tokio_util::sync::CancellationToken;

use crate::blob::{BlobStore, HttpBlobStore};
use crate::config::Config;
use crate::models::{EntryDraft, HistoryElement, ShoppingEntry, ShoppingList};
use crate::notify::Notifier;
use crate::store::{fields, to_fields, DocumentStore, HttpDocumentStore};

/// Shared state threaded through every pipeline stage.
pub(crate) struct SyncContext {
    store: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    compressor: Arc<dyn ImageCompressor>,
    notifier: Arc<dyn Notifier>,
    user_id: String,
    cancel: CancellationToken,
}

impl SyncContext {
    fn lists_path(&self) -> String {
        format!("Users/{}/Lists", self.user_id)
    }

    fn entries_path(&self, list_id: &str) -> String {
        format!("Users/{}/Lists/{}/Entries", self.user_id, list_id)
    }

    fn history_path(&self) -> String {
        format!("Users/{}/History", self.user_id)
    }

    fn notify(&self, message: &str) {
        self.notifier.notify(message);
    }

    /// Fails with [`SyncError::Cancelled`] once the core is shut down.
    fn ensure_live(&self) -> Result<(), SyncError> {
        if self.cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        Ok(())
    }
}

/// The synchronization core exposed to the UI layer.
///
/// All collaborators are injected; pair it with the in-memory gateways
/// for tests or the HTTP gateways (via [`SyncCore::remote`]) for a real
/// backend.
pub struct SyncCore {
    ctx: SyncContext,
}

impl std::fmt::Debug for SyncCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncCore").finish_non_exhaustive()
    }
}

impl SyncCore {
    /// Creates a core over explicit gateway instances.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        notifier: Arc<dyn Notifier>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            ctx: SyncContext {
                store,
                blobs,
                compressor: Arc::new(NoCompression),
                notifier,
                user_id: user_id.into(),
                cancel: CancellationToken::new(),
            },
        }
    }

    /// Creates a core talking to the configured HTTP servers.
    pub fn remote(config: &Config, notifier: Arc<dyn Notifier>) -> Result<Self, SyncError> {
        let server_url = config.server_url.as_deref().ok_or(SyncError::NotConfigured)?;
        let blob_url = config.blob_base_url().unwrap_or(server_url);

        let store = Arc::new(HttpDocumentStore::new(server_url, config.api_key.clone()));
        let blobs = Arc::new(HttpBlobStore::new(blob_url, config.api_key.clone()));
        Ok(Self::new(store, blobs, notifier, config.user_id.clone()))
    }

    /// Replaces the image compressor used by the attachment pipeline.
    pub fn with_compressor(mut self, compressor: Arc<dyn ImageCompressor>) -> Self {
        self.ctx.compressor = compressor;
        self
    }

    /// Token observing the lifetime of this core.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.ctx.cancel.clone()
    }

    /// Tears the core down: in-flight pipelines stop at their next stage
    /// boundary with [`SyncError::Cancelled`].
    pub fn shutdown(&self) {
        self.ctx.cancel.cancel();
    }

    /// Creates a new, empty shopping list.
    pub async fn add_list(&self, name: impl Into<String>) -> Result<ShoppingList, SyncError> {
        self.ctx.ensure_live()?;
        let list = ShoppingList::new(name);
        match self
            .ctx
            .store
            .create(&self.ctx.lists_path(), &list.uid, to_fields(&list)?)
            .await
        {
            Ok(()) => {
                tracing::debug!(list = %list.uid, "added list");
                Ok(list)
            }
            Err(e) => {
                tracing::warn!(error = %e, "list create failed");
                self.ctx.notify("Fail: Add List");
                Err(e.into())
            }
        }
    }

    /// All lists, ordered by name.
    pub async fn lists(&self) -> Result<Vec<ShoppingList>, SyncError> {
        self.ctx.ensure_live()?;
        let docs = self
            .ctx
            .store
            .query(&self.ctx.lists_path(), Some(fields::NAME), None)
            .await?;
        Ok(docs.iter().filter_map(|doc| doc.decode().ok()).collect())
    }

    /// Entries of a list, ordered by position.
    pub async fn entries(&self, list_id: &str) -> Result<Vec<ShoppingEntry>, SyncError> {
        self.ctx.ensure_live()?;
        let docs = self
            .ctx
            .store
            .query(&self.ctx.entries_path(list_id), Some(fields::POSITION), None)
            .await?;
        Ok(docs.iter().filter_map(|doc| doc.decode().ok()).collect())
    }

    /// Renames a list.
    pub async fn update_list_name(&self, list: &ShoppingList) -> Result<(), SyncError> {
        self.ctx.ensure_live()?;
        let mut partial = Map::new();
        partial.insert(fields::NAME.to_string(), list.name.clone().into());
        match self
            .ctx
            .store
            .update(&self.ctx.lists_path(), &list.uid, partial)
            .await
        {
            Ok(()) => {
                tracing::debug!(list = %list.uid, "updated list name");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(list = %list.uid, error = %e, "list rename failed");
                self.ctx.notify("Fail: Update List Name");
                Err(e.into())
            }
        }
    }

    /// Adds a new entry to `list`, at the position handed out by the
    /// allocator from the given list snapshot.
    ///
    /// After the entry document is committed, the position marker, the
    /// list counters and the history/image follow-ups run as independent
    /// continuations; their failures do not remove the entry.
    pub async fn add_entry(
        &self,
        list: &ShoppingList,
        draft: EntryDraft,
        image: Option<ImageSource>,
    ) -> Result<ShoppingEntry, SyncError> {
        self.ctx.ensure_live()?;
        let slot = position::allocate(list);
        let mut entry = draft.into_entry(slot);

        let entries_path = self.ctx.entries_path(&list.uid);
        if let Err(e) = self
            .ctx
            .store
            .create(&entries_path, &entry.uid, to_fields(&entry)?)
            .await
        {
            tracing::warn!(entry = %entry.uid, error = %e, "entry create failed");
            self.ctx.notify("Fail: Add new Entry");
            return Err(e.into());
        }
        tracing::debug!(list = %list.uid, entry = %entry.uid, position = slot, "added entry");

        position::commit(&self.ctx, &list.uid, slot).await;
        counters::recompute(&self.ctx, &list.uid).await;

        match image {
            Some(source) => {
                let resolved = image::attach(&self.ctx, &list.uid, &entry, source).await?;
                entry.image_ref = Some(resolved);
            }
            None => {
                let _ = history::record_if_new(&self.ctx, entry.extract_history_element()).await;
            }
        }
        Ok(entry)
    }

    /// Deletes a single entry and recomputes the list counters.
    pub async fn delete_entry(&self, list_id: &str, entry_id: &str) -> Result<(), SyncError> {
        self.ctx.ensure_live()?;
        match self
            .ctx
            .store
            .delete(&self.ctx.entries_path(list_id), entry_id)
            .await
        {
            Ok(()) => {
                tracing::debug!(list = list_id, entry = entry_id, "deleted entry");
                counters::recompute(&self.ctx, list_id).await;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(entry = entry_id, error = %e, "entry delete failed");
                self.ctx.notify("Fail: Delete Entry");
                Err(e.into())
            }
        }
    }

    /// Persists the entry's done flag and recomputes the list counters.
    pub async fn toggle_done(&self, list_id: &str, entry: &ShoppingEntry) -> Result<(), SyncError> {
        self.ctx.ensure_live()?;
        let mut partial = Map::new();
        partial.insert(fields::DONE.to_string(), entry.done.into());
        match self
            .ctx
            .store
            .update(&self.ctx.entries_path(list_id), &entry.uid, partial)
            .await
        {
            Ok(()) => {
                tracing::debug!(entry = %entry.uid, done = entry.done, "updated status");
                counters::recompute(&self.ctx, list_id).await;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(entry = %entry.uid, error = %e, "status update failed");
                self.ctx.notify("Fail: Update Status \"Done\"");
                Err(e.into())
            }
        }
    }

    /// Rewrites an entry's user-editable fields.
    ///
    /// The image reference is owned by the attachment pipeline and is not
    /// part of the partial update; pass an [`ImageSource`] to change it.
    /// Without one, the entry's current description is fed to history.
    pub async fn edit_entry(
        &self,
        list_id: &str,
        entry: &ShoppingEntry,
        image: Option<ImageSource>,
    ) -> Result<(), SyncError> {
        self.ctx.ensure_live()?;
        let mut partial = Map::new();
        partial.insert(fields::NAME.to_string(), entry.name.clone().into());
        partial.insert(fields::DONE.to_string(), entry.done.into());
        partial.insert(fields::DETAILS.to_string(), entry.details.clone().into());
        partial.insert(fields::POSITION.to_string(), entry.position.into());
        partial.insert(fields::QUANTITY.to_string(), entry.quantity.into());
        partial.insert(
            fields::UNIT_OF_QUANTITY.to_string(),
            entry.unit_of_quantity.clone().into(),
        );

        if let Err(e) = self
            .ctx
            .store
            .update(&self.ctx.entries_path(list_id), &entry.uid, partial)
            .await
        {
            tracing::warn!(entry = %entry.uid, error = %e, "entry update failed");
            self.ctx.notify("Fail: Modify Entry");
            return Err(e.into());
        }
        tracing::debug!(entry = %entry.uid, "updated entry");

        counters::recompute(&self.ctx, list_id).await;

        match image {
            Some(source) => {
                image::attach(&self.ctx, list_id, entry, source).await?;
            }
            None => {
                let _ = history::record_if_new(&self.ctx, entry.extract_history_element()).await;
            }
        }
        Ok(())
    }

    /// Moves an entry to an explicit position.
    ///
    /// This is a raw reorder write; it does not involve the allocator.
    pub async fn update_entry_position(
        &self,
        list_id: &str,
        entry_id: &str,
        position: i64,
    ) -> Result<(), SyncError> {
        self.ctx.ensure_live()?;
        let mut partial = Map::new();
        partial.insert(fields::POSITION.to_string(), position.into());
        self.ctx
            .store
            .update(&self.ctx.entries_path(list_id), entry_id, partial)
            .await?;
        Ok(())
    }

    /// Deletes a list together with all of its entries.
    pub async fn delete_list(&self, list_id: &str) -> Result<(), SyncError> {
        cascade::delete_list(&self.ctx, list_id).await
    }

    /// Deletes every list, each through the cascading coordinator.
    pub async fn delete_all_lists(&self) -> Result<(), SyncError> {
        self.ctx.ensure_live()?;
        let docs = match self.ctx.store.query(&self.ctx.lists_path(), None, None).await {
            Ok(docs) => docs,
            Err(e) => {
                tracing::warn!(error = %e, "list enumeration failed");
                self.ctx.notify("Fail: Delete all Lists");
                return Err(e.into());
            }
        };

        let deletes = docs.iter().map(|doc| cascade::delete_list(&self.ctx, &doc.id));
        let failures: Vec<SyncError> = futures::future::join_all(deletes)
            .await
            .into_iter()
            .filter_map(Result::err)
            .collect();

        match failures.into_iter().next() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// The full history of previously entered item descriptions.
    pub async fn get_history(&self) -> Result<Vec<HistoryElement>, SyncError> {
        self.ctx.ensure_live()?;
        history::get_all(&self.ctx).await
    }

    /// Removes a single history element.
    pub async fn delete_history_element(&self, uid: &str) -> Result<(), SyncError> {
        self.ctx.ensure_live()?;
        history::delete_one(&self.ctx, uid).await
    }

    /// Removes the whole history.
    pub async fn delete_history(&self) -> Result<(), SyncError> {
        self.ctx.ensure_live()?;
        history::delete_all(&self.ctx).await
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;
    use crate::blob::MemoryBlobStore;
    use crate::notify::RecordingNotifier;
    use crate::store::MemoryDocumentStore;

    pub(crate) const LISTS: &str = "Users/tester/Lists";
    pub(crate) const HISTORY: &str = "Users/tester/History";

    pub(crate) fn entries_path(list_id: &str) -> String {
        format!("Users/tester/Lists/{}/Entries", list_id)
    }

    pub(crate) struct Fixture {
        pub core: SyncCore,
        pub store: Arc<MemoryDocumentStore>,
        pub blobs: Arc<MemoryBlobStore>,
        pub notifier: Arc<RecordingNotifier>,
    }

    pub(crate) fn fixture() -> Fixture {
        let store = Arc::new(MemoryDocumentStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let core = SyncCore::new(store.clone(), blobs.clone(), notifier.clone(), "tester");
        Fixture {
            core,
            store,
            blobs,
            notifier,
        }
    }

    pub(crate) async fn fetch_list(store: &MemoryDocumentStore, uid: &str) -> ShoppingList {
        store.get(LISTS, uid).await.unwrap().decode().unwrap()
    }

    pub(crate) async fn fetch_entry(
        store: &MemoryDocumentStore,
        list_id: &str,
        uid: &str,
    ) -> ShoppingEntry {
        store
            .get(&entries_path(list_id), uid)
            .await
            .unwrap()
            .decode()
            .unwrap()
    }
}
