//! Cascading delete of a list and its entry documents.
//!
//! The store has no atomic recursive delete, so the aggregate is torn
//! down with explicit completion tracking: all entry deletes run
//! concurrently against a shared pending counter, and the list document
//! falls only when the counter reaches zero. A failed entry delete never
//! decrements, leaving the list document in place as a stale but visible
//! parent; that terminal state is reported, not retried.

use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::join_all;

use super::{SyncContext, SyncError};

/// Deletes all entries under `list_id`, then the list document itself.
pub(crate) async fn delete_list(ctx: &SyncContext, list_id: &str) -> Result<(), SyncError> {
    ctx.ensure_live()?;

    let entries_path = ctx.entries_path(list_id);
    let docs = match ctx.store.query(&entries_path, None, None).await {
        Ok(docs) => docs,
        Err(e) => {
            tracing::warn!(list = list_id, error = %e, "entry enumeration failed");
            ctx.notify("Fail: Delete List");
            return Err(e.into());
        }
    };

    // Zero entries: nothing to wait for, remove the parent immediately.
    if docs.is_empty() {
        return delete_list_doc(ctx, list_id).await;
    }

    let pending = AtomicUsize::new(docs.len());
    let deletes = docs.iter().map(|doc| {
        let entries_path = &entries_path;
        let pending = &pending;
        async move {
            match ctx.store.delete(entries_path, &doc.id).await {
                Ok(()) => {
                    pending.fetch_sub(1, Ordering::AcqRel);
                }
                Err(e) => {
                    tracing::warn!(list = list_id, entry = %doc.id, error = %e, "entry delete failed");
                    ctx.notify("Fail: Delete Entry");
                }
            }
        }
    });
    join_all(deletes).await;

    let remaining = pending.load(Ordering::Acquire);
    if remaining > 0 {
        tracing::warn!(list = list_id, remaining, "list delete incomplete");
        ctx.notify("Fail: Delete List");
        return Err(SyncError::IncompleteDelete {
            list_id: list_id.to_string(),
            remaining,
        });
    }

    delete_list_doc(ctx, list_id).await
}

async fn delete_list_doc(ctx: &SyncContext, list_id: &str) -> Result<(), SyncError> {
    match ctx.store.delete(&ctx.lists_path(), list_id).await {
        Ok(()) => {
            tracing::debug!(list = list_id, "deleted list");
            Ok(())
        }
        Err(e) => {
            tracing::warn!(list = list_id, error = %e, "list delete failed");
            ctx.notify("Fail: Delete List");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil::*;
    use super::super::SyncError;
    use crate::models::EntryDraft;

    #[tokio::test]
    async fn test_zero_entry_list_deletes_immediately() {
        let fx = fixture();
        let list = fx.core.add_list("Groceries").await.unwrap();

        fx.core.delete_list(&list.uid).await.unwrap();
        assert!(fx.store.is_empty(LISTS).await);
    }

    #[tokio::test]
    async fn test_all_entries_fall_before_the_list() {
        let fx = fixture();
        let list = fx.core.add_list("Groceries").await.unwrap();
        for name in ["Milk", "Eggs", "Bread"] {
            fx.core
                .add_entry(&list, EntryDraft::new(name, 1.0, "", ""), None)
                .await
                .unwrap();
        }

        fx.core.delete_list(&list.uid).await.unwrap();
        assert!(fx.store.is_empty(&entries_path(&list.uid)).await);
        assert!(fx.store.is_empty(LISTS).await);
    }

    #[tokio::test]
    async fn test_one_failed_entry_delete_keeps_the_list() {
        let fx = fixture();
        let list = fx.core.add_list("Groceries").await.unwrap();
        let milk = fx
            .core
            .add_entry(&list, EntryDraft::new("Milk", 1.0, "L", ""), None)
            .await
            .unwrap();
        fx.core
            .add_entry(&list, EntryDraft::new("Eggs", 12.0, "", ""), None)
            .await
            .unwrap();

        fx.store
            .fail_once(
                "delete",
                &format!("{}/{}", entries_path(&list.uid), milk.uid),
            )
            .await;
        let err = fx.core.delete_list(&list.uid).await.unwrap_err();

        match err {
            SyncError::IncompleteDelete { remaining, .. } => assert_eq!(remaining, 1),
            other => panic!("unexpected error: {:?}", other),
        }
        // The sibling delete went through; the parent survived.
        assert_eq!(fx.store.len(&entries_path(&list.uid)).await, 1);
        assert_eq!(fx.store.len(LISTS).await, 1);
        assert!(fx.notifier.contains("Fail: Delete Entry"));
        assert!(fx.notifier.contains("Fail: Delete List"));
    }

    #[tokio::test]
    async fn test_enumeration_failure_aborts_the_cascade() {
        let fx = fixture();
        let list = fx.core.add_list("Groceries").await.unwrap();
        fx.core
            .add_entry(&list, EntryDraft::new("Milk", 1.0, "L", ""), None)
            .await
            .unwrap();

        fx.store.fail_once("query", &entries_path(&list.uid)).await;
        assert!(fx.core.delete_list(&list.uid).await.is_err());

        assert_eq!(fx.store.len(&entries_path(&list.uid)).await, 1);
        assert_eq!(fx.store.len(LISTS).await, 1);
        assert!(fx.notifier.contains("Fail: Delete List"));
    }
}
