//! Content-keyed log of previously entered item descriptions.

use std::collections::HashSet;

use futures::future::join_all;

use crate::models::HistoryElement;
use crate::store::to_fields;

use super::{SyncContext, SyncError};

/// Records `candidate` unless an element with the same four-field
/// identity already exists.
///
/// Read-then-write with no isolation: two concurrent calls with the same
/// candidate can both observe "absent" and both insert. The duplicate is
/// harmless (history shows the entry twice) and accepted; sequential
/// calls are idempotent. Returns whether an insert happened.
pub(crate) async fn record_if_new(
    ctx: &SyncContext,
    candidate: HistoryElement,
) -> Result<bool, SyncError> {
    let path = ctx.history_path();
    let docs = match ctx.store.query(&path, None, None).await {
        Ok(docs) => docs,
        Err(e) => {
            tracing::warn!(error = %e, "history query failed");
            ctx.notify("Fail: Add To History");
            return Err(e.into());
        }
    };

    let existing: HashSet<HistoryElement> = docs
        .iter()
        .filter_map(|doc| doc.decode::<HistoryElement>().ok())
        .collect();
    if existing.contains(&candidate) {
        tracing::debug!(name = %candidate.name, "history element already present");
        return Ok(false);
    }

    let fields = to_fields(&candidate)?;
    match ctx.store.create(&path, &candidate.uid, fields).await {
        Ok(()) => {
            tracing::debug!(name = %candidate.name, "added history element");
            Ok(true)
        }
        Err(e) => {
            tracing::warn!(error = %e, "history insert failed");
            ctx.notify("Fail: Add To History");
            Err(e.into())
        }
    }
}

/// Returns the full history.
pub(crate) async fn get_all(ctx: &SyncContext) -> Result<Vec<HistoryElement>, SyncError> {
    match ctx.store.query(&ctx.history_path(), None, None).await {
        Ok(docs) => Ok(docs
            .iter()
            .filter_map(|doc| doc.decode::<HistoryElement>().ok())
            .collect()),
        Err(e) => {
            tracing::warn!(error = %e, "history retrieval failed");
            ctx.notify("Fail: Retrieve History");
            Err(e.into())
        }
    }
}

/// Deletes a single history element.
pub(crate) async fn delete_one(ctx: &SyncContext, uid: &str) -> Result<(), SyncError> {
    match ctx.store.delete(&ctx.history_path(), uid).await {
        Ok(()) => {
            tracing::debug!(element = uid, "deleted history element");
            Ok(())
        }
        Err(e) => {
            tracing::warn!(element = uid, error = %e, "history element delete failed");
            ctx.notify("Fail: Delete History");
            Err(e.into())
        }
    }
}

/// Deletes the whole history: enumerate, then delete each element.
///
/// There is no atomicity; a partial failure leaves a partially emptied
/// history and is not retried.
pub(crate) async fn delete_all(ctx: &SyncContext) -> Result<(), SyncError> {
    let path = ctx.history_path();
    let docs = match ctx.store.query(&path, None, None).await {
        Ok(docs) => docs,
        Err(e) => {
            tracing::warn!(error = %e, "history enumeration failed");
            ctx.notify("Fail: Delete History");
            return Err(e.into());
        }
    };

    let deletes = docs.iter().map(|doc| {
        let path = &path;
        async move { ctx.store.delete(path, &doc.id).await }
    });
    let failures: Vec<_> = join_all(deletes)
        .await
        .into_iter()
        .filter_map(Result::err)
        .collect();

    if let Some(e) = failures.into_iter().next() {
        tracing::warn!(error = %e, "history delete incomplete");
        ctx.notify("Fail: Delete History");
        return Err(e.into());
    }
    tracing::debug!(count = docs.len(), "deleted history");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::testutil::*;
    use crate::models::EntryDraft;

    #[tokio::test]
    async fn test_sequential_duplicates_record_once() {
        let fx = fixture();
        let list = fx.core.add_list("Groceries").await.unwrap();

        fx.core
            .add_entry(&list, EntryDraft::new("Milk", 1.0, "L", ""), None)
            .await
            .unwrap();
        fx.core
            .add_entry(&list, EntryDraft::new("Milk", 3.0, "L", ""), None)
            .await
            .unwrap();

        // Quantity is not part of the history identity.
        assert_eq!(fx.store.len(HISTORY).await, 1);
    }

    #[tokio::test]
    async fn test_differing_details_record_separately() {
        let fx = fixture();
        let list = fx.core.add_list("Groceries").await.unwrap();

        fx.core
            .add_entry(&list, EntryDraft::new("Milk", 1.0, "L", ""), None)
            .await
            .unwrap();
        fx.core
            .add_entry(&list, EntryDraft::new("Milk", 1.0, "L", "2%"), None)
            .await
            .unwrap();

        assert_eq!(fx.store.len(HISTORY).await, 2);
    }

    #[tokio::test]
    async fn test_get_history_returns_elements() {
        let fx = fixture();
        let list = fx.core.add_list("Groceries").await.unwrap();
        fx.core
            .add_entry(&list, EntryDraft::new("Milk", 1.0, "L", ""), None)
            .await
            .unwrap();

        let history = fx.core.get_history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].name, "Milk");
        assert_eq!(history[0].unit_of_quantity, "L");
    }

    #[tokio::test]
    async fn test_delete_history_element() {
        let fx = fixture();
        let list = fx.core.add_list("Groceries").await.unwrap();
        fx.core
            .add_entry(&list, EntryDraft::new("Milk", 1.0, "L", ""), None)
            .await
            .unwrap();

        let history = fx.core.get_history().await.unwrap();
        fx.core
            .delete_history_element(&history[0].uid)
            .await
            .unwrap();
        assert!(fx.store.is_empty(HISTORY).await);
    }

    #[tokio::test]
    async fn test_delete_history_clears_all_elements() {
        let fx = fixture();
        let list = fx.core.add_list("Groceries").await.unwrap();
        for name in ["Milk", "Eggs"] {
            fx.core
                .add_entry(&list, EntryDraft::new(name, 1.0, "", ""), None)
                .await
                .unwrap();
        }

        fx.core.delete_history().await.unwrap();
        assert!(fx.store.is_empty(HISTORY).await);
    }

    #[tokio::test]
    async fn test_partial_delete_failure_leaves_remainder() {
        let fx = fixture();
        let list = fx.core.add_list("Groceries").await.unwrap();
        fx.core
            .add_entry(&list, EntryDraft::new("Milk", 1.0, "L", ""), None)
            .await
            .unwrap();
        fx.core
            .add_entry(&list, EntryDraft::new("Eggs", 12.0, "", ""), None)
            .await
            .unwrap();
        let victim = fx.core.get_history().await.unwrap()[0].uid.clone();

        fx.store
            .fail_once("delete", &format!("{}/{}", HISTORY, victim))
            .await;
        assert!(fx.core.delete_history().await.is_err());

        // One element survived; nothing retries it.
        assert_eq!(fx.store.len(HISTORY).await, 1);
        assert!(fx.notifier.contains("Fail: Delete History"));
    }

    #[tokio::test]
    async fn test_insert_failure_is_notified_but_entry_stays() {
        let fx = fixture();
        let list = fx.core.add_list("Groceries").await.unwrap();

        fx.store.fail_once("create", HISTORY).await;
        let entry = fx
            .core
            .add_entry(&list, EntryDraft::new("Milk", 1.0, "L", ""), None)
            .await
            .unwrap();

        fetch_entry(&fx.store, &list.uid, &entry.uid).await;
        assert!(fx.store.is_empty(HISTORY).await);
        assert!(fx.notifier.contains("Fail: Add To History"));
    }
}
