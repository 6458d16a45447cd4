//! Derived done/total counter maintenance.

use serde_json::Value;

use crate::store::fields;

use super::SyncContext;

/// Recomputes and persists a list's counters from its entry documents.
///
/// This is a full rescan, not an increment: the entry collection is
/// queried, `done == true` entries are counted, and both counters are
/// written back in one partial update. Any transient drift heals on the
/// next successful recompute. Failures are notified and left for a later
/// mutation to repair; the triggering entry write is never rolled back.
pub(crate) async fn recompute(ctx: &SyncContext, list_id: &str) {
    let entries_path = ctx.entries_path(list_id);
    let docs = match ctx.store.query(&entries_path, None, None).await {
        Ok(docs) => docs,
        Err(e) => {
            tracing::warn!(list = list_id, error = %e, "counter query failed");
            ctx.notify("Fail: Update List Counter");
            return;
        }
    };

    let total = docs.len() as u64;
    let done = docs
        .iter()
        .filter(|doc| {
            doc.fields
                .get(fields::DONE)
                .and_then(Value::as_bool)
                .unwrap_or(false)
        })
        .count() as u64;

    let mut partial = serde_json::Map::new();
    partial.insert(fields::DONE_COUNT.to_string(), done.into());
    partial.insert(fields::TOTAL_COUNT.to_string(), total.into());

    match ctx.store.update(&ctx.lists_path(), list_id, partial).await {
        Ok(()) => {
            tracing::debug!(list = list_id, done, total, "recomputed counters");
        }
        Err(e) => {
            tracing::warn!(list = list_id, error = %e, "counter update failed");
            ctx.notify("Fail: Update List Counter");
        }
    }
}
