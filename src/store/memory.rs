//! In-memory document store for tests and embedding.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use super::{Document, DocumentStore, Filter, StoreError};

/// An in-memory [`DocumentStore`] with one-shot fault injection.
///
/// Collections are keyed by path; documents within a collection keep a
/// stable iteration order. `fail_once` arms a single failure for a given
/// operation and target, letting tests exercise the partial-failure paths
/// of the sync core without a real backend.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: Mutex<HashMap<String, BTreeMap<String, Map<String, Value>>>>,
    failures: Mutex<HashSet<String>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a one-shot failure for `op` ("create", "update", "delete",
    /// "get" or "query") against `target`: either `collection/doc_id`
    /// for a single document or a bare collection path to trip the next
    /// call touching that collection.
    pub async fn fail_once(&self, op: &str, target: &str) {
        self.failures
            .lock()
            .await
            .insert(format!("{} {}", op, target));
    }

    /// Number of documents currently stored in `collection`.
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .await
            .get(collection)
            .map(|c| c.len())
            .unwrap_or(0)
    }

    pub async fn is_empty(&self, collection: &str) -> bool {
        self.len(collection).await == 0
    }

    async fn trip(&self, op: &str, collection: &str, doc_id: Option<&str>) -> Result<(), StoreError> {
        let mut failures = self.failures.lock().await;
        let keys = [
            doc_id.map(|id| format!("{} {}/{}", op, collection, id)),
            Some(format!("{} {}", op, collection)),
        ];
        for key in keys.into_iter().flatten() {
            if failures.remove(&key) {
                return Err(StoreError::Transport(format!("injected failure: {}", key)));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create(
        &self,
        collection: &str,
        doc_id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        self.trip("create", collection, Some(doc_id)).await?;
        self.collections
            .lock()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(doc_id.to_string(), fields);
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        doc_id: &str,
        partial: Map<String, Value>,
    ) -> Result<(), StoreError> {
        self.trip("update", collection, Some(doc_id)).await?;
        let mut collections = self.collections.lock().await;
        let doc = collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(doc_id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                doc_id: doc_id.to_string(),
            })?;
        for (key, value) in partial {
            doc.insert(key, value);
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, doc_id: &str) -> Result<(), StoreError> {
        self.trip("delete", collection, Some(doc_id)).await?;
        if let Some(docs) = self.collections.lock().await.get_mut(collection) {
            docs.remove(doc_id);
        }
        Ok(())
    }

    async fn get(&self, collection: &str, doc_id: &str) -> Result<Document, StoreError> {
        self.trip("get", collection, Some(doc_id)).await?;
        self.collections
            .lock()
            .await
            .get(collection)
            .and_then(|c| c.get(doc_id))
            .map(|fields| Document::new(doc_id, fields.clone()))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                doc_id: doc_id.to_string(),
            })
    }

    async fn query(
        &self,
        collection: &str,
        order_by: Option<&str>,
        filter: Option<&Filter>,
    ) -> Result<Vec<Document>, StoreError> {
        self.trip("query", collection, None).await?;
        let collections = self.collections.lock().await;
        let mut docs: Vec<Document> = collections
            .get(collection)
            .map(|c| {
                c.iter()
                    .map(|(id, fields)| Document::new(id, fields.clone()))
                    .collect()
            })
            .unwrap_or_default();
        if let Some(filter) = filter {
            docs.retain(|doc| doc.fields.get(&filter.field) == Some(&filter.equals));
        }
        if let Some(field) = order_by {
            docs.sort_by(|a, b| compare_fields(a, b, field));
        }
        Ok(docs)
    }
}

fn compare_fields(a: &Document, b: &Document, field: &str) -> Ordering {
    match (a.fields.get(field), b.fields.get(field)) {
        (Some(x), Some(y)) => compare_values(x, y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_values(x: &Value, y: &Value) -> Ordering {
    match (x.as_f64(), y.as_f64()) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        _ => match (x.as_str(), y.as_str()) {
            (Some(a), Some(b)) => a.cmp(b),
            _ => x.to_string().cmp(&y.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(fields: Value) -> Map<String, Value> {
        fields.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = MemoryDocumentStore::new();
        store
            .create("Lists", "a", doc(json!({"name": "Groceries"})))
            .await
            .unwrap();

        let fetched = store.get("Lists", "a").await.unwrap();
        assert_eq!(fetched.id, "a");
        assert_eq!(
            fetched.fields.get("name").and_then(Value::as_str),
            Some("Groceries")
        );
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = MemoryDocumentStore::new();
        let err = store.get("Lists", "nope").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = MemoryDocumentStore::new();
        store
            .create("Lists", "a", doc(json!({"name": "Groceries", "totalCount": 0})))
            .await
            .unwrap();
        store
            .update("Lists", "a", doc(json!({"totalCount": 3})))
            .await
            .unwrap();

        let fetched = store.get("Lists", "a").await.unwrap();
        assert_eq!(
            fetched.fields.get("name").and_then(Value::as_str),
            Some("Groceries")
        );
        assert_eq!(
            fetched.fields.get("totalCount").and_then(Value::as_i64),
            Some(3)
        );
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = MemoryDocumentStore::new();
        let err = store
            .update("Lists", "nope", doc(json!({"name": "x"})))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryDocumentStore::new();
        store
            .create("Lists", "a", doc(json!({"name": "x"})))
            .await
            .unwrap();
        store.delete("Lists", "a").await.unwrap();
        store.delete("Lists", "a").await.unwrap();
        assert!(store.is_empty("Lists").await);
    }

    #[tokio::test]
    async fn test_query_orders_by_field() {
        let store = MemoryDocumentStore::new();
        store
            .create("Entries", "b", doc(json!({"name": "b", "position": 2})))
            .await
            .unwrap();
        store
            .create("Entries", "a", doc(json!({"name": "a", "position": 0})))
            .await
            .unwrap();
        store
            .create("Entries", "c", doc(json!({"name": "c", "position": 1})))
            .await
            .unwrap();

        let docs = store.query("Entries", Some("position"), None).await.unwrap();
        let names: Vec<&str> = docs
            .iter()
            .filter_map(|d| d.fields.get("name").and_then(Value::as_str))
            .collect();
        assert_eq!(names, vec!["a", "c", "b"]);
    }

    #[tokio::test]
    async fn test_query_filters_by_equality() {
        let store = MemoryDocumentStore::new();
        store
            .create("Entries", "a", doc(json!({"name": "a", "done": true})))
            .await
            .unwrap();
        store
            .create("Entries", "b", doc(json!({"name": "b", "done": false})))
            .await
            .unwrap();

        let filter = Filter::equals("done", true);
        let docs = store.query("Entries", None, Some(&filter)).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "a");
    }

    #[tokio::test]
    async fn test_fail_once_trips_exactly_once() {
        let store = MemoryDocumentStore::new();
        store
            .create("Lists", "a", doc(json!({"name": "x"})))
            .await
            .unwrap();

        store.fail_once("delete", "Lists/a").await;
        assert!(store.delete("Lists", "a").await.is_err());
        assert!(store.delete("Lists", "a").await.is_ok());
    }
}
