//! Async document-store gateway.
//!
//! The sync core talks to its backing store exclusively through the
//! [`DocumentStore`] trait: per-document create/update/delete/get plus an
//! ordered, optionally filtered collection query. Every operation completes
//! asynchronously and independently; the store offers no multi-document
//! transactions and no ordering guarantees across in-flight writes.
//!
//! Implementations are injected into the core, which keeps it testable
//! against [`memory::MemoryDocumentStore`] and deployable against
//! [`http::HttpDocumentStore`].

mod http;
mod memory;

pub use http::HttpDocumentStore;
pub use memory::MemoryDocumentStore;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Document field names as persisted in the store.
pub mod fields {
    pub const UID: &str = "uid";
    pub const NAME: &str = "name";
    pub const DONE: &str = "done";
    pub const DONE_COUNT: &str = "doneCount";
    pub const TOTAL_COUNT: &str = "totalCount";
    pub const NEXT_FREE_POSITION: &str = "nextFreePosition";
    pub const POSITION: &str = "position";
    pub const QUANTITY: &str = "quantity";
    pub const UNIT_OF_QUANTITY: &str = "unitOfQuantity";
    pub const DETAILS: &str = "details";
    pub const IMAGE_REF: &str = "imageRef";
}

/// Errors surfaced by gateway implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed document does not exist (e.g. removed by a
    /// concurrent delete).
    #[error("document not found: {collection}/{doc_id}")]
    NotFound { collection: String, doc_id: String },

    /// Transport-level or store-side failure of an async call.
    #[error("store error: {0}")]
    Transport(String),

    /// A document could not be encoded or decoded.
    #[error("invalid document data: {0}")]
    InvalidData(String),
}

/// A document read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Identifier of the document within its collection.
    pub id: String,
    /// The stored fields.
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Decodes the fields into a typed model.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        serde_json::from_value(Value::Object(self.fields.clone()))
            .map_err(|e| StoreError::InvalidData(e.to_string()))
    }
}

/// Encodes a model into the field map accepted by the gateway.
pub fn to_fields<T: Serialize>(model: &T) -> Result<Map<String, Value>, StoreError> {
    match serde_json::to_value(model) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::InvalidData(format!(
            "expected an object, got {}",
            other
        ))),
        Err(e) => Err(StoreError::InvalidData(e.to_string())),
    }
}

/// Equality filter for collection queries.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub equals: Value,
}

impl Filter {
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            equals: value.into(),
        }
    }
}

/// Primitive async CRUD/query operations against document collections.
///
/// Collection paths are slash-separated, e.g.
/// `Users/<user>/Lists/<list>/Entries`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Creates or replaces the document at `collection/doc_id`.
    async fn create(
        &self,
        collection: &str,
        doc_id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError>;

    /// Merges `partial` into an existing document.
    async fn update(
        &self,
        collection: &str,
        doc_id: &str,
        partial: Map<String, Value>,
    ) -> Result<(), StoreError>;

    /// Deletes a single document.
    async fn delete(&self, collection: &str, doc_id: &str) -> Result<(), StoreError>;

    /// Fetches a single document.
    async fn get(&self, collection: &str, doc_id: &str) -> Result<Document, StoreError>;

    /// Fetches all documents in a collection, optionally ordered by a
    /// field and filtered by equality on a field.
    async fn query(
        &self,
        collection: &str,
        order_by: Option<&str>,
        filter: Option<&Filter>,
    ) -> Result<Vec<Document>, StoreError>;
}
