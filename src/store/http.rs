//! HTTP document store backed by a REST-style document server.
//!
//! Wire conventions: a document lives at `<base>/<collection>/<doc_id>`.
//! `PUT` creates or replaces, `PATCH` merges partial fields, `DELETE`
//! removes, `GET` returns the field object. A collection query is a `GET`
//! on the collection path with optional `orderBy`, `whereField` and
//! `whereEquals` parameters, returning a JSON array of field objects; the
//! document id is taken from each object's `uid` field.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{fields, Document, DocumentStore, Filter, StoreError};

/// A [`DocumentStore`] speaking JSON over HTTP.
pub struct HttpDocumentStore {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpDocumentStore {
    /// Creates a new store for the given server.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("Authorization", format!("Bearer {}", key)),
            None => request,
        }
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        collection: &str,
        doc_id: Option<&str>,
    ) -> Result<reqwest::Response, StoreError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                doc_id: doc_id.unwrap_or_default().to_string(),
            });
        }
        if !status.is_success() {
            return Err(StoreError::Transport(format!(
                "server returned status {}",
                status
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn create(
        &self,
        collection: &str,
        doc_id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let url = self.url(&format!("{}/{}", collection, doc_id));
        self.send(self.client.put(&url).json(&fields), collection, Some(doc_id))
            .await?;
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        doc_id: &str,
        partial: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let url = self.url(&format!("{}/{}", collection, doc_id));
        self.send(
            self.client.patch(&url).json(&partial),
            collection,
            Some(doc_id),
        )
        .await?;
        Ok(())
    }

    async fn delete(&self, collection: &str, doc_id: &str) -> Result<(), StoreError> {
        let url = self.url(&format!("{}/{}", collection, doc_id));
        self.send(self.client.delete(&url), collection, Some(doc_id))
            .await?;
        Ok(())
    }

    async fn get(&self, collection: &str, doc_id: &str) -> Result<Document, StoreError> {
        let url = self.url(&format!("{}/{}", collection, doc_id));
        let response = self
            .send(self.client.get(&url), collection, Some(doc_id))
            .await?;
        let fields: Map<String, Value> = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidData(e.to_string()))?;
        Ok(Document::new(doc_id, fields))
    }

    async fn query(
        &self,
        collection: &str,
        order_by: Option<&str>,
        filter: Option<&Filter>,
    ) -> Result<Vec<Document>, StoreError> {
        let url = self.url(collection);
        let mut request = self.client.get(&url);
        if let Some(field) = order_by {
            request = request.query(&[("orderBy", field)]);
        }
        if let Some(filter) = filter {
            request = request.query(&[
                ("whereField", filter.field.as_str()),
                ("whereEquals", &filter.equals.to_string()),
            ]);
        }

        let response = self.send(request, collection, None).await?;
        let rows: Vec<Map<String, Value>> = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidData(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let id = row
                    .get(fields::UID)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                Document::new(id, row)
            })
            .collect())
    }
}
