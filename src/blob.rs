//! Async blob storage gateway for image uploads.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::store::StoreError;

/// Upload primitive consumed by the image attachment pipeline.
///
/// `upload` stores the bytes under `key` and resolves to the remote
/// download reference clients should persist.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, key: &str, bytes: &[u8]) -> Result<String, StoreError>;
}

/// In-memory [`BlobStore`] for tests and embedding.
///
/// Resolves uploads to `memory://<key>` references.
#[derive(Default)]
pub struct MemoryBlobStore {
    uploads: Mutex<Vec<(String, Vec<u8>)>>,
    fail_next: Mutex<bool>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next upload fail with a transport error.
    pub async fn fail_next_upload(&self) {
        *self.fail_next.lock().await = true;
    }

    /// Number of blobs uploaded so far.
    pub async fn upload_count(&self) -> usize {
        self.uploads.lock().await.len()
    }

    /// Size in bytes of the most recent upload, if any.
    pub async fn last_upload_size(&self) -> Option<usize> {
        self.uploads.lock().await.last().map(|(_, bytes)| bytes.len())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, key: &str, bytes: &[u8]) -> Result<String, StoreError> {
        {
            let mut fail = self.fail_next.lock().await;
            if *fail {
                *fail = false;
                return Err(StoreError::Transport("injected upload failure".to_string()));
            }
        }
        self.uploads
            .lock()
            .await
            .push((key.to_string(), bytes.to_vec()));
        Ok(format!("memory://{}", key))
    }
}

/// Response body of a successful blob upload.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

/// A [`BlobStore`] posting bytes to an HTTP blob server.
///
/// The server is expected to answer `POST <base>/<key>` with
/// `{"url": "<download reference>"}`.
pub struct HttpBlobStore {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpBlobStore {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn upload(&self, key: &str, bytes: &[u8]) -> Result<String, StoreError> {
        let url = format!("{}/{}", self.base_url, key);
        let mut request = self.client.post(&url).body(bytes.to_vec());
        if let Some(api_key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(StoreError::Transport(format!(
                "upload returned status {}",
                response.status()
            )));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidData(e.to_string()))?;
        Ok(body.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_upload_resolves_reference() {
        let blobs = MemoryBlobStore::new();
        let reference = blobs.upload("uploads/abc", b"bytes").await.unwrap();
        assert_eq!(reference, "memory://uploads/abc");
        assert_eq!(blobs.upload_count().await, 1);
    }

    #[tokio::test]
    async fn test_memory_fail_next_upload() {
        let blobs = MemoryBlobStore::new();
        blobs.fail_next_upload().await;
        assert!(blobs.upload("uploads/abc", b"bytes").await.is_err());
        assert!(blobs.upload("uploads/abc", b"bytes").await.is_ok());
    }
}
