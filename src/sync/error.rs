//! Sync error types.

use crate::store::StoreError;

/// Errors surfaced by sync core operations.
#[derive(Debug)]
pub enum SyncError {
    /// No document server configured.
    NotConfigured,
    /// A gateway call failed.
    Store(StoreError),
    /// Blob upload failed; the entry keeps its previous image reference.
    Upload(String),
    /// The core was shut down while a pipeline was in flight.
    Cancelled,
    /// A cascading delete left child entries behind; the list document
    /// was not removed.
    IncompleteDelete { list_id: String, remaining: usize },
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::NotConfigured => {
                write!(f, "Sync not configured. Add server_url to config.")
            }
            SyncError::Store(e) => write!(f, "{}", e),
            SyncError::Upload(e) => write!(f, "Image upload failed: {}", e),
            SyncError::Cancelled => write!(f, "Operation cancelled"),
            SyncError::IncompleteDelete { list_id, remaining } => {
                write!(
                    f,
                    "Could not delete list {}: {} entries still present",
                    list_id, remaining
                )
            }
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for SyncError {
    fn from(e: StoreError) -> Self {
        SyncError::Store(e)
    }
}
