//! Image attachment pipeline.
//!
//! Each entry mutation that supplies an image runs one pipeline instance:
//!
//! ```text
//! Start -> (remote reference)  UpdateEntryRef -> RecordHistory -> Done
//!       -> (local reference)   Compress -> Upload -> UpdateEntryRef -> RecordHistory -> Done
//! ```
//!
//! A reference that already looks remote is never re-uploaded. Compression
//! is best-effort; upload failure aborts the pipeline before any write, so
//! the entry keeps the image reference it had. History is only recorded
//! after the reference update lands, so history never points at a
//! half-finished upload.

use serde_json::Map;
use uuid::Uuid;

use crate::models::ShoppingEntry;
use crate::store::fields;

use super::{history, SyncContext, SyncError};

/// An image supplied alongside an entry mutation.
#[derive(Debug, Clone)]
pub struct ImageSource {
    /// Remote download reference, or a local reference pending upload.
    pub reference: String,
    /// Raw bytes of the local asset; empty for an already-remote reference.
    pub bytes: Vec<u8>,
}

impl ImageSource {
    /// An already-resolved remote reference (entry edited without
    /// touching its photo).
    pub fn remote(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            bytes: Vec::new(),
        }
    }

    /// A local asset awaiting compression and upload.
    pub fn local(reference: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            reference: reference.into(),
            bytes,
        }
    }
}

/// Best-effort image compression hook.
///
/// Returns `None` when compression fails or is inapplicable; the pipeline
/// then uploads the original bytes unchanged.
pub trait ImageCompressor: Send + Sync {
    fn compress(&self, bytes: &[u8]) -> Option<Vec<u8>>;
}

/// Compressor that never compresses; every upload sends the original.
pub struct NoCompression;

impl ImageCompressor for NoCompression {
    fn compress(&self, _bytes: &[u8]) -> Option<Vec<u8>> {
        None
    }
}

/// Whether `reference` already resolves on the remote store.
///
/// A remote reference begins with a URL scheme (`https://...`); anything
/// else is a local reference awaiting upload.
pub(crate) fn is_remote_reference(reference: &str) -> bool {
    match reference.split_once("://") {
        Some((scheme, rest)) => {
            !scheme.is_empty()
                && !rest.is_empty()
                && scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
        }
        None => false,
    }
}

/// Runs the pipeline for `entry`, resolving and persisting its image
/// reference and feeding the result into history.
///
/// Returns the resolved remote reference on success.
pub(crate) async fn attach(
    ctx: &SyncContext,
    list_id: &str,
    entry: &ShoppingEntry,
    source: ImageSource,
) -> Result<String, SyncError> {
    ctx.ensure_live()?;

    let resolved = if is_remote_reference(&source.reference) {
        source.reference
    } else {
        // Compress best-effort, falling back to the original bytes.
        let payload = match ctx.compressor.compress(&source.bytes) {
            Some(compressed) => compressed,
            None => source.bytes,
        };

        ctx.ensure_live()?;
        let key = format!("uploads/{}", Uuid::new_v4());
        match ctx.blobs.upload(&key, &payload).await {
            Ok(reference) => reference,
            Err(e) => {
                tracing::warn!(entry = %entry.uid, error = %e, "image upload failed");
                ctx.notify("Fail: Upload Image");
                return Err(SyncError::Upload(e.to_string()));
            }
        }
    };

    ctx.ensure_live()?;
    let mut partial = Map::new();
    partial.insert(fields::IMAGE_REF.to_string(), resolved.clone().into());
    if let Err(e) = ctx
        .store
        .update(&ctx.entries_path(list_id), &entry.uid, partial)
        .await
    {
        tracing::warn!(entry = %entry.uid, error = %e, "image reference update failed");
        ctx.notify("Fail: Update Image");
        return Err(e.into());
    }
    tracing::debug!(entry = %entry.uid, "updated image reference");

    // History must only ever see the resolved reference.
    let mut element = entry.extract_history_element();
    element.image_ref = Some(resolved.clone());
    let _ = history::record_if_new(ctx, element).await;

    Ok(resolved)
}
