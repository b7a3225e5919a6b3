//! Binary blob storage boundary, used for event cover images.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors surfaced by blob operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlobError {
    /// The store could not be reached
    #[error("blob store unavailable: {0}")]
    Unavailable(String),

    /// No blob exists at the referenced path
    #[error("blob not found: {0}")]
    NotFound(String),
}

/// Reference to a stored blob, resolvable to a public URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobRef(pub String);

impl BlobRef {
    /// The storage path this reference points at.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.0
    }
}

/// The blob storage boundary.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload `bytes` at `path`, returning a reference to the stored blob.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError::Unavailable`] when the store is unreachable.
    async fn upload(&self, bytes: Vec<u8>, path: &str) -> Result<BlobRef, BlobError>;

    /// Resolve a reference to a URL suitable for embedding in a document.
    ///
    /// # Errors
    ///
    /// Returns [`BlobError::NotFound`] when nothing is stored at the
    /// referenced path.
    async fn resolve(&self, blob: &BlobRef) -> Result<String, BlobError>;
}

/// In-memory [`BlobStore`] for tests and the demo.
#[derive(Default)]
pub struct MemoryBlobs {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobs {
    /// Create an empty blob store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs. Lets tests observe uploads whose owning
    /// document was never created.
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    /// Whether the store holds no blobs.
    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobs {
    async fn upload(&self, bytes: Vec<u8>, path: &str) -> Result<BlobRef, BlobError> {
        self.blobs.write().await.insert(path.to_string(), bytes);
        Ok(BlobRef(path.to_string()))
    }

    async fn resolve(&self, blob: &BlobRef) -> Result<String, BlobError> {
        let blobs = self.blobs.read().await;
        if blobs.contains_key(blob.path()) {
            Ok(format!("memory://{}", blob.path()))
        } else {
            Err(BlobError::NotFound(blob.path().to_string()))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upload_then_resolve() {
        let blobs = MemoryBlobs::new();
        let blob = blobs
            .upload(vec![1, 2, 3], "images/1_cover.png")
            .await
            .unwrap();
        let url = blobs.resolve(&blob).await.unwrap();
        assert_eq!(url, "memory://images/1_cover.png");
        assert_eq!(blobs.len().await, 1);
    }

    #[tokio::test]
    async fn resolve_unknown_path_is_not_found() {
        let blobs = MemoryBlobs::new();
        let err = blobs
            .resolve(&BlobRef("images/missing.png".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err, BlobError::NotFound("images/missing.png".to_string()));
    }
}
