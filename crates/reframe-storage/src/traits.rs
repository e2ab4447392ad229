//! Storage abstraction trait
//!
//! This module defines the Storage trait that all bucket backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use reframe_core::ObjectReference;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Listing failed: {0}")]
    ListFailed(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// One handle is bound to one bucket. The pipeline only ever lists, reads whole objects and
/// writes whole objects, so that is all a backend has to provide.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Name of the bucket this handle is bound to
    fn bucket(&self) -> &str;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;

    /// Stream every object in the bucket together with its listing metadata.
    ///
    /// The stream is finite; callers consume it once.
    fn list_objects(&self) -> BoxStream<'_, StorageResult<ObjectReference>>;

    /// Read an object fully into memory
    async fn download(&self, storage_key: &str) -> StorageResult<Bytes>;

    /// Write `data` to `storage_key`, replacing any existing object with that name
    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<()>;
}
