use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, GetOptions, ObjectStore, PutOptions, PutPayload,
    Result as ObjectResult,
};
use reframe_core::ObjectReference;
use std::path::PathBuf;
use std::sync::Arc;

/// Bucket storage backed by any `object_store` implementation
#[derive(Clone)]
pub struct ObjectStoreStorage {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    backend: StorageBackend,
}

impl ObjectStoreStorage {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: String, backend: StorageBackend) -> Self {
        Self {
            store,
            bucket,
            backend,
        }
    }

    /// Google Cloud Storage bucket; credentials come from the standard `GOOGLE_*` variables.
    pub fn gcs(bucket: String) -> StorageResult<Self> {
        let store = GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(bucket.clone())
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(Self::new(Arc::new(store), bucket, StorageBackend::Gcs))
    }

    /// S3 bucket. `endpoint_url` points at an S3-compatible service; plain `http://` endpoints
    /// are allowed.
    pub fn s3(bucket: String, region: String, endpoint_url: Option<String>) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket.clone());

        if let Some(endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder.with_endpoint(endpoint).with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(Self::new(Arc::new(store), bucket, StorageBackend::S3))
    }

    /// Directory-backed bucket at `{base_path}/{bucket}`, created if missing.
    pub async fn local(base_path: impl Into<PathBuf>, bucket: String) -> StorageResult<Self> {
        let root = base_path.into().join(&bucket);

        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                root.display(),
                e
            ))
        })?;

        let store = LocalFileSystem::new_with_prefix(&root)
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(Self::new(Arc::new(store), bucket, StorageBackend::Local))
    }

    /// Process-local bucket, empty on creation
    pub fn in_memory(bucket: String) -> Self {
        Self::new(Arc::new(InMemory::new()), bucket, StorageBackend::Memory)
    }

    /// Validate a storage key and convert it to an object path
    fn key_to_path(storage_key: &str) -> StorageResult<Path> {
        if storage_key.is_empty()
            || storage_key.starts_with('/')
            || storage_key.split('/').any(|segment| segment == "..")
        {
            return Err(StorageError::InvalidKey(storage_key.to_string()));
        }

        Path::parse(storage_key)
            .map_err(|e| StorageError::InvalidKey(format!("{}: {}", storage_key, e)))
    }

    /// The local filesystem store rejects object attributes, so content types are only sent
    /// to backends that keep them.
    fn supports_attributes(&self) -> bool {
        !matches!(self.backend, StorageBackend::Local)
    }
}

#[async_trait]
impl Storage for ObjectStoreStorage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn backend_type(&self) -> StorageBackend {
        self.backend
    }

    fn list_objects(&self) -> BoxStream<'_, StorageResult<ObjectReference>> {
        let bucket = self.bucket.clone();

        self.store
            .list(None)
            .map(move |result| match result {
                Ok(meta) => Ok(ObjectReference::new(
                    meta.location.to_string(),
                    meta.last_modified,
                    meta.size,
                )),
                Err(e) => {
                    tracing::error!(error = %e, bucket = %bucket, "Object listing failed");
                    Err(StorageError::ListFailed(e.to_string()))
                }
            })
            .boxed()
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Bytes> {
        let location = Self::key_to_path(storage_key)?;
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = self
            .store
            .get_opts(&location, GetOptions::default())
            .await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(storage_key.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %self.bucket,
                    key = %storage_key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Download failed"
                );
                StorageError::DownloadFailed(other.to_string())
            }
        })?;

        // Drains and drops the response body before returning.
        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        tracing::info!(
            backend = %self.backend,
            bucket = %self.bucket,
            key = %storage_key,
            size_bytes = bytes.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Download successful"
        );

        Ok(bytes)
    }

    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<()> {
        let location = Self::key_to_path(storage_key)?;
        let size = data.len();
        let start = std::time::Instant::now();

        let mut attributes = Attributes::new();
        if self.supports_attributes() {
            attributes.insert(Attribute::ContentType, content_type.to_string().into());
        }
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        let result: ObjectResult<_> = self
            .store
            .put_opts(&location, PutPayload::from(data), options)
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %storage_key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            backend = %self.backend,
            bucket = %self.bucket,
            key = %storage_key,
            content_type = %content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload successful"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_in_memory_upload_download() {
        let storage = ObjectStoreStorage::in_memory("uploads".to_string());
        let data = Bytes::from_static(b"test data");

        storage
            .upload_with_key("photo.jpg", data.clone(), "image/jpeg")
            .await
            .unwrap();

        let downloaded = storage.download("photo.jpg").await.unwrap();
        assert_eq!(downloaded, data);
        assert_eq!(storage.bucket(), "uploads");
        assert_eq!(storage.backend_type(), StorageBackend::Memory);
    }

    #[tokio::test]
    async fn test_download_missing_object() {
        let storage = ObjectStoreStorage::in_memory("uploads".to_string());

        let result = storage.download("missing.png").await;
        assert!(matches!(result, Err(StorageError::NotFound(key)) if key == "missing.png"));
    }

    #[tokio::test]
    async fn test_list_objects_reports_metadata() {
        let storage = ObjectStoreStorage::in_memory("uploads".to_string());
        storage
            .upload_with_key("a.png", Bytes::from_static(b"12345"), "image/png")
            .await
            .unwrap();
        storage
            .upload_with_key("nested/b.jpg", Bytes::from_static(b"12"), "image/jpeg")
            .await
            .unwrap();

        let mut objects: Vec<ObjectReference> =
            storage.list_objects().try_collect().await.unwrap();
        objects.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].name, "a.png");
        assert_eq!(objects[0].size, 5);
        assert_eq!(objects[1].name, "nested/b.jpg");
        assert_eq!(objects[1].size, 2);
    }

    #[tokio::test]
    async fn test_upload_overwrites_existing_object() {
        let storage = ObjectStoreStorage::in_memory("uploads".to_string());
        storage
            .upload_with_key("resized_a.png", Bytes::from_static(b"first"), "image/png")
            .await
            .unwrap();
        storage
            .upload_with_key("resized_a.png", Bytes::from_static(b"second"), "image/png")
            .await
            .unwrap();

        let downloaded = storage.download("resized_a.png").await.unwrap();
        assert_eq!(downloaded, Bytes::from_static(b"second"));
    }

    #[tokio::test]
    async fn test_invalid_keys_rejected() {
        let storage = ObjectStoreStorage::in_memory("uploads".to_string());

        for key in ["", "/etc/passwd", "../secret.png", "a/../../b.png"] {
            let result = storage.download(key).await;
            assert!(
                matches!(result, Err(StorageError::InvalidKey(_))),
                "key {:?} should be rejected",
                key
            );
        }
    }

    #[tokio::test]
    async fn test_local_storage_round_trip() {
        let dir = tempdir().unwrap();
        let storage = ObjectStoreStorage::local(dir.path(), "uploads".to_string())
            .await
            .unwrap();

        storage
            .upload_with_key("photo.png", Bytes::from_static(b"png bytes"), "image/png")
            .await
            .unwrap();

        assert!(dir.path().join("uploads").join("photo.png").exists());

        let objects: Vec<ObjectReference> =
            storage.list_objects().try_collect().await.unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].name, "photo.png");

        let downloaded = storage.download("photo.png").await.unwrap();
        assert_eq!(downloaded, Bytes::from_static(b"png bytes"));
    }
}
