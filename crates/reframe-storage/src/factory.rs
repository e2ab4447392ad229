use crate::{ObjectStoreStorage, Storage, StorageBackend, StorageError, StorageResult};
use reframe_core::Config;
use std::sync::Arc;

/// Create the bucket handle selected by configuration
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    let bucket = config.bucket_name.clone();
    if bucket.is_empty() {
        return Err(StorageError::ConfigError(
            "BUCKET_NAME not configured".to_string(),
        ));
    }

    let storage = match config.storage_backend {
        StorageBackend::Gcs => ObjectStoreStorage::gcs(bucket)?,

        StorageBackend::S3 => {
            let region = config.s3_region.clone().ok_or_else(|| {
                StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
            })?;
            ObjectStoreStorage::s3(bucket, region, config.s3_endpoint.clone())?
        }

        StorageBackend::Local => {
            let base_path = config.local_storage_path.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;
            ObjectStoreStorage::local(base_path, bucket).await?
        }

        StorageBackend::Memory => ObjectStoreStorage::in_memory(bucket),
    };

    tracing::info!(
        backend = %storage.backend_type(),
        bucket = %storage.bucket(),
        "Storage backend initialized"
    );

    Ok(Arc::new(storage))
}
