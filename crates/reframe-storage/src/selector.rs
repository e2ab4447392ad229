//! Latest-object selection
//!
//! The selector walks a bucket listing once and keeps the object with the newest modification
//! time. Only listing metadata is consulted; no object content is fetched.

use crate::traits::{Storage, StorageError, StorageResult};
use futures::{pin_mut, Stream, StreamExt};
use reframe_core::ObjectReference;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SelectError {
    #[error("No objects found in bucket {0}")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Pick the most recently modified object in the storage handle's bucket.
pub async fn select_latest(storage: &dyn Storage) -> Result<ObjectReference, SelectError> {
    let bucket = storage.bucket().to_string();

    let latest = latest_in(storage.list_objects()).await?;

    match latest {
        Some(object) => {
            tracing::info!(
                bucket = %bucket,
                object = %object.name,
                last_modified = %object.last_modified,
                size_bytes = object.size,
                "Selected latest object"
            );
            Ok(object)
        }
        None => {
            tracing::warn!(bucket = %bucket, "Bucket is empty");
            Err(SelectError::NotFound(bucket))
        }
    }
}

/// Reduce a listing to the object with the greatest `last_modified`.
///
/// A later entry replaces the candidate only when its timestamp is strictly greater, so ties
/// resolve to the first entry seen. The first listing error ends the scan.
pub async fn latest_in<S>(objects: S) -> StorageResult<Option<ObjectReference>>
where
    S: Stream<Item = StorageResult<ObjectReference>>,
{
    pin_mut!(objects);

    let mut latest: Option<ObjectReference> = None;
    while let Some(object) = objects.next().await {
        let object = object?;
        match &latest {
            Some(current) if object.last_modified <= current.last_modified => {}
            _ => latest = Some(object),
        }
    }

    Ok(latest)
}
