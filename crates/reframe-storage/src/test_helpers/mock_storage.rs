//! Mock Storage implementation for testing

use crate::{Storage, StorageBackend, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt};
use reframe_core::ObjectReference;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct StoredObject {
    reference: ObjectReference,
    data: Bytes,
    content_type: Option<String>,
}

/// Mock storage implementation that keeps objects in memory, in insertion order
#[derive(Clone)]
pub struct MockStorage {
    bucket: String,
    objects: Arc<Mutex<Vec<StoredObject>>>,
    fail_listing: Arc<AtomicBool>,
    fail_downloads: Arc<AtomicBool>,
    fail_uploads: Arc<AtomicBool>,
    downloads: Arc<AtomicUsize>,
    uploads: Arc<AtomicUsize>,
}

impl MockStorage {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Arc::new(Mutex::new(Vec::new())),
            fail_listing: Arc::new(AtomicBool::new(false)),
            fail_downloads: Arc::new(AtomicBool::new(false)),
            fail_uploads: Arc::new(AtomicBool::new(false)),
            downloads: Arc::new(AtomicUsize::new(0)),
            uploads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Add or replace an object with an explicit modification time
    pub fn put_object(&self, name: &str, last_modified: DateTime<Utc>, data: Bytes) {
        let reference = ObjectReference::new(name, last_modified, data.len() as u64);
        self.insert(StoredObject {
            reference,
            data,
            content_type: None,
        });
    }

    /// Make every subsequent listing fail
    pub fn fail_listing(&self) {
        self.fail_listing.store(true, Ordering::SeqCst);
    }

    /// Make every subsequent download fail
    pub fn fail_downloads(&self) {
        self.fail_downloads.store(true, Ordering::SeqCst);
    }

    /// Make every subsequent upload fail
    pub fn fail_uploads(&self) {
        self.fail_uploads.store(true, Ordering::SeqCst);
    }

    /// Number of download calls that reached the backend
    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    /// Number of successful uploads
    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    /// Object data, if present (for test assertions)
    pub fn get_object(&self, name: &str) -> Option<Bytes> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.reference.name == name)
            .map(|o| o.data.clone())
    }

    /// Content type recorded by the upload that wrote `name`
    pub fn content_type_of(&self, name: &str) -> Option<String> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.reference.name == name)
            .and_then(|o| o.content_type.clone())
    }

    pub fn has_object(&self, name: &str) -> bool {
        self.get_object(name).is_some()
    }

    fn insert(&self, object: StoredObject) {
        let mut objects = self.objects.lock().unwrap();
        match objects
            .iter_mut()
            .find(|o| o.reference.name == object.reference.name)
        {
            Some(existing) => *existing = object,
            None => objects.push(object),
        }
    }
}

#[async_trait]
impl Storage for MockStorage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }

    fn list_objects(&self) -> BoxStream<'_, StorageResult<ObjectReference>> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return stream::iter(vec![Err(StorageError::ListFailed(
                "injected listing failure".to_string(),
            ))])
            .boxed();
        }

        let references: Vec<StorageResult<ObjectReference>> = self
            .objects
            .lock()
            .unwrap()
            .iter()
            .map(|o| Ok(o.reference.clone()))
            .collect();
        stream::iter(references).boxed()
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Bytes> {
        self.downloads.fetch_add(1, Ordering::SeqCst);

        if self.fail_downloads.load(Ordering::SeqCst) {
            return Err(StorageError::DownloadFailed(
                "injected download failure".to_string(),
            ));
        }

        self.get_object(storage_key)
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))
    }

    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<()> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::UploadFailed(
                "injected upload failure".to_string(),
            ));
        }

        let reference = ObjectReference::new(storage_key, Utc::now(), data.len() as u64);
        self.insert(StoredObject {
            reference,
            data,
            content_type: Some(content_type.to_string()),
        });
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
