//! Reframe Storage Library
//!
//! This crate provides the bucket abstraction used by the conversion pipeline: the `Storage`
//! trait, an implementation over the `object_store` crate (Google Cloud Storage, S3, local
//! filesystem, in-memory) and the latest-object selector.
//!
//! # Object keys
//!
//! Keys are bucket-relative object names such as `photo.jpg` or `uploads/photo.jpg`. Keys must
//! not be empty, contain `..` segments or start with `/`.

pub mod factory;
pub mod object_storage;
pub mod selector;
pub mod test_helpers;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use object_storage::ObjectStoreStorage;
pub use reframe_core::StorageBackend;
pub use selector::{latest_in, select_latest, SelectError};
pub use traits::{Storage, StorageError, StorageResult};
