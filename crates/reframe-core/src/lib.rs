//! Reframe Core Library
//!
//! This crate provides the domain models, configuration and error metadata shared by the
//! storage, database, processing and CLI crates.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{Config, DEFAULT_MAX_OUTPUT_PIXELS};
pub use error::{ErrorMetadata, LogLevel};
pub use models::{
    converted_object_name, file_extension, ConversionSetting, FormatTag, ImageBuffer,
    ObjectReference, OutputFormat, ProvenanceRecord, UnsupportedOutputFormat,
    CONVERTED_OBJECT_PREFIX,
};
pub use storage_types::StorageBackend;
