//! Test helpers for code that depends on a bucket
//!
//! `MockStorage` keeps objects in memory with caller-chosen modification times, so selection
//! order can be pinned down exactly, and can be told to fail listing, downloads or uploads.

pub mod mock_storage;

pub use mock_storage::*;
