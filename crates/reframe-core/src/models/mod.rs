//! Data models for the application
//!
//! Each sub-module covers one piece of the conversion run: the persisted conversion settings,
//! the bucket object being processed, the in-flight image buffer and the provenance record.

mod conversion;
mod image;
mod object;
mod provenance;

pub use conversion::*;
pub use image::*;
pub use object::*;
pub use provenance::*;
