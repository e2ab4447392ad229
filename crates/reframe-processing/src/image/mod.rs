//! Image processing module
//!
//! - Header-only format detection (inspector)
//! - Ratio resizing and re-encoding (resize)

pub mod inspector;
pub mod resize;

pub use inspector::{inspect, inspect_header, FormatError, ImageHeader};
pub use resize::{ImageResizer, ResizeError, ResizeRatios, ResizedImage};
