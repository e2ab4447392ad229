//! Reframe Processing Library
//!
//! Image inspection, name/format validation, ratio resizing and the pipeline that ties them
//! to a bucket and the settings/provenance stores.

pub mod image;
pub mod pipeline;
pub mod validator;

// Re-export commonly used types
pub use crate::image::{
    inspect, inspect_header, FormatError, ImageHeader, ImageResizer, ResizeError, ResizeRatios,
    ResizedImage,
};
pub use pipeline::{
    Pipeline, PipelineError, PipelineFailure, PipelineOptions, PipelineState, RunContext,
    RunReport, Stage,
};
pub use validator::{expected_format, validate_format, ValidationError, ALLOWED_EXTENSIONS};
