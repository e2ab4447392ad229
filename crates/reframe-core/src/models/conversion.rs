//! Conversion settings model

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Raised when a configured output format is neither JPEG nor PNG.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported output format: {0}")]
pub struct UnsupportedOutputFormat(pub String);

/// Encodings the resize engine can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn to_mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = UnsupportedOutputFormat;

    /// `jpg` is accepted as an alias because older settings rows were seeded with it.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            _ => Err(UnsupportedOutputFormat(s.to_string())),
        }
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            OutputFormat::Jpeg => write!(f, "jpeg"),
            OutputFormat::Png => write!(f, "png"),
        }
    }
}

/// One row of `image_conversion_settings`, resolved for a job id.
///
/// Ratios multiply the source dimensions; they are carried exactly as stored and are
/// validated by the resize engine, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionSetting {
    pub id: i32,
    pub output_format: OutputFormat,
    pub width_ratio: f64,
    pub height_ratio: f64,
}
