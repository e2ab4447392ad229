//! In-flight image buffer

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

use super::OutputFormat;

/// Encoding of an image buffer as established by header inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatTag {
    Jpeg,
    Png,
    Unknown,
}

impl From<OutputFormat> for FormatTag {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Jpeg => FormatTag::Jpeg,
            OutputFormat::Png => FormatTag::Png,
        }
    }
}

impl Display for FormatTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FormatTag::Jpeg => write!(f, "jpeg"),
            FormatTag::Png => write!(f, "png"),
            FormatTag::Unknown => write!(f, "unknown"),
        }
    }
}

/// Raw image bytes plus the format they are known to hold.
///
/// Buffers are never mutated in place; each stage produces a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    pub bytes: Bytes,
    pub format: FormatTag,
}

impl ImageBuffer {
    /// Wrap freshly downloaded bytes whose format has not been inspected yet.
    pub fn unchecked(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            format: FormatTag::Unknown,
        }
    }

    pub fn with_format(self, format: FormatTag) -> Self {
        Self {
            bytes: self.bytes,
            format,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
