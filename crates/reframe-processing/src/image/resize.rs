//! Ratio-based resizing
//!
//! Target dimensions are `floor(source * ratio)` per axis. Images are resampled with Lanczos3
//! and re-encoded as JPEG or PNG.

use crate::image::inspector::inspect_header;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use reframe_core::{
    ConversionSetting, FormatTag, ImageBuffer, OutputFormat, DEFAULT_MAX_OUTPUT_PIXELS,
};
use std::io::Cursor;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResizeError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Invalid resize ratios: width {width_ratio}, height {height_ratio}")]
    InvalidRatio { width_ratio: f64, height_ratio: f64 },

    #[error("Target dimensions {width}x{height} collapse to zero")]
    ZeroDimension { width: f64, height: f64 },

    #[error("Image of {width}x{height} exceeds the limit of {max_pixels} pixels")]
    TooLarge {
        width: u64,
        height: u64,
        max_pixels: u64,
    },

    #[error("Failed to encode image: {0}")]
    Encode(String),
}

/// Multipliers applied to the source width and height
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeRatios {
    pub width: f64,
    pub height: f64,
}

impl ResizeRatios {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Both ratios must be finite and strictly positive.
    pub fn validate(&self) -> Result<(), ResizeError> {
        let valid = |r: f64| r.is_finite() && r > 0.0;
        if valid(self.width) && valid(self.height) {
            Ok(())
        } else {
            Err(ResizeError::InvalidRatio {
                width_ratio: self.width,
                height_ratio: self.height,
            })
        }
    }
}

impl From<&ConversionSetting> for ResizeRatios {
    fn from(setting: &ConversionSetting) -> Self {
        Self::new(setting.width_ratio, setting.height_ratio)
    }
}

/// Output of a resize: the encoded image plus source and target dimensions
#[derive(Debug, Clone, PartialEq)]
pub struct ResizedImage {
    pub buffer: ImageBuffer,
    pub source_width: u32,
    pub source_height: u32,
    pub width: u32,
    pub height: u32,
}

/// Resizes validated JPEG/PNG buffers by ratio
#[derive(Debug, Clone, Copy)]
pub struct ImageResizer {
    max_pixels: Option<u64>,
    jpeg_quality: Option<u8>,
}

impl Default for ImageResizer {
    fn default() -> Self {
        Self {
            max_pixels: Some(DEFAULT_MAX_OUTPUT_PIXELS),
            jpeg_quality: None,
        }
    }
}

impl ImageResizer {
    /// `max_pixels` of `None` disables the size guard; `jpeg_quality` of `None` keeps the
    /// encoder default (75).
    pub fn new(max_pixels: Option<u64>, jpeg_quality: Option<u8>) -> Self {
        Self {
            max_pixels,
            jpeg_quality,
        }
    }

    /// Compute `(floor(src_width * width_ratio), floor(src_height * height_ratio))`.
    pub fn target_dimensions(
        src_width: u32,
        src_height: u32,
        ratios: ResizeRatios,
    ) -> Result<(u32, u32), ResizeError> {
        ratios.validate()?;

        let width = (src_width as f64 * ratios.width).floor();
        let height = (src_height as f64 * ratios.height).floor();

        if width < 1.0 || height < 1.0 {
            return Err(ResizeError::ZeroDimension { width, height });
        }
        if width > u32::MAX as f64 || height > u32::MAX as f64 {
            return Err(ResizeError::TooLarge {
                width: width as u64,
                height: height as u64,
                max_pixels: u32::MAX as u64,
            });
        }

        Ok((width as u32, height as u32))
    }

    fn check_pixels(&self, width: u64, height: u64) -> Result<(), ResizeError> {
        match self.max_pixels {
            Some(max_pixels) if width.saturating_mul(height) > max_pixels => {
                Err(ResizeError::TooLarge {
                    width,
                    height,
                    max_pixels,
                })
            }
            _ => Ok(()),
        }
    }

    /// Decode `source`, resample to the ratio-derived dimensions and encode as `format`.
    ///
    /// CPU bound; async callers should run it on a blocking thread.
    pub fn resize(
        &self,
        source: &ImageBuffer,
        ratios: ResizeRatios,
        format: OutputFormat,
    ) -> Result<ResizedImage, ResizeError> {
        ratios.validate()?;

        let header =
            inspect_header(&source.bytes).map_err(|e| ResizeError::Decode(e.to_string()))?;
        self.check_pixels(header.width as u64, header.height as u64)?;

        let (width, height) = Self::target_dimensions(header.width, header.height, ratios)?;
        self.check_pixels(width as u64, height as u64)?;

        let image_format = match header.format {
            FormatTag::Png => ImageFormat::Png,
            _ => ImageFormat::Jpeg,
        };
        let img = ImageReader::with_format(Cursor::new(&source.bytes[..]), image_format)
            .decode()
            .map_err(|e| ResizeError::Decode(e.to_string()))?;

        let resized = img.resize_exact(width, height, FilterType::Lanczos3);
        let bytes = self.encode(resized, format)?;

        tracing::debug!(
            source_width = header.width,
            source_height = header.height,
            width,
            height,
            output_format = %format,
            size_bytes = bytes.len(),
            "Image resized"
        );

        Ok(ResizedImage {
            buffer: ImageBuffer {
                bytes,
                format: FormatTag::from(format),
            },
            source_width: header.width,
            source_height: header.height,
            width,
            height,
        })
    }

    fn encode(&self, img: DynamicImage, format: OutputFormat) -> Result<Bytes, ResizeError> {
        let estimated_size = (img.width() as usize) * (img.height() as usize) * 3 / 4;
        let mut buffer = Vec::with_capacity(estimated_size);

        let result = match format {
            OutputFormat::Jpeg => {
                // JPEG has no alpha channel
                let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
                let encoder = match self.jpeg_quality {
                    Some(quality) => JpegEncoder::new_with_quality(&mut buffer, quality),
                    None => JpegEncoder::new(&mut buffer),
                };
                rgb.write_with_encoder(encoder)
            }
            OutputFormat::Png => img.write_with_encoder(PngEncoder::new(&mut buffer)),
        };
        result.map_err(|e| ResizeError::Encode(e.to_string()))?;

        Ok(Bytes::from(buffer))
    }
}
