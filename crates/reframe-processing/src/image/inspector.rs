//! Image format inspection
//!
//! Identifies the real encoding of a buffer from its signature and parses just enough of the
//! header to report dimensions. Pixel data is never decoded here.

use image::{ImageFormat, ImageReader};
use reframe_core::FormatTag;
use std::io::Cursor;

const JPEG_SIGNATURE: [u8; 3] = [0xFF, 0xD8, 0xFF];
const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
}

/// Encoding and dimensions read from an image header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    pub format: FormatTag,
    pub width: u32,
    pub height: u32,
}

/// Determine whether `data` holds a JPEG or a PNG.
pub fn inspect(data: &[u8]) -> Result<FormatTag, FormatError> {
    inspect_header(data).map(|header| header.format)
}

/// Parse the header of a JPEG or PNG buffer.
///
/// A recognized signature followed by a header that cannot be parsed (for example a truncated
/// upload) is reported as `UnsupportedFormat`, the same as an unknown signature.
pub fn inspect_header(data: &[u8]) -> Result<ImageHeader, FormatError> {
    let (format, image_format) = match sniff(data) {
        FormatTag::Jpeg => (FormatTag::Jpeg, ImageFormat::Jpeg),
        FormatTag::Png => (FormatTag::Png, ImageFormat::Png),
        FormatTag::Unknown => {
            return Err(FormatError::UnsupportedFormat(
                "unrecognized signature".to_string(),
            ))
        }
    };

    let (width, height) = ImageReader::with_format(Cursor::new(data), image_format)
        .into_dimensions()
        .map_err(|e| FormatError::UnsupportedFormat(format!("invalid {} header: {}", format, e)))?;

    Ok(ImageHeader {
        format,
        width,
        height,
    })
}

/// Signature check only
fn sniff(data: &[u8]) -> FormatTag {
    if data.starts_with(&JPEG_SIGNATURE) {
        FormatTag::Jpeg
    } else if data.starts_with(&PNG_SIGNATURE) {
        FormatTag::Png
    } else {
        FormatTag::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};

    fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 40, 40]));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), format).unwrap();
        buffer
    }

    #[test]
    fn test_inspect_jpeg() {
        let data = encode(32, 16, ImageFormat::Jpeg);
        assert_eq!(inspect(&data).unwrap(), FormatTag::Jpeg);

        let header = inspect_header(&data).unwrap();
        assert_eq!((header.width, header.height), (32, 16));
    }

    #[test]
    fn test_inspect_png() {
        let data = encode(7, 9, ImageFormat::Png);
        let header = inspect_header(&data).unwrap();
        assert_eq!(header.format, FormatTag::Png);
        assert_eq!((header.width, header.height), (7, 9));
    }

    #[test]
    fn test_inspect_empty() {
        assert!(matches!(
            inspect(&[]),
            Err(FormatError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_inspect_non_image() {
        assert!(inspect(b"not an image").is_err());
        assert!(inspect(b"GIF89a\x01\x00\x01\x00\x00\x00\x00").is_err());
        assert!(inspect(b"%PDF-1.7\n").is_err());
    }

    #[test]
    fn test_inspect_truncated_headers() {
        let png = encode(8, 8, ImageFormat::Png);
        assert!(matches!(
            inspect(&png[..12]),
            Err(FormatError::UnsupportedFormat(_))
        ));

        let jpeg = encode(8, 8, ImageFormat::Jpeg);
        assert!(matches!(
            inspect(&jpeg[..4]),
            Err(FormatError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_signature_alone_is_not_enough() {
        assert!(inspect(&PNG_SIGNATURE).is_err());
        assert!(inspect(&JPEG_SIGNATURE).is_err());
    }
}
