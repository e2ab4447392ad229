//! Test fixtures: images generated with the `image` crate.

use bytes::Bytes;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

fn pattern(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 3 % 256) as u8, (y * 3 % 256) as u8, 128])
    }))
}

fn encode(img: DynamicImage, format: ImageFormat) -> Bytes {
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), format).unwrap();
    Bytes::from(buffer)
}

pub fn jpeg(width: u32, height: u32) -> Bytes {
    encode(pattern(width, height), ImageFormat::Jpeg)
}

pub fn png(width: u32, height: u32) -> Bytes {
    encode(pattern(width, height), ImageFormat::Png)
}

/// Width and height of an encoded image
pub fn dimensions(data: &[u8]) -> (u32, u32) {
    image::ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .unwrap()
        .into_dimensions()
        .unwrap()
}
