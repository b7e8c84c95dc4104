//! Shared test utilities: synthetic source images written with the `image` crate.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! let src = tmp.path().join("photo.png");
//! create_test_png(&src, 400, 300);
//! ```

use image::{ImageEncoder, RgbImage, RgbaImage};
use std::path::Path;

fn ensure_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
}

/// Gradient RGB test pattern, so encoders have something non-trivial to compress.
fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Create a small valid JPEG file with the given dimensions.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    ensure_parent(path);
    let img = gradient(width, height);
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// JPEG with an embedded ICC profile (APP2 segment).
pub fn create_test_jpeg_with_icc(path: &Path, width: u32, height: u32, icc: Vec<u8>) {
    ensure_parent(path);
    let img = gradient(width, height);
    let file = std::fs::File::create(path).unwrap();
    let mut encoder = image::codecs::jpeg::JpegEncoder::new(std::io::BufWriter::new(file));
    encoder.set_icc_profile(icc).unwrap();
    encoder
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Create an opaque RGB PNG with the given dimensions.
pub fn create_test_png(path: &Path, width: u32, height: u32) {
    ensure_parent(path);
    gradient(width, height)
        .save_with_format(path, image::ImageFormat::Png)
        .unwrap();
}

/// Create an RGBA PNG whose alpha fades left to right.
pub fn create_test_rgba_png(path: &Path, width: u32, height: u32) {
    ensure_parent(path);
    let img = RgbaImage::from_fn(width, height, |x, _| {
        let alpha = (x * 255 / width.max(1)) as u8;
        image::Rgba([200, 40, 40, alpha])
    });
    img.save_with_format(path, image::ImageFormat::Png).unwrap();
}
