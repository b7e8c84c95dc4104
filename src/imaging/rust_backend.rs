//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary; a CI runner needs no
//! ImageMagick or libvips install.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` with content sniffing |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (RGB8, configurable quality) |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder` (lossless, RGB8/RGBA8) |
//!
//! ## Profile stripping
//!
//! Decoded pixels are written back out through bare encoders that are never
//! handed an ICC profile or EXIF block, so every derivative is profile-free.

use super::backend::{BackendError, ImageBackend};
use super::calculations::resolve_dimensions;
use super::params::ResizeParams;
use crate::matrix::Format;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::ffi::OsString;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Extensions whose decoders are compiled in.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Case-insensitive extension check against [`supported_input_extensions`].
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}

/// Pure Rust backend using the `image` crate.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk.
///
/// The format is sniffed from the file's magic bytes, so a PNG saved as
/// `.jpg` still decodes.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| BackendError::Decode(format!("{}: {}", path.display(), e)))
}

/// Encode `img` as `format` and write it to `path`, replacing any existing file.
///
/// The image is encoded in memory first, then written to a sibling temp file
/// that is renamed over `path`. A failed encode or write leaves the previous
/// derivative untouched.
fn save_image(
    img: &DynamicImage,
    path: &Path,
    format: Format,
    quality: u32,
) -> Result<(), BackendError> {
    let mut buf = Vec::new();

    let encoded = match format {
        Format::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(&mut buf, quality as u8);
            rgb.write_with_encoder(encoder)
        }
        Format::Webp => {
            let pixels = if img.color().has_alpha() {
                DynamicImage::ImageRgba8(img.to_rgba8())
            } else {
                DynamicImage::ImageRgb8(img.to_rgb8())
            };
            pixels.write_with_encoder(WebPEncoder::new_lossless(&mut buf))
        }
    };
    encoded.map_err(|e| {
        BackendError::ProcessingFailed(format!("{} encode failed: {}", format, e))
    })?;

    let tmp = temp_path(path);
    let written = write_file(&tmp, &buf).and_then(|()| std::fs::rename(&tmp, path));
    if written.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    written.map_err(BackendError::from)
}

/// `dir/name.webp` → `dir/.name.webp.<pid>-<n>.tmp`
///
/// Unique per call: same-stem sources may write the same destination concurrently.
fn temp_path(path: &Path) -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);

    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(format!(".{}-{}.tmp", std::process::id(), n));
    path.with_file_name(name)
}

fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut writer = BufWriter::new(std::fs::File::create(path)?);
    writer.write_all(bytes)?;
    writer.flush()
}

impl ImageBackend for RustBackend {
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let (width, height) = resolve_dimensions((img.width(), img.height()), params.dimensions);
        let resized = img.resize_exact(width, height, FilterType::Lanczos3);
        save_image(
            &resized,
            &params.output,
            params.format,
            params.quality.value(),
        )
    }
}
