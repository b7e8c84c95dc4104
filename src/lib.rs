//! # image-variants
//!
//! Produces the resized JPEG and WebP copies of source images that a static
//! site build publishes, and deletes them again when a source goes away.
//!
//! # The Matrix
//!
//! Every source image maps to exactly six derivatives, two formats × three
//! sizes, at paths that depend only on the file stem:
//!
//! ```text
//! content/photo.png  →  build/images/photo.jpg          1920x1080
//!                       build/mediums/photo.jpg          512 wide
//!                       build/thumbnails/photo.jpg       200 wide
//!                       build/webp/photo.webp            1920x1080
//!                       build/webp/medium/photo.webp     512 wide
//!                       build/webp/thumb/photo.webp      200 wide
//! ```
//!
//! Full-size derivatives are stretched to exactly 1920×1080; the medium and
//! thumbnail sizes keep the source aspect ratio.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`matrix`] | `Format`, `Variant`, `Dimensions` and the static directory/size tables |
//! | [`paths`] | Stem extraction and destination path derivation |
//! | [`imaging`] | `ImageBackend` trait and the pure-Rust `image` crate backend |
//! | [`generator`] | `VariantMatrixGenerator`: parallel six-way fan-out with per-leg reports |
//! | [`scan`] | Expands CLI inputs (files, directories) into source lists |
//! | [`config`] | `derivatives.toml` loading, layering and validation |
//! | [`output`] | CLI output formatting and GitHub Actions annotations |
//!
//! # Design Decisions
//!
//! ## Best Effort, But Reported
//!
//! A CI run over a few hundred photos should not die because one of them is
//! truncated. Each of the six legs runs independently; a failed decode or
//! encode is logged as a warning and the run carries on. Unlike a silent
//! swallow, every leg's outcome comes back in a [`generator::MatrixReport`],
//! so the CLI can print it, annotate the workflow run, or dump it as JSON.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, Lanczos3 resampling and encoding all go through the `image`
//! crate. No ImageMagick, no libvips: the binary drops onto any runner.
//!
//! ## Rayon Fan-Out
//!
//! Resizing is CPU-bound, so the six legs (and the sources themselves) are
//! spread over the rayon pool instead of an async runtime. The pool size is
//! configurable through `[processing] max_processes`.

pub mod config;
pub mod generator;
pub mod imaging;
pub mod matrix;
pub mod output;
pub mod paths;
pub mod scan;

#[cfg(test)]
pub(crate) mod test_helpers;
