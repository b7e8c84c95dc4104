//! Parameter types for image operations.
//!
//! These structs describe *what* to produce, not *how*. The
//! [`generator`](crate::generator) builds one [`ResizeParams`] per matrix cell
//! and hands it to an [`ImageBackend`](super::ImageBackend), which does the
//! pixel work. Tests swap in a recording mock at that seam.

use crate::matrix::{Dimensions, Format};
use std::path::PathBuf;

/// Quality setting for lossy encoding (1-100). Clamped on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(75)
    }
}

/// One resize-and-encode job.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub format: Format,
    pub dimensions: Dimensions,
    /// Only consulted by lossy encoders.
    pub quality: Quality,
}
