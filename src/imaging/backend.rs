//! Image processing backend trait and shared error type.
//!
//! The generator only ever asks for one thing: "make `output` from `source`
//! at these dimensions". [`ImageBackend`] is that seam. The production
//! implementation is [`RustBackend`](super::rust_backend::RustBackend); tests
//! use a recording mock.

use super::params::ResizeParams;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Trait for image processing backends.
///
/// `Sync` because the generator calls into one backend from every rayon worker.
pub trait ImageBackend: Sync {
    /// Decode `params.source`, resize, strip profiles and write `params.output`.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;
}

impl<B: ImageBackend + ?Sized> ImageBackend for &B {
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
        (**self).resize(params)
    }
}
