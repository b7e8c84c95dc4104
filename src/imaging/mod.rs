//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (format sniffed from content) |
//! | **Resize** | `resize_exact` + Lanczos3 |
//! | **Encode** | JPEG (quality) / WebP (lossless) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing one resize job
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use calculations::resolve_dimensions;
pub use params::{Quality, ResizeParams};
pub use rust_backend::{RustBackend, is_supported_image, supported_input_extensions};
