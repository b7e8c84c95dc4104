//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use crate::matrix::Dimensions;

/// Resolve requested [`Dimensions`] against the source size.
///
/// - Exact requests are returned as-is; the image is stretched to fit.
/// - Width-only requests keep the source aspect ratio. The height is rounded
///   and never drops below one pixel.
///
/// Upscaling is allowed: a 100px-wide source asked for 512 comes out 512 wide.
///
/// # Examples
/// ```
/// # use image_variants::imaging::resolve_dimensions;
/// # use image_variants::matrix::Dimensions;
/// assert_eq!(resolve_dimensions((4000, 3000), Dimensions::width(512)), (512, 384));
/// assert_eq!(resolve_dimensions((4000, 3000), Dimensions::exact(1920, 1080)), (1920, 1080));
/// ```
pub fn resolve_dimensions(source: (u32, u32), requested: Dimensions) -> (u32, u32) {
    let (src_w, src_h) = source;
    match requested.height {
        Some(h) => (requested.width, h),
        None => {
            if src_w == 0 {
                return (requested.width, 1);
            }
            let h = (src_h as f64 * requested.width as f64 / src_w as f64).round() as u32;
            (requested.width, h.max(1))
        }
    }
}
