//! The fixed format × variant matrix.
//!
//! Every source image produces one derivative per cell of this table:
//!
//! | Format | Variant | Directory | Dimensions |
//! |---|---|---|---|
//! | jpg | full | `images` | 1920×1080 |
//! | jpg | medium | `mediums` | 512 wide |
//! | jpg | thumbnail | `thumbnails` | 200 wide |
//! | webp | full | `webp` | 1920×1080 |
//! | webp | medium | `webp/medium` | 512 wide |
//! | webp | thumbnail | `webp/thumb` | 200 wide |
//!
//! Both lookups are exhaustive `match` expressions, so adding a format or a
//! variant without filling in its cells is a compile error.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Output encoding of a derivative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Jpeg,
    Webp,
}

impl Format {
    pub const ALL: [Format; 2] = [Format::Jpeg, Format::Webp];

    /// Canonical file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Jpeg => "jpg",
            Format::Webp => "webp",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Target size class of a derivative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Full,
    Medium,
    Thumbnail,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Full, Variant::Medium, Variant::Thumbnail];

    pub fn name(self) -> &'static str {
        match self {
            Variant::Full => "full",
            Variant::Medium => "medium",
            Variant::Thumbnail => "thumbnail",
        }
    }

    /// Requested output dimensions. Identical for every format.
    pub fn dimensions(self) -> Dimensions {
        match self {
            Variant::Full => Dimensions::exact(1920, 1080),
            Variant::Medium => Dimensions::width(512),
            Variant::Thumbnail => Dimensions::width(200),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Requested output size.
///
/// A missing `height` means "scale to `width`, keep the source aspect ratio".
/// When both are present the image is stretched to exactly that box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: Option<u32>,
}

impl Dimensions {
    pub const fn exact(width: u32, height: u32) -> Self {
        Self {
            width,
            height: Some(height),
        }
    }

    pub const fn width(width: u32) -> Self {
        Self {
            width,
            height: None,
        }
    }
}

impl fmt::Display for Dimensions {
    /// `1920x1080` for exact sizes, `512x` when the height follows the aspect ratio.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.height {
            Some(h) => write!(f, "{}x{}", self.width, h),
            None => write!(f, "{}x", self.width),
        }
    }
}

/// Relative output directory for a (format, variant) cell.
pub fn variant_dir(format: Format, variant: Variant) -> &'static str {
    match (format, variant) {
        (Format::Jpeg, Variant::Full) => "images",
        (Format::Jpeg, Variant::Medium) => "mediums",
        (Format::Jpeg, Variant::Thumbnail) => "thumbnails",
        (Format::Webp, Variant::Full) => "webp",
        (Format::Webp, Variant::Medium) => "webp/medium",
        (Format::Webp, Variant::Thumbnail) => "webp/thumb",
    }
}

/// One cell of the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Leg {
    pub format: Format,
    pub variant: Variant,
}

impl Leg {
    pub fn dir(self) -> &'static str {
        variant_dir(self.format, self.variant)
    }

    pub fn dimensions(self) -> Dimensions {
        self.variant.dimensions()
    }
}

/// All six cells, formats outermost.
pub fn legs() -> Vec<Leg> {
    Format::ALL
        .into_iter()
        .flat_map(|format| {
            Variant::ALL
                .into_iter()
                .map(move |variant| Leg { format, variant })
        })
        .collect()
}
