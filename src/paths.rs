//! Destination path derivation.
//!
//! A derivative's location depends only on the source file's stem, the
//! matrix cell and the base output directory:
//!
//! ```text
//! /tmp/src/photo.png  + (jpg, medium) + /out  →  /out/mediums/photo.jpg
//! ```
//!
//! The source directory is not part of the result, so `a/photo.png` and
//! `b/photo.jpg` share all six destinations. Whichever is written last wins.

use crate::matrix::Leg;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Source file name with its last extension removed.
///
/// `photo.png` → `photo`, `archive.tar.gz` → `archive.tar`, `.hidden` → `.hidden`.
/// Empty for paths without a file name (`/`, `..`). Non-UTF-8 bytes are kept as-is.
pub fn source_stem(source: &Path) -> &OsStr {
    source.file_stem().unwrap_or_default()
}

/// Directory that holds the derivatives of one matrix cell.
pub fn destination_dir(base: &Path, leg: Leg) -> PathBuf {
    base.join(leg.dir())
}

/// Full path of the derivative of `source` for one matrix cell.
pub fn destination_path(base: &Path, source: &Path, leg: Leg) -> PathBuf {
    let mut file_name = source_stem(source).to_os_string();
    file_name.push(".");
    file_name.push(leg.format.extension());
    destination_dir(base, leg).join(file_name)
}
