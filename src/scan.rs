//! Expand command-line inputs into a list of source images.
//!
//! Inputs may be files or directories:
//!
//! - **Files** are taken as-is. Their content is not checked; an unreadable
//!   "image" only fails its own resize legs later.
//! - **Directories** are walked recursively. Only files with a decodable
//!   extension (see [`supported_input_extensions`](crate::imaging::supported_input_extensions))
//!   are picked up; hidden entries are skipped.
//!
//! Results keep the order of the inputs, directory contents sorted by name,
//! duplicates dropped.

use crate::imaging::is_supported_image;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Source not found: {0}")]
    NotFound(PathBuf),
}

/// Whether an input path that does not exist is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    /// Generating needs the source on disk.
    Reject,
    /// Removing only needs the name; the source may already be gone.
    Allow,
}

/// Collect source images from `inputs`.
pub fn collect_sources(inputs: &[PathBuf], missing: Missing) -> Result<Vec<PathBuf>, ScanError> {
    let mut seen = HashSet::new();
    let mut sources = Vec::new();

    for input in inputs {
        if input.is_dir() {
            for path in walk_images(input)? {
                if seen.insert(path.clone()) {
                    sources.push(path);
                }
            }
        } else if input.exists() || missing == Missing::Allow {
            if seen.insert(input.clone()) {
                sources.push(input.clone());
            }
        } else {
            return Err(ScanError::NotFound(input.clone()));
        }
    }

    Ok(sources)
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

fn walk_images(root: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let mut images = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e));

    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file() && is_supported_image(entry.path()) {
            images.push(entry.into_path());
        }
    }
    Ok(images)
}
