//! The variant matrix generator.
//!
//! [`VariantMatrixGenerator`] turns one source image into six derivatives
//! (two formats × three sizes) under a base output directory, or removes
//! those six files again.
//!
//! ## Best-effort fan-out
//!
//! The six legs of a call run concurrently on the rayon pool and are always
//! joined; one leg failing never cancels or fails its siblings. Neither
//! [`generate_derivatives`](VariantMatrixGenerator::generate_derivatives) nor
//! [`remove_derivatives`](VariantMatrixGenerator::remove_derivatives) returns
//! a `Result`. Every failure is logged at warn level and recorded as a
//! [`LegStatus::Skipped`] in the returned [`MatrixReport`], so a CI batch keeps
//! going past one unreadable photo while callers still see what went wrong.
//!
//! Backend panics are caught per leg and treated like any other resize
//! failure.
//!
//! ## Failure classes
//!
//! | Reason | When | Infrastructure? |
//! |---|---|---|
//! | [`SkipReason::Resize`] | decode/resize/encode/write failed | no |
//! | [`SkipReason::Directory`] | destination directory could not be created | yes |
//! | [`SkipReason::Remove`] | delete failed for a reason other than "not found" | no |
//!
//! Infrastructure failures point at the environment (an unwritable base
//! directory) rather than at one image. The generator absorbs them like the
//! rest; the CLI turns them into a non-zero exit code.
//!
//! ## No serialization
//!
//! Concurrent generate/remove calls for the same source are not ordered
//! against each other. Last writer wins.

use crate::imaging::{BackendError, ImageBackend, Quality, ResizeParams, RustBackend};
use crate::matrix::{self, Dimensions, Format, Leg, Variant};
use crate::paths;
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Why a leg did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Resize { message: String },
    Directory { message: String },
    Remove { message: String },
}

impl SkipReason {
    pub fn message(&self) -> &str {
        match self {
            SkipReason::Resize { message }
            | SkipReason::Directory { message }
            | SkipReason::Remove { message } => message,
        }
    }

    /// True when the failure is about the output tree rather than one image.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, SkipReason::Directory { .. })
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Outcome of one matrix leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LegStatus {
    /// Derivative written (or overwritten).
    Written,
    /// Derivative deleted.
    Removed,
    /// Nothing to delete.
    Absent,
    Skipped(SkipReason),
}

impl LegStatus {
    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match self {
            LegStatus::Skipped(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Result of one (format, variant) leg for one source.
#[derive(Debug, Clone, Serialize)]
pub struct LegReport {
    pub format: Format,
    pub variant: Variant,
    pub destination: PathBuf,
    pub dimensions: Dimensions,
    pub status: LegStatus,
}

/// All six legs for one source, in matrix order (jpg before webp, full → thumbnail).
#[derive(Debug, Clone, Serialize)]
pub struct MatrixReport {
    pub source: PathBuf,
    pub legs: Vec<LegReport>,
}

impl MatrixReport {
    pub fn skipped(&self) -> impl Iterator<Item = (&LegReport, &SkipReason)> {
        self.legs
            .iter()
            .filter_map(|leg| leg.status.skip_reason().map(|r| (leg, r)))
    }

    pub fn is_clean(&self) -> bool {
        self.skipped().next().is_none()
    }

    pub fn has_infrastructure_failure(&self) -> bool {
        self.skipped().any(|(_, r)| r.is_infrastructure())
    }

    pub fn count(&self, status: &LegStatus) -> usize {
        self.legs.iter().filter(|l| &l.status == status).count()
    }
}

/// Generates and removes the six derivatives of a source image.
pub struct VariantMatrixGenerator<B: ImageBackend = RustBackend> {
    base_dir: PathBuf,
    backend: B,
    quality: Quality,
}

impl VariantMatrixGenerator<RustBackend> {
    /// Generator writing under `base_dir` with the pure-Rust backend.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self::with_backend(base_dir, RustBackend::new())
    }
}

impl<B: ImageBackend> VariantMatrixGenerator<B> {
    pub fn with_backend(base_dir: impl Into<PathBuf>, backend: B) -> Self {
        Self {
            base_dir: base_dir.into(),
            backend,
            quality: Quality::default(),
        }
    }

    /// JPEG encoding quality. WebP output is lossless and ignores it.
    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// The six paths `source` maps to, in matrix order.
    pub fn destinations(&self, source: &Path) -> Vec<PathBuf> {
        matrix::legs()
            .into_iter()
            .map(|leg| paths::destination_path(&self.base_dir, source, leg))
            .collect()
    }

    /// Write all six derivatives of `source`. Always completes.
    pub fn generate_derivatives(&self, source: &Path) -> MatrixReport {
        debug!(source = %source.display(), "generating derivatives");
        let legs = matrix::legs()
            .into_par_iter()
            .map(|leg| self.generate_leg(source, leg))
            .collect();
        MatrixReport {
            source: source.to_path_buf(),
            legs,
        }
    }

    /// Delete all six derivatives of `source` if present. Always completes.
    pub fn remove_derivatives(&self, source: &Path) -> MatrixReport {
        debug!(source = %source.display(), "removing derivatives");
        let legs = matrix::legs()
            .into_par_iter()
            .map(|leg| self.remove_leg(source, leg))
            .collect();
        MatrixReport {
            source: source.to_path_buf(),
            legs,
        }
    }

    /// [`generate_derivatives`](Self::generate_derivatives) for many sources in parallel.
    ///
    /// Reports come back in input order.
    pub fn generate_all(&self, sources: &[PathBuf]) -> Vec<MatrixReport> {
        sources
            .par_iter()
            .map(|s| self.generate_derivatives(s))
            .collect()
    }

    /// [`remove_derivatives`](Self::remove_derivatives) for many sources in parallel.
    pub fn remove_all(&self, sources: &[PathBuf]) -> Vec<MatrixReport> {
        sources
            .par_iter()
            .map(|s| self.remove_derivatives(s))
            .collect()
    }

    fn generate_leg(&self, source: &Path, leg: Leg) -> LegReport {
        let dir = paths::destination_dir(&self.base_dir, leg);
        let destination = paths::destination_path(&self.base_dir, source, leg);
        let dimensions = leg.dimensions();

        let status = match std::fs::create_dir_all(&dir) {
            Ok(()) => self.resize(source, &destination, leg.format, dimensions),
            Err(e) => {
                let message = format!("Cannot create {}: {}", dir.display(), e);
                warn!("{}", message);
                LegStatus::Skipped(SkipReason::Directory { message })
            }
        };

        LegReport {
            format: leg.format,
            variant: leg.variant,
            destination,
            dimensions,
            status,
        }
    }

    /// Run the backend for one leg, absorbing errors and panics.
    fn resize(
        &self,
        source: &Path,
        destination: &Path,
        format: Format,
        dimensions: Dimensions,
    ) -> LegStatus {
        let params = ResizeParams {
            source: source.to_path_buf(),
            output: destination.to_path_buf(),
            format,
            dimensions,
            quality: self.quality,
        };

        let outcome = catch_unwind(AssertUnwindSafe(|| self.backend.resize(&params)))
            .unwrap_or_else(|panic| Err(BackendError::ProcessingFailed(panic_message(panic))));

        match outcome {
            Ok(()) => {
                debug!(destination = %destination.display(), "written");
                LegStatus::Written
            }
            Err(e) => {
                let message = resize_warning(source, destination, dimensions, &e);
                warn!("{}", message);
                LegStatus::Skipped(SkipReason::Resize { message })
            }
        }
    }

    fn remove_leg(&self, source: &Path, leg: Leg) -> LegReport {
        let destination = paths::destination_path(&self.base_dir, source, leg);

        let status = match std::fs::remove_file(&destination) {
            Ok(()) => {
                debug!(destination = %destination.display(), "removed");
                LegStatus::Removed
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => LegStatus::Absent,
            Err(e) => {
                let message = format!("Remove failed {}: {}", destination.display(), e);
                warn!("{}", message);
                LegStatus::Skipped(SkipReason::Remove { message })
            }
        };

        LegReport {
            format: leg.format,
            variant: leg.variant,
            destination,
            dimensions: leg.dimensions(),
            status,
        }
    }
}

/// Warning text for a failed resize: source, destination, requested size and cause.
pub fn resize_warning(
    source: &Path,
    destination: &Path,
    dimensions: Dimensions,
    error: &BackendError,
) -> String {
    format!(
        "Resize failed {} to {} ({}): {}",
        source.display(),
        destination.display(),
        dimensions,
        error
    )
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("backend panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("backend panicked: {s}")
    } else {
        "backend panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use std::fs;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn source_in(tmp: &TempDir, rel: &str) -> PathBuf {
        let path = tmp.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        // The mock backend never reads the file
        fs::write(&path, "").unwrap();
        path
    }

    #[test]
    fn generate_writes_all_six_paths() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        let src = source_in(&tmp, "src/photo.png");
        let backend = MockBackend::writing_files();
        let generator = VariantMatrixGenerator::with_backend(&out, &backend);

        let report = generator.generate_derivatives(&src);

        assert_eq!(report.legs.len(), 6);
        assert!(report.is_clean());
        assert_eq!(report.count(&LegStatus::Written), 6);
        for rel in [
            "images/photo.jpg",
            "mediums/photo.jpg",
            "thumbnails/photo.jpg",
            "webp/photo.webp",
            "webp/medium/photo.webp",
            "webp/thumb/photo.webp",
        ] {
            assert!(out.join(rel).is_file(), "missing {rel}");
        }
    }

    #[test]
    fn generate_passes_variant_dimensions_to_backend() {
        let tmp = TempDir::new().unwrap();
        let src = source_in(&tmp, "photo.png");
        let backend = MockBackend::new();
        let generator = VariantMatrixGenerator::with_backend(tmp.path().join("out"), &backend)
            .with_quality(Quality::new(60));

        generator.generate_derivatives(&src);

        let mut ops = backend.get_operations();
        ops.sort_by(|a, b| a.output.cmp(&b.output));
        assert_eq!(ops.len(), 6);
        for op in &ops {
            let full = op.output.ends_with("images/photo.jpg")
                || op.output.ends_with("webp/photo.webp");
            let expected = if full {
                (1920, Some(1080))
            } else if op.output.contains("/mediums/") || op.output.contains("/webp/medium/") {
                (512, None)
            } else {
                (200, None)
            };
            assert_eq!((op.width, op.height), expected, "{}", op.output);
            assert_eq!(op.quality, 60);
        }
    }

    #[test]
    fn report_is_in_matrix_order() {
        let tmp = TempDir::new().unwrap();
        let src = source_in(&tmp, "photo.png");
        let backend = MockBackend::new();
        let generator = VariantMatrixGenerator::with_backend(tmp.path(), &backend);

        let report = generator.generate_derivatives(&src);
        let order: Vec<_> = report.legs.iter().map(|l| (l.format, l.variant)).collect();
        let expected: Vec<_> = matrix::legs()
            .into_iter()
            .map(|l| (l.format, l.variant))
            .collect();
        assert_eq!(order, expected);
    }

    #[test]
    fn failing_leg_does_not_affect_siblings() {
        let tmp = TempDir::new().unwrap();
        let src = source_in(&tmp, "src/photo.png");
        let backend = MockBackend::failing_on(&["thumbnails"]);
        let generator = VariantMatrixGenerator::with_backend(tmp.path().join("out"), &backend);

        let report = generator.generate_derivatives(&src);

        assert_eq!(backend.get_operations().len(), 6);
        assert_eq!(report.count(&LegStatus::Written), 5);
        let skipped: Vec<_> = report.skipped().collect();
        assert_eq!(skipped.len(), 1);
        let (leg, reason) = skipped[0];
        assert_eq!((leg.format, leg.variant), (Format::Jpeg, Variant::Thumbnail));
        assert!(matches!(reason, SkipReason::Resize { .. }));
        assert!(!report.has_infrastructure_failure());
    }

    #[test]
    fn resize_warning_names_source_and_dimensions() {
        let tmp = TempDir::new().unwrap();
        let src = source_in(&tmp, "src/broken.png");
        let backend = MockBackend::failing_on(&["mediums"]);
        let generator = VariantMatrixGenerator::with_backend(tmp.path().join("out"), &backend);

        let report = generator.generate_derivatives(&src);
        let (_, reason) = report.skipped().next().unwrap();
        let message = reason.message();

        assert!(message.contains(&src.display().to_string()), "{message}");
        assert!(message.contains("512x"), "{message}");
        assert!(message.contains("mediums"), "{message}");
        assert!(message.contains("mock refused"), "{message}");
    }

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn resize_failure_is_logged_as_warning() {
        let tmp = TempDir::new().unwrap();
        let src = source_in(&tmp, "src/broken.png");
        let backend = MockBackend::failing_on(&["mediums"]);
        let generator = VariantMatrixGenerator::with_backend(tmp.path().join("out"), &backend);
        let leg = Leg {
            format: Format::Jpeg,
            variant: Variant::Medium,
        };

        // Subscriber is thread-local, so drive the leg on this thread
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let report = tracing::subscriber::with_default(subscriber, || {
            generator.generate_leg(&src, leg)
        });

        let output = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
        let reason = report.status.skip_reason().unwrap();
        assert!(output.contains("WARN"), "{output}");
        assert!(output.contains(reason.message()), "{output}");
        assert!(output.contains(&src.display().to_string()), "{output}");
        assert!(output.contains("512x"), "{output}");
    }

    #[test]
    fn every_leg_failing_still_completes() {
        let tmp = TempDir::new().unwrap();
        let src = source_in(&tmp, "photo.png");
        let backend = MockBackend::failing_on(&["photo"]);
        let generator = VariantMatrixGenerator::with_backend(tmp.path().join("out"), &backend);

        let report = generator.generate_derivatives(&src);
        assert_eq!(report.skipped().count(), 6);
    }

    struct PanickingBackend;

    impl ImageBackend for PanickingBackend {
        fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
            if params.format == Format::Webp {
                panic!("decoder exploded");
            }
            Ok(())
        }
    }

    #[test]
    fn backend_panic_is_absorbed() {
        let tmp = TempDir::new().unwrap();
        let src = source_in(&tmp, "photo.png");
        let generator =
            VariantMatrixGenerator::with_backend(tmp.path().join("out"), PanickingBackend);

        let report = generator.generate_derivatives(&src);

        assert_eq!(report.count(&LegStatus::Written), 3);
        let messages: Vec<_> = report
            .skipped()
            .map(|(_, r)| r.message().to_string())
            .collect();
        assert_eq!(messages.len(), 3);
        assert!(messages.iter().all(|m| m.contains("decoder exploded")));
    }

    #[test]
    fn unwritable_base_is_infrastructure_failure() {
        let tmp = TempDir::new().unwrap();
        let src = source_in(&tmp, "photo.png");
        // A regular file where the base directory should be
        let base = tmp.path().join("out");
        fs::write(&base, "not a directory").unwrap();
        let backend = MockBackend::new();
        let generator = VariantMatrixGenerator::with_backend(&base, &backend);

        let report = generator.generate_derivatives(&src);

        assert!(backend.get_operations().is_empty());
        assert_eq!(report.skipped().count(), 6);
        assert!(report.has_infrastructure_failure());
    }

    #[test]
    fn remove_deletes_generated_files() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        let src = source_in(&tmp, "photo.png");
        let backend = MockBackend::writing_files();
        let generator = VariantMatrixGenerator::with_backend(&out, &backend);
        generator.generate_derivatives(&src);

        let report = generator.remove_derivatives(&src);

        assert_eq!(report.count(&LegStatus::Removed), 6);
        for path in generator.destinations(&src) {
            assert!(!path.exists(), "{} still exists", path.display());
        }
    }

    #[test]
    fn remove_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        let generator = VariantMatrixGenerator::with_backend(&out, MockBackend::new());

        let report = generator.remove_derivatives(Path::new("/gone/photo.png"));

        assert_eq!(report.count(&LegStatus::Absent), 6);
        assert!(report.is_clean());
        // Removal never provisions directories
        assert!(!out.exists());
    }

    #[test]
    fn remove_partial_set() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        fs::create_dir_all(out.join("webp/thumb")).unwrap();
        fs::write(out.join("webp/thumb/photo.webp"), "x").unwrap();
        let generator = VariantMatrixGenerator::with_backend(&out, MockBackend::new());

        let report = generator.remove_derivatives(Path::new("photo.jpg"));

        assert_eq!(report.count(&LegStatus::Removed), 1);
        assert_eq!(report.count(&LegStatus::Absent), 5);
    }

    #[test]
    fn remove_failure_is_reported_not_raised() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        // A directory sitting at a derivative path cannot be removed as a file
        fs::create_dir_all(out.join("images/photo.jpg")).unwrap();
        let generator = VariantMatrixGenerator::with_backend(&out, MockBackend::new());

        let report = generator.remove_derivatives(Path::new("photo.png"));

        let skipped: Vec<_> = report.skipped().collect();
        assert_eq!(skipped.len(), 1);
        assert!(matches!(skipped[0].1, SkipReason::Remove { .. }));
        assert!(!report.has_infrastructure_failure());
    }

    #[test]
    fn same_basename_sources_share_destinations() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        let first = source_in(&tmp, "a/photo.png");
        let second = source_in(&tmp, "b/photo.jpg");
        let backend = MockBackend::writing_files();
        let generator = VariantMatrixGenerator::with_backend(&out, &backend);

        let r1 = generator.generate_derivatives(&first);
        let r2 = generator.generate_derivatives(&second);

        let d1: Vec<_> = r1.legs.iter().map(|l| &l.destination).collect();
        let d2: Vec<_> = r2.legs.iter().map(|l| &l.destination).collect();
        assert_eq!(d1, d2);

        let ops = backend.get_operations();
        let second_src = second.to_string_lossy().to_string();
        let last_writes: Vec<&RecordedOp> = ops.iter().skip(6).collect();
        assert!(last_writes.iter().all(|op| op.source == second_src));
    }

    #[test]
    fn generate_all_keeps_input_order() {
        let tmp = TempDir::new().unwrap();
        let sources: Vec<PathBuf> = (0..5)
            .map(|i| source_in(&tmp, &format!("src/img{i}.png")))
            .collect();
        let generator =
            VariantMatrixGenerator::with_backend(tmp.path().join("out"), MockBackend::new());

        let reports = generator.generate_all(&sources);

        let order: Vec<_> = reports.iter().map(|r| r.source.clone()).collect();
        assert_eq!(order, sources);
    }

    #[test]
    fn report_serializes_status_and_reason() {
        let tmp = TempDir::new().unwrap();
        let src = source_in(&tmp, "photo.png");
        let generator = VariantMatrixGenerator::with_backend(
            tmp.path().join("out"),
            MockBackend::failing_on(&["webp/thumb"]),
        );

        let report = generator.generate_derivatives(&src);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["legs"][0]["status"], "written");
        assert_eq!(json["legs"][0]["format"], "jpeg");
        assert_eq!(json["legs"][0]["dimensions"]["height"], 1080);
        assert!(json["legs"][5]["status"]["skipped"]["resize"]["message"].is_string());
    }
}
