//! CLI output formatting.
//!
//! # Output Format
//!
//! One block per source image, one line per matrix leg, destinations shown
//! relative to the output directory:
//!
//! ```text
//! content/photo.png
//!     jpg full 1920x1080: images/photo.jpg
//!     jpg medium 512x: mediums/photo.jpg
//!     jpg thumbnail 200x: skipped (Resize failed content/photo.png to ...)
//!     ...
//!
//! Generated 5 derivatives for 1 image, 1 skipped
//! ```
//!
//! When running under GitHub Actions, every skipped leg is additionally
//! printed as a `::warning` workflow command so it shows up as an annotation
//! on the run.
//!
//! # Architecture
//!
//! Each `format_*` function returns lines for testability; the `print_*`
//! wrappers write them to stdout. Format functions are pure: no I/O, no
//! side effects.

use crate::generator::{LegReport, LegStatus, MatrixReport};
use std::path::Path;

/// Which command produced the reports. Only changes wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Generate,
    Remove,
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

fn leg_line(leg: &LegReport, base: &Path) -> String {
    let rel = leg
        .destination
        .strip_prefix(base)
        .unwrap_or(&leg.destination);
    let label = format!("{} {} {}", leg.format, leg.variant, leg.dimensions);
    match &leg.status {
        LegStatus::Written | LegStatus::Removed => format!("{}: {}", label, rel.display()),
        LegStatus::Absent => format!("{}: {} (absent)", label, rel.display()),
        LegStatus::Skipped(reason) => format!("{}: skipped ({})", label, reason),
    }
}

/// Format one source's block.
pub fn format_report(report: &MatrixReport, base: &Path) -> Vec<String> {
    let mut lines = vec![report.source.display().to_string()];
    for leg in &report.legs {
        lines.push(format!("{}{}", indent(1), leg_line(leg, base)));
    }
    lines
}

/// One-line totals across all sources.
pub fn format_summary(reports: &[MatrixReport], action: Action) -> String {
    let count = |status: &LegStatus| reports.iter().map(|r| r.count(status)).sum::<usize>();
    let skipped: usize = reports.iter().map(|r| r.skipped().count()).sum();
    let images = plural(reports.len(), "image");

    let mut line = match action {
        Action::Generate => format!(
            "Generated {} for {}",
            plural(count(&LegStatus::Written), "derivative"),
            images
        ),
        Action::Remove => {
            let absent = count(&LegStatus::Absent);
            let mut s = format!(
                "Removed {} for {}",
                plural(count(&LegStatus::Removed), "derivative"),
                images
            );
            if absent > 0 {
                s.push_str(&format!(", {absent} absent"));
            }
            s
        }
    };
    if skipped > 0 {
        line.push_str(&format!(", {skipped} skipped"));
    }
    line
}

/// Escape data for a GitHub workflow command message.
fn escape_data(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Escape a workflow command property value (`file=...`).
fn escape_property(s: &str) -> String {
    escape_data(s).replace(':', "%3A").replace(',', "%2C")
}

/// `::warning file=...::message` lines for every skipped leg.
pub fn format_annotations(reports: &[MatrixReport]) -> Vec<String> {
    reports
        .iter()
        .flat_map(|report| {
            let file = escape_property(&report.source.display().to_string());
            report
                .skipped()
                .map(move |(_, reason)| {
                    format!("::warning file={}::{}", file, escape_data(reason.message()))
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

pub fn print_reports(reports: &[MatrixReport], base: &Path) {
    for report in reports {
        for line in format_report(report, base) {
            println!("{}", line);
        }
    }
}

pub fn print_summary(reports: &[MatrixReport], action: Action) {
    println!();
    println!("{}", format_summary(reports, action));
}

pub fn print_annotations(reports: &[MatrixReport]) {
    for line in format_annotations(reports) {
        println!("{}", line);
    }
}
