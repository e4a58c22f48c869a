//! CLI output formatting for `resolve` and `warm`.
//!
//! Output leads with the source image, then one indented line per variant
//! with what happened and the URL the page would use:
//!
//! ```text
//! blog/featured/cover.png
//!     card: generated → /media/blog/featured/_variants/cover__card_800x450.jpg
//!     hero: cached → /media/blog/featured/_variants/cover__hero_1600x900.jpg
//!
//! Warmed 1 image: 1 cached, 1 generated (2 total)
//! ```
//!
//! A fallback shows the reason and the original URL:
//!
//! ```text
//! blog/broken.jpg
//!     card: failed (Image error: Decode error: ...) → /media/blog/broken.jpg
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::variants::{Outcome, Resolution, VariantSpec, VariantStats};
use serde::Serialize;

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn outcome_label(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Empty => "no image".to_string(),
        Outcome::Cached => "cached".to_string(),
        Outcome::Generated => "generated".to_string(),
        Outcome::Regenerated => "refreshed".to_string(),
        Outcome::Fallback(reason) => format!("failed ({reason})"),
    }
}

/// One variant line: `card: cached → /media/...`.
fn variant_line(label: &str, resolution: &Resolution) -> String {
    if resolution.url.is_empty() {
        format!("{}{}: {}", indent(1), label, outcome_label(&resolution.outcome))
    } else {
        format!(
            "{}{}: {} → {}",
            indent(1),
            label,
            outcome_label(&resolution.outcome),
            resolution.url
        )
    }
}

// ============================================================================
// resolve
// ============================================================================

/// Format the result of resolving one variant of one source.
pub fn format_resolution(source: &str, spec: &VariantSpec, resolution: &Resolution) -> Vec<String> {
    let header = if source.is_empty() {
        "(no source)".to_string()
    } else {
        source.to_string()
    };
    vec![header, variant_line(&spec.name, resolution)]
}

pub fn print_resolution(source: &str, spec: &VariantSpec, resolution: &Resolution) {
    for line in format_resolution(source, spec, resolution) {
        println!("{}", line);
    }
}

/// Machine-readable form of a single resolution, for `resolve --json`.
#[derive(Debug, Serialize, PartialEq)]
pub struct ResolutionReport<'a> {
    pub source: &'a str,
    pub variant: &'a str,
    pub width: u32,
    pub height: u32,
    pub focus: [u8; 2],
    pub url: &'a str,
    pub file: Option<&'a str>,
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'a str>,
}

impl<'a> ResolutionReport<'a> {
    pub fn new(source: &'a str, spec: &'a VariantSpec, resolution: &'a Resolution) -> Self {
        let (outcome, error) = match &resolution.outcome {
            Outcome::Empty => ("empty", None),
            Outcome::Cached => ("cached", None),
            Outcome::Generated => ("generated", None),
            Outcome::Regenerated => ("regenerated", None),
            Outcome::Fallback(reason) => ("fallback", Some(reason.as_str())),
        };
        Self {
            source,
            variant: &spec.name,
            width: spec.width,
            height: spec.height,
            focus: [spec.focus.x, spec.focus.y],
            url: &resolution.url,
            file: resolution.variant.as_deref(),
            outcome,
            error,
        }
    }
}

// ============================================================================
// warm
// ============================================================================

/// Format every preset resolved for one source image.
pub fn format_warm_image(source: &str, results: &[(VariantSpec, Resolution)]) -> Vec<String> {
    let mut lines = Vec::with_capacity(results.len() + 1);
    lines.push(source.to_string());
    for (spec, resolution) in results {
        lines.push(variant_line(&spec.name, resolution));
    }
    lines
}

pub fn print_warm_image(source: &str, results: &[(VariantSpec, Resolution)]) {
    for line in format_warm_image(source, results) {
        println!("{}", line);
    }
}

/// Closing summary line for a warm run.
pub fn format_warm_summary(images: usize, stats: &VariantStats) -> String {
    let noun = if images == 1 { "image" } else { "images" };
    format!("Warmed {} {}: {}", images, noun, stats)
}

pub fn print_warm_summary(images: usize, stats: &VariantStats) {
    println!();
    println!("{}", format_warm_summary(images, stats));
}
