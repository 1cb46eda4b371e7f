//! CLI output formatting for the `plan` and `compress` commands.
//!
//! # Output Format
//!
//! ## Plan
//!
//! ```text
//! holiday.jpg (9.6 MB, aggressive)
//!     1 primary → jpg q72, 2560×2560, fast
//!     2 fallback → jpg q74, 2099×2099, aggressive
//!     3 webp-fallback → webp q68, 1889×1889, aggressive
//!     4 jpeg-emergency → jpg q62, 1843×1843, emergency
//! ```
//!
//! ## Compress
//!
//! ```text
//! holiday.jpg → holiday.jpeg
//!     Profile: fallback (jpg, aggressive)
//!     Size: 9.6 MB → 1.4 MB
//!     enhanced compression, 85.4% smaller
//! notes.txt → notes.txt
//!     Not compressed (text/plain)
//! broken.png
//!     Failed: all encode attempts failed (4 tried)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::cascade::SizeClass;
use crate::imaging::CompressionProfile;
use crate::upload::PreparedUpload;
use std::fmt::Display;

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;

/// Human-readable byte count: `512 B`, `3.4 KB`, `9.6 MB`.
pub fn format_file_size(bytes: usize) -> String {
    let b = bytes as f64;
    if b < KIB {
        format!("{bytes} B")
    } else if b < MIB {
        format!("{:.1} KB", b / KIB)
    } else {
        format!("{:.1} MB", b / MIB)
    }
}

fn size_class_label(class: SizeClass) -> &'static str {
    if class.aggressive {
        "aggressive"
    } else if class.fast {
        "fast"
    } else {
        "normal"
    }
}

fn profile_detail(profile: &CompressionProfile) -> String {
    format!(
        "{} q{}, {}×{}",
        profile.format,
        profile.quality.value(),
        profile.max_width,
        profile.max_height
    )
}

// ============================================================================
// Plan
// ============================================================================

/// Format the profile list that would be attempted for one input.
pub fn format_plan(
    name: &str,
    original_size: usize,
    class: SizeClass,
    profiles: &[CompressionProfile],
) -> Vec<String> {
    let mut lines = vec![format!(
        "{} ({}, {})",
        name,
        format_file_size(original_size),
        size_class_label(class)
    )];
    for (i, profile) in profiles.iter().enumerate() {
        lines.push(format!(
            "    {} {} \u{2192} {}, {}",
            i + 1,
            profile.tag,
            profile_detail(profile),
            profile.mode
        ));
    }
    lines
}

pub fn print_plan(
    name: &str,
    original_size: usize,
    class: SizeClass,
    profiles: &[CompressionProfile],
) {
    for line in format_plan(name, original_size, class, profiles) {
        println!("{}", line);
    }
}

// ============================================================================
// Compress
// ============================================================================

/// Format the result of preparing one upload.
pub fn format_report(source: &str, prepared: &PreparedUpload, original_size: usize) -> Vec<String> {
    let mut lines = vec![format!("{} \u{2192} {}", source, prepared.filename)];
    match &prepared.compression {
        Some(report) => {
            lines.push(format!(
                "    Profile: {} ({}, {})",
                report.profile, report.format, report.mode
            ));
            lines.push(format!(
                "    Size: {} \u{2192} {}",
                format_file_size(original_size),
                format_file_size(report.compressed_size)
            ));
            lines.push(format!("    {}", report.summary));
        }
        None => lines.push(format!("    Not compressed ({})", prepared.mime_type)),
    }
    lines
}

pub fn print_report(source: &str, prepared: &PreparedUpload, original_size: usize) {
    for line in format_report(source, prepared, original_size) {
        println!("{}", line);
    }
}

/// Format a failed input.
pub fn format_failure(source: &str, err: &dyn Display) -> Vec<String> {
    vec![source.to_string(), format!("    Failed: {}", err)]
}

pub fn print_failure(source: &str, err: &dyn Display) {
    for line in format_failure(source, err) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
