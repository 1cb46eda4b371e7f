//! Outcome reporter: turns a cascade outcome into upload metadata.

use super::controller::{CascadeError, CompressionOutcome};
use crate::imaging::{EffortMode, OutputFormat, ProfileTag, reduction_ratio};
use serde::Serialize;

/// What the upload handler needs to know about a selected encode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeReport {
    pub format: OutputFormat,
    pub extension: &'static str,
    pub mime_type: &'static str,
    pub profile: ProfileTag,
    pub mode: EffortMode,
    pub original_size: usize,
    pub compressed_size: usize,
    /// `1 - compressed / original`; negative when the encode grew the file.
    pub reduction_ratio: f64,
    pub summary: String,
}

/// Describe `outcome` for the caller. A failed outcome is returned as-is.
pub fn describe(
    outcome: &CompressionOutcome,
    original_size: usize,
) -> Result<OutcomeReport, CascadeError> {
    let selected = match outcome {
        CompressionOutcome::Selected(selected) => selected,
        CompressionOutcome::Failed(err) => return Err(err.clone()),
    };

    let profile = &selected.profile;
    let ratio = reduction_ratio(original_size, selected.len());

    Ok(OutcomeReport {
        format: profile.format,
        extension: profile.format.extension(),
        mime_type: profile.format.mime_type(),
        profile: profile.tag,
        mode: profile.mode,
        original_size,
        compressed_size: selected.len(),
        reduction_ratio: ratio,
        summary: summarize(profile.mode, ratio),
    })
}

fn summarize(mode: EffortMode, ratio: f64) -> String {
    if ratio > 0.0 {
        format!("{}, {:.1}% smaller", mode.label(), ratio * 100.0)
    } else {
        format!("{}, no size reduction", mode.label())
    }
}
