//! Profile set builder: turns a request into the ordered list of encode attempts.
//!
//! The list is fixed in shape: `primary`, `fallback`, `webp-fallback`,
//! `jpeg-emergency`. Each step is smaller and cheaper than the one before,
//! so walking it in order can only move toward a smaller artifact.
//!
//! ```text
//!                  normal   fast    aggressive
//! primary cap        88      76        72       quality = min(q, cap) ∈ [40, 95]
//! fallback        min(q-8, 74) ∈ [38, 90]      bounds 90% (82% aggressive), ≥ 1024
//! webp-fallback   min(q-14, 68) ∈ [36, 86]     bounds 90% of fallback, ≥ 960
//! jpeg-emergency  min(q-20, 62) ∈ [34, 82]     square, 72% of primary short side, ≥ 800
//! ```
//!
//! Everything here is pure: same request in, same list out.

use super::request::CompressionRequest;
use crate::imaging::{
    CompressionProfile, EffortMode, OutputFormat, ProfileTag, Quality, scale_bound,
};
use std::collections::HashSet;

/// Size classification of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeClass {
    pub fast: bool,
    pub aggressive: bool,
}

/// Classify an upload by size. Aggressive always implies fast.
pub fn classify(request: &CompressionRequest) -> SizeClass {
    let modes = &request.settings().modes;
    let size_mb = request.size_in_mb();
    let aggressive = size_mb >= modes.aggressive_threshold_mb;
    let fast = aggressive || size_mb >= modes.fast_mode_threshold_mb;
    SizeClass { fast, aggressive }
}

fn primary_quality_cap(class: SizeClass) -> i32 {
    if class.aggressive {
        72
    } else if class.fast {
        76
    } else {
        88
    }
}

/// Lowering quality cannot shrink a lossless encode, so the fallback step for
/// a lossless format switches to WebP instead of repeating the same encode.
fn fallback_format(declared: OutputFormat) -> OutputFormat {
    if declared.is_lossless() {
        OutputFormat::Webp
    } else {
        declared
    }
}

/// Build the deduplicated cascade for `request`.
///
/// Never fails and never returns an empty list.
pub fn build_profiles(request: &CompressionRequest) -> Vec<CompressionProfile> {
    let class = classify(request);
    let settings = request.settings();
    let declared = i32::from(request.quality().value());

    let (primary_w, primary_h) = if class.fast {
        let cap = settings.modes.fast_mode_max_dimension;
        (
            settings.limits.max_width.min(cap),
            settings.limits.max_height.min(cap),
        )
    } else {
        (settings.limits.max_width, settings.limits.max_height)
    };

    // Floors never lift a later step above the one before it.
    let fallback_ratio = if class.aggressive { 0.82 } else { 0.9 };
    let fallback_w = scale_bound(primary_w, fallback_ratio, 1024).min(primary_w);
    let fallback_h = scale_bound(primary_h, fallback_ratio, 1024).min(primary_h);

    let webp_w = scale_bound(fallback_w, 0.9, 960).min(fallback_w);
    let webp_h = scale_bound(fallback_h, 0.9, 960).min(fallback_h);

    let emergency = scale_bound(primary_w.min(primary_h), 0.72, 800)
        .min(webp_w)
        .min(webp_h);

    let candidates = [
        CompressionProfile {
            tag: ProfileTag::Primary,
            format: request.format(),
            quality: Quality::within(declared.min(primary_quality_cap(class)), 40, 95),
            max_width: primary_w,
            max_height: primary_h,
            mode: if class.fast {
                EffortMode::Fast
            } else {
                EffortMode::Normal
            },
        },
        CompressionProfile {
            tag: ProfileTag::Fallback,
            format: fallback_format(request.format()),
            quality: Quality::within((declared - 8).min(74), 38, 90),
            max_width: fallback_w,
            max_height: fallback_h,
            mode: EffortMode::Aggressive,
        },
        CompressionProfile {
            tag: ProfileTag::WebpFallback,
            format: OutputFormat::Webp,
            quality: Quality::within((declared - 14).min(68), 36, 86),
            max_width: webp_w,
            max_height: webp_h,
            mode: EffortMode::Aggressive,
        },
        CompressionProfile {
            tag: ProfileTag::JpegEmergency,
            format: OutputFormat::Jpg,
            quality: Quality::within((declared - 20).min(62), 34, 82),
            max_width: emergency,
            max_height: emergency,
            mode: EffortMode::Emergency,
        },
    ];

    dedup_profiles(candidates)
}

/// Drop profiles that would encode identically to an earlier one.
fn dedup_profiles(
    candidates: impl IntoIterator<Item = CompressionProfile>,
) -> Vec<CompressionProfile> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|p| seen.insert(p.encode_key()))
        .collect()
}
