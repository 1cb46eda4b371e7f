//! Pure calculation functions for sizes and dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Byte length expressed in mebibytes, the unit the mode thresholds use.
pub fn size_in_mb(bytes: usize) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

/// Fractional size reduction of `compressed` against `original`.
///
/// Positive when the output is smaller, negative when it grew. An empty
/// original has no meaningful ratio and reports `0.0`.
pub fn reduction_ratio(original: usize, compressed: usize) -> f64 {
    if original == 0 {
        return 0.0;
    }
    1.0 - compressed as f64 / original as f64
}

/// Scale a bound by `ratio`, rounding to the nearest pixel, never below `floor`.
///
/// ```
/// # use imgcascade::imaging::scale_bound;
/// assert_eq!(scale_bound(4096, 0.9, 1024), 3686);
/// assert_eq!(scale_bound(1000, 0.9, 1024), 1024);
/// ```
pub fn scale_bound(value: u32, ratio: f64, floor: u32) -> u32 {
    let scaled = (f64::from(value) * ratio).round() as u32;
    scaled.max(floor)
}

/// Calculate output dimensions that fit `source` inside `bound`.
///
/// Aspect ratio is preserved and images are never enlarged: returns `None`
/// when the source already fits, meaning no resize is needed.
///
/// # Arguments
/// * `source` - Decoded image dimensions (width, height)
/// * `bound` - Maximum output box (width, height)
pub fn fit_within(source: (u32, u32), bound: (u32, u32)) -> Option<(u32, u32)> {
    let (src_w, src_h) = source;
    let (max_w, max_h) = bound;

    if src_w <= max_w && src_h <= max_h {
        return None;
    }

    let scale = (f64::from(max_w) / f64::from(src_w)).min(f64::from(max_h) / f64::from(src_h));
    let w = ((f64::from(src_w) * scale).round() as u32).clamp(1, max_w.max(1));
    let h = ((f64::from(src_h) * scale).round() as u32).clamp(1, max_h.max(1));
    Some((w, h))
}
