//! The immutable per-upload input to the cascade.

use crate::imaging::{OutputFormat, Quality, size_in_mb};
use std::sync::Arc;
use std::time::Duration;

/// Output bounds and the decompression-bomb guard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodeLimits {
    pub max_width: u32,
    pub max_height: u32,
    /// Decoded `width × height` above this is rejected before decoding pixels.
    pub max_pixels: u64,
}

/// Size thresholds that switch large uploads to cheaper encodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeThresholds {
    pub fast_mode_threshold_mb: f64,
    /// Must be `>= fast_mode_threshold_mb`.
    pub aggressive_threshold_mb: f64,
    pub fast_mode_max_dimension: u32,
}

/// Server-side tunables, already validated by [`crate::config`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CascadeSettings {
    pub limits: DecodeLimits,
    pub modes: ModeThresholds,
    /// Nominal budget for one encode attempt.
    pub attempt_timeout: Duration,
}

impl Default for CascadeSettings {
    fn default() -> Self {
        Self {
            limits: DecodeLimits {
                max_width: 4096,
                max_height: 4096,
                max_pixels: 50_000_000,
            },
            modes: ModeThresholds {
                fast_mode_threshold_mb: 4.0,
                aggressive_threshold_mb: 8.0,
                fast_mode_max_dimension: 2560,
            },
            attempt_timeout: Duration::from_millis(12_000),
        }
    }
}

/// One upload to compress.
///
/// The byte buffer is shared (`Arc`) so encode tasks that outlive a timed-out
/// attempt hold their own reference instead of borrowing from the request.
#[derive(Debug, Clone)]
pub struct CompressionRequest {
    data: Arc<[u8]>,
    format: OutputFormat,
    quality: Quality,
    settings: CascadeSettings,
}

impl CompressionRequest {
    /// `quality` is clamped to 1–100.
    pub fn new(
        data: impl Into<Arc<[u8]>>,
        format: OutputFormat,
        quality: u32,
        settings: CascadeSettings,
    ) -> Self {
        Self {
            data: data.into(),
            format,
            quality: Quality::new(quality),
            settings,
        }
    }

    pub fn data(&self) -> &Arc<[u8]> {
        &self.data
    }

    pub fn original_size(&self) -> usize {
        self.data.len()
    }

    pub fn size_in_mb(&self) -> f64 {
        size_in_mb(self.data.len())
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn settings(&self) -> &CascadeSettings {
        &self.settings
    }
}
