//! Server-side compression tunables.
//!
//! Loaded with `confique`: every value has a default and an environment
//! variable, and any of them can be overridden from a TOML file. Sources are
//! layered environment → file → defaults, first match wins.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! max_width = 4096                # Largest output width before fast mode caps it
//! max_height = 4096               # Largest output height before fast mode caps it
//! max_pixels = 50000000           # Decode refuses images with more pixels
//! fast_mode_threshold_mb = 4.0    # Uploads this large get faster, smaller encodes
//! aggressive_threshold_mb = 8.0   # Uploads this large get the cheapest cascade
//! fast_mode_max_dimension = 2560  # Dimension cap applied in fast mode
//! attempt_timeout_ms = 12000      # Wall-clock budget per encode attempt
//! ```
//!
//! Generate a documented template with `imgcascade gen-config`.

use crate::cascade::{CascadeSettings, DecodeLimits, ModeThresholds};
use confique::Config;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config load error: {0}")]
    Load(#[from] confique::Error),
    #[error("Config file not found: {}", .0.display())]
    Missing(PathBuf),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Compression tunables for the upload pipeline.
#[derive(Config, Debug, Clone, PartialEq)]
pub struct CompressionConfig {
    /// Maximum output width in pixels.
    #[config(env = "IMGCASCADE_MAX_WIDTH", default = 4096)]
    pub max_width: u32,

    /// Maximum output height in pixels.
    #[config(env = "IMGCASCADE_MAX_HEIGHT", default = 4096)]
    pub max_height: u32,

    /// Images whose decoded width × height exceeds this are rejected.
    #[config(env = "IMGCASCADE_MAX_PIXELS", default = 50000000)]
    pub max_pixels: u64,

    /// Uploads at least this many MiB use fast mode.
    #[config(env = "IMGCASCADE_FAST_MODE_THRESHOLD_MB", default = 4.0)]
    pub fast_mode_threshold_mb: f64,

    /// Uploads at least this many MiB use aggressive mode. Must not be below
    /// the fast mode threshold.
    #[config(env = "IMGCASCADE_AGGRESSIVE_THRESHOLD_MB", default = 8.0)]
    pub aggressive_threshold_mb: f64,

    /// In fast mode, both output dimensions are capped to this.
    #[config(env = "IMGCASCADE_FAST_MODE_MAX_DIMENSION", default = 2560)]
    pub fast_mode_max_dimension: u32,

    /// Wall-clock budget for one encode attempt, in milliseconds. Emergency
    /// attempts get 70% of it, but at least 2000.
    #[config(env = "IMGCASCADE_ATTEMPT_TIMEOUT_MS", default = 12000)]
    pub attempt_timeout_ms: u64,
}

impl CompressionConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fast_mode_threshold_mb < 0.0 || self.aggressive_threshold_mb < 0.0 {
            return Err(ConfigError::Validation(
                "mode thresholds must be non-negative".into(),
            ));
        }
        if self.aggressive_threshold_mb < self.fast_mode_threshold_mb {
            return Err(ConfigError::Validation(
                "aggressive_threshold_mb must be >= fast_mode_threshold_mb".into(),
            ));
        }
        if self.max_width == 0 || self.max_height == 0 || self.fast_mode_max_dimension == 0 {
            return Err(ConfigError::Validation(
                "dimensions must be non-zero".into(),
            ));
        }
        if self.max_pixels == 0 {
            return Err(ConfigError::Validation("max_pixels must be non-zero".into()));
        }
        if self.attempt_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "attempt_timeout_ms must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Freeze into the settings a cascade run takes.
    pub fn cascade_settings(&self) -> CascadeSettings {
        CascadeSettings {
            limits: DecodeLimits {
                max_width: self.max_width,
                max_height: self.max_height,
                max_pixels: self.max_pixels,
            },
            modes: ModeThresholds {
                fast_mode_threshold_mb: self.fast_mode_threshold_mb,
                aggressive_threshold_mb: self.aggressive_threshold_mb,
                fast_mode_max_dimension: self.fast_mode_max_dimension,
            },
            attempt_timeout: Duration::from_millis(self.attempt_timeout_ms),
        }
    }
}

/// Stock defaults, ignoring the environment and any file.
pub fn stock() -> Result<CompressionConfig, ConfigError> {
    Ok(CompressionConfig::builder().load()?)
}

/// Load config from the environment and, if given, a TOML file, then validate.
///
/// An explicitly named file must exist.
pub fn load_config(path: Option<&Path>) -> Result<CompressionConfig, ConfigError> {
    let mut builder = CompressionConfig::builder().env();
    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::Missing(path.to_path_buf()));
        }
        builder = builder.file(path);
    }
    let config = builder.load()?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock config file with every key and its default.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> String {
    confique::toml::template::<CompressionConfig>(confique::toml::FormatOptions::default())
}
