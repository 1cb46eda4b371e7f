//! Parameter types for encode operations.
//!
//! These types describe *what* to encode, not *how*. A [`CompressionProfile`]
//! is the interface between the profile builder (which decides what attempts
//! to make) and the [`codec`](super::codec) (which does the pixel work). The
//! separation lets the cascade run against a scripted codec in tests.
//!
//! ## Types
//!
//! - [`OutputFormat`]: target container/codec, with its mime type and extension.
//! - [`Quality`]: lossy encoding quality (1–100, default 85). Clamped on construction.
//! - [`EffortMode`]: how hard the encoder works; drives encoder speed and resampling.
//! - [`ProfileTag`]: stable identity of a cascade step, used in logs and reports.
//! - [`CompressionProfile`]: the full specification of one encode attempt.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output formats an upload can be compressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[serde(alias = "jpeg")]
    Jpg,
    Png,
    Webp,
    Avif,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jpg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Avif => "avif",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
            Self::Avif => "image/avif",
        }
    }

    /// Canonical file extension written to uploaded object names.
    ///
    /// `jpg` maps to `jpeg` so the extension always matches the mime subtype.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpg => "jpeg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Avif => "avif",
        }
    }

    /// Lossless formats ignore the quality setting entirely.
    pub fn is_lossless(self) -> bool {
        matches!(self, Self::Png)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(Self::Jpg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::Webp),
            "avif" => Ok(Self::Avif),
            other => Err(format!(
                "unknown output format '{other}' (expected jpg, png, webp or avif)"
            )),
        }
    }
}

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100) as u8)
    }

    /// Clamp a possibly out-of-range derived quality into `[min, max]`.
    pub fn within(value: i32, min: u8, max: u8) -> Self {
        Self(value.clamp(i32::from(min), i32::from(max)) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// Encode effort, from most to least careful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffortMode {
    Normal,
    Fast,
    Aggressive,
    Emergency,
}

impl EffortMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Fast => "fast",
            Self::Aggressive => "aggressive",
            Self::Emergency => "emergency",
        }
    }

    /// Human-readable tier name shown to uploaders.
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "standard compression",
            Self::Fast => "fast compression",
            Self::Aggressive => "enhanced compression",
            Self::Emergency => "emergency compression",
        }
    }
}

impl fmt::Display for EffortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a cascade step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileTag {
    Primary,
    Fallback,
    WebpFallback,
    JpegEmergency,
}

impl ProfileTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Fallback => "fallback",
            Self::WebpFallback => "webp-fallback",
            Self::JpegEmergency => "jpeg-emergency",
        }
    }
}

impl fmt::Display for ProfileTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One encode attempt: format, quality, bounding box, and effort.
///
/// Profiles are plain values. The builder creates them per request and
/// nothing mutates them afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompressionProfile {
    pub tag: ProfileTag,
    pub format: OutputFormat,
    pub quality: Quality,
    /// Output is resized to fit inside this box; never upscaled.
    pub max_width: u32,
    pub max_height: u32,
    pub mode: EffortMode,
}

impl CompressionProfile {
    /// Key under which two profiles would produce the same encode.
    pub fn encode_key(&self) -> (OutputFormat, Quality, u32, u32) {
        (self.format, self.quality, self.max_width, self.max_height)
    }

    /// Upper bound on output pixels (`max_width × max_height`).
    pub fn pixel_bound(&self) -> u64 {
        u64::from(self.max_width) * u64::from(self.max_height)
    }
}
