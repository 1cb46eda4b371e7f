//! Shared test utilities for the imgcascade test suite.
//!
//! Provides synthetic image fixtures and a scripted codec that lets cascade
//! tests decide, per profile, what the encoder returns.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let codec = Arc::new(
//!     ScriptedCodec::new()
//!         .on(ProfileTag::Primary, Script::Bytes(10 * MB))
//!         .on(ProfileTag::Fallback, Script::Bytes(2 * MB)),
//! );
//! let outcome = run_cascade(codec.clone(), &request).await;
//! assert_eq!(codec.calls(), vec![ProfileTag::Primary, ProfileTag::Fallback]);
//! ```

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Mutex;
use std::time::Duration;

use crate::imaging::{CodecError, CompressionProfile, ImageCodec, ProfileTag};

// =========================================================================
// Image fixtures
// =========================================================================

fn gradient_rgb(width: u32, height: u32) -> image::DynamicImage {
    image::DynamicImage::ImageRgb8(image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }))
}

/// A `width × height` RGB gradient encoded as JPEG (quality 90).
pub fn gradient_jpeg(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    gradient_rgb(width, height)
        .write_with_encoder(image::codecs::jpeg::JpegEncoder::new_with_quality(
            &mut buf, 90,
        ))
        .unwrap();
    buf
}

/// [`gradient_jpeg`] with an APP1 Exif segment carrying `orientation`
/// (1-8), spliced in right after the SOI marker.
pub fn jpeg_with_orientation(width: u32, height: u32, orientation: u16) -> Vec<u8> {
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II*\0"); // little-endian TIFF header
    tiff.extend_from_slice(&8u32.to_le_bytes()); // IFD0 offset
    tiff.extend_from_slice(&1u16.to_le_bytes()); // one entry
    tiff.extend_from_slice(&0x0112u16.to_le_bytes()); // Orientation
    tiff.extend_from_slice(&3u16.to_le_bytes()); // SHORT
    tiff.extend_from_slice(&1u32.to_le_bytes());
    tiff.extend_from_slice(&orientation.to_le_bytes());
    tiff.extend_from_slice(&[0, 0]);
    tiff.extend_from_slice(&0u32.to_le_bytes()); // no IFD1

    let payload_len = (2 + 6 + tiff.len()) as u16;
    let mut app1 = vec![0xFF, 0xE1];
    app1.extend_from_slice(&payload_len.to_be_bytes());
    app1.extend_from_slice(b"Exif\0\0");
    app1.extend_from_slice(&tiff);

    let jpeg = gradient_jpeg(width, height);
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&app1);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// A `width × height` RGB gradient in any format `image` can write
/// (GIF, BMP, TIFF, ...).
pub fn gradient_in(format: image::ImageFormat, width: u32, height: u32) -> Vec<u8> {
    let img = match format {
        image::ImageFormat::Gif => {
            image::DynamicImage::ImageRgba8(gradient_rgb(width, height).to_rgba8())
        }
        _ => gradient_rgb(width, height),
    };
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

/// A `width × height` RGB gradient encoded as AVIF (rav1e, fastest speed).
pub fn gradient_avif(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    gradient_rgb(width, height)
        .write_with_encoder(image::codecs::avif::AvifEncoder::new_with_speed_quality(
            &mut buf, 10, 85,
        ))
        .unwrap();
    buf
}

/// A `width × height` RGBA gradient with varying alpha, encoded as PNG.
pub fn gradient_png_rgba(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, (y % 256) as u8, 64, ((x + y) % 256) as u8])
    });
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

// =========================================================================
// Scripted codec
// =========================================================================

/// What the scripted codec does when asked to encode a given profile.
#[derive(Debug, Clone)]
pub enum Script {
    /// Succeed with a buffer of this many bytes.
    Bytes(usize),
    Fail(CodecError),
    /// Sleep, then succeed with a buffer of this many bytes.
    Slow(Duration, usize),
    Panic,
}

/// Codec double that records every profile it was asked to encode.
///
/// Profiles without a script (and no default) fail with an encode error.
#[derive(Debug, Default)]
pub struct ScriptedCodec {
    scripts: HashMap<ProfileTag, Script>,
    fallback: Option<Script>,
    calls: Mutex<Vec<ProfileTag>>,
}

impl ScriptedCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every profile fails with `err`.
    pub fn failing(err: CodecError) -> Self {
        Self::new().default_script(Script::Fail(err))
    }

    pub fn on(mut self, tag: ProfileTag, script: Script) -> Self {
        self.scripts.insert(tag, script);
        self
    }

    pub fn default_script(mut self, script: Script) -> Self {
        self.fallback = Some(script);
        self
    }

    /// Tags in the order they were attempted.
    pub fn calls(&self) -> Vec<ProfileTag> {
        self.calls.lock().unwrap().clone()
    }
}

impl ImageCodec for ScriptedCodec {
    fn transcode(
        &self,
        _source: &[u8],
        profile: &CompressionProfile,
        _pixel_limit: u64,
    ) -> Result<Vec<u8>, CodecError> {
        self.calls.lock().unwrap().push(profile.tag);

        let script = self
            .scripts
            .get(&profile.tag)
            .or(self.fallback.as_ref())
            .cloned();
        match script {
            Some(Script::Bytes(len)) => Ok(vec![0; len]),
            Some(Script::Fail(err)) => Err(err),
            Some(Script::Slow(delay, len)) => {
                std::thread::sleep(delay);
                Ok(vec![0; len])
            }
            Some(Script::Panic) => panic!("scripted codec panic for {}", profile.tag),
            None => Err(CodecError::Encode(format!(
                "no script for profile {}",
                profile.tag
            ))),
        }
    }
}
