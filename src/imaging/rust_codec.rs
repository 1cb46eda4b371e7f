//! Pure Rust codec built on the `image` crate ecosystem.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, GIF, BMP) | `image::ImageReader` with guessed format |
//! | Decode (AVIF) | `avif-parse` + `rav1d`, see [`super::avif`] |
//! | Pixel limit | header dimensions checked before `DynamicImage::from_decoder` |
//! | EXIF orientation | `ImageDecoder::orientation` + `DynamicImage::apply_orientation` |
//! | Resize | `DynamicImage::resize_exact`, filter chosen by effort mode |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (lossless, quality ignored) |
//! | Encode → WebP | `webp::Encoder` (lossy, libwebp) |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed by effort mode) |

use super::avif;
use super::calculations::fit_within;
use super::codec::{CodecError, ImageCodec};
use super::params::{CompressionProfile, EffortMode, OutputFormat};
use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::io::Cursor;

/// Production codec. Stateless, so one instance can serve every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct RustCodec;

impl RustCodec {
    pub fn new() -> Self {
        Self
    }
}

/// Decode an upload, rejecting it from the header alone when it would exceed
/// `pixel_limit`, then rotate/flip it upright according to its EXIF tag.
fn decode_oriented(source: &[u8], pixel_limit: u64) -> Result<DynamicImage, CodecError> {
    let decode_err = |e: image::ImageError| CodecError::Decode(e.to_string());

    let reader = ImageReader::new(Cursor::new(source))
        .with_guessed_format()
        .map_err(|e| CodecError::Decode(e.to_string()))?;
    if reader.format() == Some(ImageFormat::Avif) || avif::has_avif_brand(source) {
        return avif::decode(source, pixel_limit);
    }
    if reader.format().is_none() {
        return Err(CodecError::Decode("unrecognized image format".into()));
    }

    let mut decoder = reader.into_decoder().map_err(decode_err)?;
    let (width, height) = decoder.dimensions();
    if u64::from(width) * u64::from(height) > pixel_limit {
        return Err(CodecError::PixelLimit {
            width,
            height,
            limit: pixel_limit,
        });
    }

    let orientation = decoder.orientation().map_err(decode_err)?;
    let mut img = DynamicImage::from_decoder(decoder).map_err(decode_err)?;
    img.apply_orientation(orientation);
    Ok(img)
}

/// Resampling filter per effort mode: sharper filters cost more time.
fn resize_filter(mode: EffortMode) -> FilterType {
    match mode {
        EffortMode::Normal => FilterType::Lanczos3,
        EffortMode::Fast => FilterType::CatmullRom,
        EffortMode::Aggressive | EffortMode::Emergency => FilterType::Triangle,
    }
}

/// rav1e speed preset per effort mode (0 = slowest, 10 = fastest).
fn avif_speed(mode: EffortMode) -> u8 {
    match mode {
        EffortMode::Normal => 6,
        EffortMode::Fast => 8,
        EffortMode::Aggressive => 9,
        EffortMode::Emergency => 10,
    }
}

fn png_compression(mode: EffortMode) -> CompressionType {
    match mode {
        EffortMode::Normal => CompressionType::Default,
        EffortMode::Aggressive => CompressionType::Best,
        EffortMode::Fast | EffortMode::Emergency => CompressionType::Fast,
    }
}

/// Shrink `img` to fit the profile's box. Never enlarges.
fn fit_to_profile(img: DynamicImage, profile: &CompressionProfile) -> DynamicImage {
    match fit_within(
        (img.width(), img.height()),
        (profile.max_width, profile.max_height),
    ) {
        Some((w, h)) => img.resize_exact(w, h, resize_filter(profile.mode)),
        None => img,
    }
}

/// Collapse exotic pixel layouts (16-bit, float, luma+alpha) to 8-bit RGB(A),
/// which every encoder below accepts.
fn to_rgb8_or_rgba8(img: DynamicImage) -> DynamicImage {
    match img {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => img,
        other if other.color().has_alpha() => DynamicImage::ImageRgba8(other.to_rgba8()),
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

fn encode(img: DynamicImage, profile: &CompressionProfile) -> Result<Vec<u8>, CodecError> {
    let quality = profile.quality.value();
    let encode_err = |e: image::ImageError| {
        CodecError::Encode(format!("{} encode failed: {}", profile.format, e))
    };
    let mut buf = Vec::new();

    match profile.format {
        OutputFormat::Jpg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))
                .map_err(encode_err)?;
        }
        OutputFormat::Png => {
            let encoder = PngEncoder::new_with_quality(
                &mut buf,
                png_compression(profile.mode),
                PngFilter::Adaptive,
            );
            to_rgb8_or_rgba8(img)
                .write_with_encoder(encoder)
                .map_err(encode_err)?;
        }
        OutputFormat::Webp => {
            let img = to_rgb8_or_rgba8(img);
            let encoder = webp::Encoder::from_image(&img).map_err(|e| {
                CodecError::Encode(format!("webp encode failed: {e}"))
            })?;
            buf = encoder.encode(f32::from(quality)).to_vec();
        }
        OutputFormat::Avif => {
            let encoder =
                AvifEncoder::new_with_speed_quality(&mut buf, avif_speed(profile.mode), quality);
            to_rgb8_or_rgba8(img)
                .write_with_encoder(encoder)
                .map_err(encode_err)?;
        }
    }

    Ok(buf)
}

impl ImageCodec for RustCodec {
    fn transcode(
        &self,
        source: &[u8],
        profile: &CompressionProfile,
        pixel_limit: u64,
    ) -> Result<Vec<u8>, CodecError> {
        let img = decode_oriented(source, pixel_limit)?;
        let fitted = fit_to_profile(img, profile);
        encode(fitted, profile)
    }
}
