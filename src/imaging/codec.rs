//! Image codec trait and shared error type.
//!
//! The [`ImageCodec`] trait is the one operation the cascade needs from an
//! image library: decode an upload, fit it inside a profile's bounds, and
//! re-encode it.
//!
//! The production implementation is
//! [`RustCodec`](super::rust_codec::RustCodec). Tests drive the cascade with
//! scripted codecs that never touch pixels.

use super::params::CompressionProfile;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Image is {width}x{height}, above the {limit} pixel decode limit")]
    PixelLimit { width: u32, height: u32, limit: u64 },
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Trait for image codecs.
///
/// Implementations run on a blocking thread and may be abandoned mid-call
/// when an attempt times out, so they must not hold shared mutable state.
pub trait ImageCodec: Send + Sync + 'static {
    /// Decode `source` (honoring EXIF orientation), shrink it to fit the
    /// profile's bounds without upscaling, and encode it with the profile's
    /// format and quality.
    ///
    /// Decoding must fail with [`CodecError::PixelLimit`] before allocating
    /// pixel buffers when `width × height` exceeds `pixel_limit`.
    fn transcode(
        &self,
        source: &[u8],
        profile: &CompressionProfile,
        pixel_limit: u64,
    ) -> Result<Vec<u8>, CodecError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_limit_message_names_dimensions() {
        let err = CodecError::PixelLimit {
            width: 9000,
            height: 8000,
            limit: 50_000_000,
        };
        assert_eq!(
            err.to_string(),
            "Image is 9000x8000, above the 50000000 pixel decode limit"
        );
    }
}
