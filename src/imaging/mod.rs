//! Image processing: decode, fit, encode.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` + EXIF orientation + pixel ceiling; AVIF via `avif-parse` + `rav1d` |
//! | **Fit** | `resize_exact` to [`fit_within`] bounds, never upscaling |
//! | **Encode** | `image` (JPEG, PNG, AVIF) and `webp` (lossy WebP) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for size and dimension math (unit testable)
//! - **Parameters**: Data structures describing one encode attempt
//! - **Codec**: [`ImageCodec`] trait + [`RustCodec`]

mod avif;
mod calculations;
pub mod codec;
mod params;
pub mod rust_codec;

pub use calculations::{fit_within, reduction_ratio, scale_bound, size_in_mb};
pub use codec::{CodecError, ImageCodec};
pub use params::{CompressionProfile, EffortMode, OutputFormat, ProfileTag, Quality};
pub use rust_codec::RustCodec;
