//! # imgcascade
//!
//! The compression core of an image upload pipeline. An upload of any size
//! and shape goes in; a storage-ready artifact inside a size and quality
//! envelope comes out, or a clear failure when no encode succeeded at all.
//!
//! # Architecture: Adaptive Compression Cascade
//!
//! Instead of one encode with fixed settings, every upload gets a short,
//! ranked list of encode profiles. They run one at a time, each under its own
//! deadline, until one produces a result that is good enough:
//!
//! ```text
//! 1. Build     request   →  [primary, fallback, webp-fallback, jpeg-emergency]
//! 2. Attempt   profile   →  encoded bytes | error | timeout
//! 3. Control   attempts  →  first ≥ 1% smaller, else last success, else best effort
//! 4. Report    outcome   →  mime type, extension, summary
//! ```
//!
//! Each step down the list is smaller and cheaper than the one before, so a
//! slow or failing encoder degrades the result instead of failing the upload.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`cascade`] | Profile builder, timed encoder, cascade state machine, outcome reporter |
//! | [`imaging`] | Codec capability: decode with EXIF orientation, pixel ceiling, resize, encode |
//! | [`upload`] | Upload gate: decides whether a file is compressed, renames it, passes others through |
//! | [`config`] | Server tunables via `confique`: defaults, `IMGCASCADE_*` env vars, TOML file |
//! | [`output`] | CLI output formatting for `plan` and `compress` |
//!
//! # Design Decisions
//!
//! ## Explicit State Machine
//!
//! The controller is a [`cascade::CascadeState`] enum advanced by pure
//! transition functions. The acceptance rule, the last-profile rule and the
//! best-effort bookkeeping are all testable without encoding a single pixel.
//!
//! ## Deadlines Without Cancellation
//!
//! Encoding is CPU-bound and cannot be interrupted. Each attempt runs on
//! tokio's blocking pool and is raced against a timer; on timeout the caller
//! moves on and the abandoned encode finishes on its own, holding only its
//! own reference to the input.
//!
//! ## Codec Behind a Trait
//!
//! [`imaging::ImageCodec`] is the only place pixels are touched. Production
//! uses [`imaging::RustCodec`] (`image` + `webp`); tests use a scripted codec
//! that returns canned sizes, errors, delays or panics per profile.
//!
//! ## Never Upload the Raw File Silently
//!
//! When compression was requested and every attempt failed, the upload gate
//! returns an error. Passing the uncompressed original through would hide the
//! failure and break the size envelope callers rely on.

pub mod cascade;
pub mod config;
pub mod imaging;
pub mod output;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_helpers;
