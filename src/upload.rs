//! Upload gate: decides whether an incoming file goes through the cascade.
//!
//! Only files that declare a raster `image/*` mime type are compressed, and
//! only when the uploader's preference enables it. Everything else, SVG
//! included, passes through byte-for-byte. When compression applies and every
//! encode fails, the upload fails too; the raw original is never substituted
//! silently.

use crate::cascade::{
    CascadeError, CascadeSettings, CompressionOutcome, CompressionRequest, OutcomeReport,
    describe, run_cascade,
};
use crate::imaging::{ImageCodec, OutputFormat};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_MIME: &str = "application/octet-stream";

/// Client-side compression preference, as sent alongside an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompressPreference {
    pub enabled: bool,
    pub quality: u32,
    pub format: OutputFormat,
}

impl Default for CompressPreference {
    fn default() -> Self {
        Self {
            enabled: false,
            quality: 85,
            format: OutputFormat::Jpg,
        }
    }
}

/// A file as received from the uploader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub filename: String,
    pub mime_type: Option<String>,
    pub data: Vec<u8>,
}

/// What to store: possibly compressed bytes under a possibly renamed file.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedUpload {
    pub filename: String,
    pub mime_type: String,
    pub data: Vec<u8>,
    /// `None` when the file was passed through untouched.
    pub compression: Option<OutcomeReport>,
}

impl PreparedUpload {
    pub fn applied(&self) -> bool {
        self.compression.is_some()
    }
}

/// Vector image types. Never rasterized.
const VECTOR_IMAGE_TYPES: &[&str] = &["image/svg+xml"];

/// Whether an upload with this mime type and preference gets compressed.
pub fn should_compress(mime_type: &str, preference: &CompressPreference) -> bool {
    preference.enabled
        && mime_type.starts_with("image/")
        && !VECTOR_IMAGE_TYPES
            .iter()
            .any(|vector| mime_type.eq_ignore_ascii_case(vector))
}

/// Prepare `file` for storage according to `preference`.
pub async fn prepare_upload<C: ImageCodec>(
    codec: Arc<C>,
    file: UploadFile,
    preference: &CompressPreference,
    settings: &CascadeSettings,
) -> Result<PreparedUpload, CascadeError> {
    let mime_type = file.mime_type.unwrap_or_else(|| DEFAULT_MIME.to_string());

    if !should_compress(&mime_type, preference) {
        tracing::debug!(
            filename = %file.filename,
            mime = %mime_type,
            "compression not applied, passing upload through"
        );
        return Ok(PreparedUpload {
            filename: file.filename,
            mime_type,
            data: file.data,
            compression: None,
        });
    }

    let request = CompressionRequest::new(
        file.data,
        preference.format,
        preference.quality,
        *settings,
    );
    let outcome = run_cascade(codec, &request).await;
    let report = describe(&outcome, request.original_size())?;

    let data = match outcome {
        CompressionOutcome::Selected(selected) => selected.data,
        CompressionOutcome::Failed(err) => return Err(err),
    };

    Ok(PreparedUpload {
        filename: replace_extension(&file.filename, report.extension),
        mime_type: report.mime_type.to_string(),
        data,
        compression: Some(report),
    })
}

/// Replace the extension of the final path segment with `extension`.
///
/// A name without an extension gets one appended; a trailing dot is reused.
/// Dots in directory segments and a leading dot (hidden files) are not
/// extensions. Trailing slashes are dropped, so the last named segment is the
/// one renamed.
pub fn replace_extension(filename: &str, extension: &str) -> String {
    let path = filename.trim_end_matches('/');
    let segment_start = path.rfind('/').map_or(0, |i| i + 1);
    let stem_end = path[segment_start..]
        .rfind('.')
        .filter(|&i| i > 0)
        .map(|i| segment_start + i);

    match stem_end {
        Some(dot) => format!("{}.{extension}", &path[..dot]),
        None => format!("{path}.{extension}"),
    }
}
