//! Timed encoder: one profile through the codec, raced against a deadline.
//!
//! The codec call runs on tokio's blocking pool and its join handle is awaited
//! under `tokio::time::timeout`. When the deadline passes first, the handle is
//! dropped: the codec keeps running until it returns on its own (blocking work
//! cannot be interrupted), but it only owns clones of the input and its result
//! goes nowhere.

use crate::imaging::{CodecError, CompressionProfile, EffortMode, ImageCodec};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Emergency attempts get this share of the nominal budget.
const EMERGENCY_BUDGET_SHARE: f64 = 0.7;
/// ...but never less than this.
const EMERGENCY_BUDGET_FLOOR: Duration = Duration::from_millis(2000);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("Timed out after {}ms", .budget.as_millis())]
    Timeout { budget: Duration },
    #[error("Encode task failed: {0}")]
    Task(String),
}

/// A successful encode, owned by the controller until it is selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptResult {
    pub profile: CompressionProfile,
    pub data: Vec<u8>,
}

impl AttemptResult {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Time allowed for one attempt with this effort mode.
pub fn attempt_budget(mode: EffortMode, nominal: Duration) -> Duration {
    match mode {
        EffortMode::Emergency => nominal
            .mul_f64(EMERGENCY_BUDGET_SHARE)
            .max(EMERGENCY_BUDGET_FLOOR),
        _ => nominal,
    }
}

/// Run one encode attempt under its deadline.
pub async fn attempt<C: ImageCodec>(
    codec: Arc<C>,
    source: Arc<[u8]>,
    profile: CompressionProfile,
    pixel_limit: u64,
    nominal_budget: Duration,
) -> Result<AttemptResult, AttemptError> {
    let budget = attempt_budget(profile.mode, nominal_budget);
    let encode = tokio::task::spawn_blocking(move || {
        codec.transcode(&source, &profile, pixel_limit)
    });

    match tokio::time::timeout(budget, encode).await {
        Ok(Ok(Ok(data))) => {
            let encoded = AttemptResult { profile, data };
            if encoded.is_empty() {
                // zero bytes is never a storable image
                let msg = format!("{} encoder produced no output", profile.format);
                return Err(CodecError::Encode(msg).into());
            }
            Ok(encoded)
        }
        Ok(Ok(Err(e))) => Err(e.into()),
        Ok(Err(e)) => Err(AttemptError::Task(e.to_string())),
        Err(_) => Err(AttemptError::Timeout { budget }),
    }
}
