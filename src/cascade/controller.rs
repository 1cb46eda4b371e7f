//! Cascade controller: walks the profile list as an explicit state machine.
//!
//! ```text
//!              ┌──────── failed / < 1% smaller ────────┐
//!              ▼                                        │
//!   Attempting(0) ─► Attempting(1) ─► … ─► Attempting(n-1)
//!        │                │                     │
//!        │ ≥ 1% smaller   │ ≥ 1% smaller        │ any success
//!        ▼                ▼                     ▼
//!     Selected         Selected              Selected
//!
//!   Attempting(n) ─► Exhausted ─► Selected(best effort) | Failed
//! ```
//!
//! Transitions are pure functions of the attempt result ([`on_attempt`],
//! [`on_exhausted`]); only [`run_cascade`] performs I/O, by calling the timed
//! encoder. The final index selects on any success, so `Exhausted` is only
//! reached when every attempt errored or the list was empty.

use super::encoder::{AttemptError, AttemptResult, attempt};
use super::profiles::build_profiles;
use super::request::CompressionRequest;
use crate::imaging::{CompressionProfile, ImageCodec, reduction_ratio};
use std::sync::Arc;
use thiserror::Error;

/// Minimum fractional reduction that accepts a non-final profile outright.
pub const ACCEPTANCE_THRESHOLD: f64 = 0.01;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CascadeError {
    #[error("all encode attempts failed ({attempts} tried)")]
    Exhausted { attempts: usize },
}

/// Final result of one cascade run. Produced exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompressionOutcome {
    Selected(AttemptResult),
    Failed(CascadeError),
}

/// Controller state between attempts.
#[derive(Debug, Clone, PartialEq)]
pub enum CascadeState {
    Attempting {
        index: usize,
        best_effort: Option<AttemptResult>,
    },
    Exhausted {
        best_effort: Option<AttemptResult>,
    },
    Selected(AttemptResult),
    Failed(CascadeError),
}

impl CascadeState {
    pub fn initial() -> Self {
        Self::Attempting {
            index: 0,
            best_effort: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Selected(_) | Self::Failed(_))
    }
}

/// Transition after attempt `index` of `profile_count` finished.
///
/// A success is selected when it shrinks the original by at least
/// [`ACCEPTANCE_THRESHOLD`] or when it came from the last profile. Otherwise
/// it becomes the best-effort candidate if it is strictly smaller than the
/// current one. Failures leave the candidate untouched.
pub fn on_attempt(
    index: usize,
    profile_count: usize,
    original_size: usize,
    best_effort: Option<AttemptResult>,
    result: Result<AttemptResult, AttemptError>,
) -> CascadeState {
    let next = index + 1;
    match result {
        Ok(encoded) => {
            let is_last = next >= profile_count;
            if is_last || reduction_ratio(original_size, encoded.len()) >= ACCEPTANCE_THRESHOLD {
                return CascadeState::Selected(encoded);
            }
            let best_effort = match best_effort {
                Some(best) if best.len() <= encoded.len() => Some(best),
                _ => Some(encoded),
            };
            CascadeState::Attempting {
                index: next,
                best_effort,
            }
        }
        Err(_) => CascadeState::Attempting {
            index: next,
            best_effort,
        },
    }
}

/// Transition out of `Exhausted`.
pub fn on_exhausted(best_effort: Option<AttemptResult>, attempts: usize) -> CascadeState {
    match best_effort {
        Some(best) => CascadeState::Selected(best),
        None => CascadeState::Failed(CascadeError::Exhausted { attempts }),
    }
}

/// Build the profile list for `request` and run it to a terminal state.
pub async fn run_cascade<C: ImageCodec>(
    codec: Arc<C>,
    request: &CompressionRequest,
) -> CompressionOutcome {
    let profiles = build_profiles(request);
    run_profiles(codec, request, &profiles).await
}

/// Run an explicit profile list. At most `profiles.len()` attempts are made.
pub async fn run_profiles<C: ImageCodec>(
    codec: Arc<C>,
    request: &CompressionRequest,
    profiles: &[CompressionProfile],
) -> CompressionOutcome {
    let settings = request.settings();
    let original_size = request.original_size();
    let mut state = CascadeState::initial();

    loop {
        state = match state {
            CascadeState::Attempting { index, best_effort } if index >= profiles.len() => {
                CascadeState::Exhausted { best_effort }
            }
            CascadeState::Attempting { index, best_effort } => {
                let profile = profiles[index];
                let result = attempt(
                    Arc::clone(&codec),
                    Arc::clone(request.data()),
                    profile,
                    settings.limits.max_pixels,
                    settings.attempt_timeout,
                )
                .await;
                log_attempt(index, &profile, original_size, &result);
                on_attempt(index, profiles.len(), original_size, best_effort, result)
            }
            CascadeState::Exhausted { best_effort } => {
                if let Some(best) = &best_effort {
                    tracing::info!(
                        profile = %best.profile.tag,
                        bytes = best.len(),
                        "no profile reached the acceptance threshold, using best effort"
                    );
                }
                on_exhausted(best_effort, profiles.len())
            }
            CascadeState::Selected(selected) => {
                tracing::info!(
                    profile = %selected.profile.tag,
                    format = %selected.profile.format,
                    original = original_size,
                    bytes = selected.len(),
                    "compression profile selected"
                );
                return CompressionOutcome::Selected(selected);
            }
            CascadeState::Failed(err) => {
                tracing::error!(attempts = profiles.len(), "{err}");
                return CompressionOutcome::Failed(err);
            }
        };
    }
}

fn log_attempt(
    index: usize,
    profile: &CompressionProfile,
    original_size: usize,
    result: &Result<AttemptResult, AttemptError>,
) {
    match result {
        Ok(encoded) => tracing::debug!(
            index,
            profile = %profile.tag,
            quality = profile.quality.value(),
            bytes = encoded.len(),
            ratio = reduction_ratio(original_size, encoded.len()),
            "encode attempt finished"
        ),
        Err(e) => tracing::warn!(
            index,
            profile = %profile.tag,
            format = %profile.format,
            error = %e,
            "encode attempt failed"
        ),
    }
}
