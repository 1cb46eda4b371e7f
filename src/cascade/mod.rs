//! The adaptive compression cascade.
//!
//! | Stage | Module | Entry point |
//! |---|---|---|
//! | **Build** | [`profiles`] | [`build_profiles`]: request → ordered, deduplicated profiles |
//! | **Attempt** | [`encoder`] | [`attempt`]: one profile through the codec under a deadline |
//! | **Control** | [`controller`] | [`run_cascade`]: state machine, acceptance rule, best effort |
//! | **Report** | [`outcome`] | [`describe`]: outcome → mime, extension, summary |
//!
//! A request is consumed by exactly one cascade run. Nothing is shared
//! between runs, so concurrent uploads need no locking; callers bound how
//! many run at once.

pub mod controller;
pub mod encoder;
pub mod outcome;
pub mod profiles;
pub mod request;

pub use controller::{CascadeError, CascadeState, CompressionOutcome, run_cascade, run_profiles};
pub use encoder::{AttemptError, AttemptResult, attempt};
pub use outcome::{OutcomeReport, describe};
pub use profiles::{SizeClass, build_profiles, classify};
pub use request::{CascadeSettings, CompressionRequest, DecodeLimits, ModeThresholds};
