//! Data models for crosspost

mod draft;
mod outcome;
mod platform;

pub use draft::{Draft, MediaKind, MediaRef};
pub use outcome::{DispatchOutcome, DispatchSummary, DispatchTarget, FailureKind, OutcomeStatus};
pub use platform::{PlatformId, UnknownPlatform};
