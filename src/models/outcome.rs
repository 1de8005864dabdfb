//! Dispatch outcome model

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::PlatformId;
use crate::validation::ValidationError;

/// What an outcome is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "platform")]
pub enum DispatchTarget {
    /// The whole draft (global precondition failed, no platform was attempted)
    Draft,
    /// A single platform
    Platform(PlatformId),
}

/// Why a platform attempt (or the whole dispatch) failed
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum FailureKind {
    /// The draft was rejected before any network activity
    #[error("{0}")]
    Invalid(ValidationError),
    /// No token stored for the platform
    #[error("no credential for this platform")]
    NoCredential,
    /// The platform has no poster yet
    #[error("posting is not implemented for this platform")]
    NotImplemented,
    /// Non-2xx response
    #[error("server responded with status {0}")]
    ServerError(u16),
    /// Network failure or a request that could not be built
    #[error("transport error: {0}")]
    Transport(String),
    /// Dispatch was cancelled before this platform finished
    #[error("cancelled")]
    Cancelled,
}

/// Terminal state of one attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum OutcomeStatus {
    /// The platform accepted the post
    Succeeded {
        /// Platform-assigned id, when the response carried one
        post_id: Option<String>,
    },
    /// Platform-specific validation failed; nothing was sent
    Skipped {
        /// Validation failure
        reason: ValidationError,
    },
    /// Attempted (or rejected up front) and failed
    Failed {
        /// Failure cause
        reason: FailureKind,
    },
}

impl OutcomeStatus {
    /// Short label for listings and storage
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Succeeded { .. } => "succeeded",
            Self::Skipped { .. } => "skipped",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Result of dispatching a draft to one platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    /// Platform, or the draft as a whole
    pub target: DispatchTarget,
    /// What happened
    pub status: OutcomeStatus,
}

impl DispatchOutcome {
    /// Platform accepted the post
    pub const fn succeeded(platform: PlatformId, post_id: Option<String>) -> Self {
        Self {
            target: DispatchTarget::Platform(platform),
            status: OutcomeStatus::Succeeded { post_id },
        }
    }

    /// Platform validation failed
    pub const fn skipped(platform: PlatformId, reason: ValidationError) -> Self {
        Self {
            target: DispatchTarget::Platform(platform),
            status: OutcomeStatus::Skipped { reason },
        }
    }

    /// Platform attempt failed
    pub const fn failed(platform: PlatformId, reason: FailureKind) -> Self {
        Self {
            target: DispatchTarget::Platform(platform),
            status: OutcomeStatus::Failed { reason },
        }
    }

    /// Whole draft rejected before any platform was attempted
    pub const fn rejected(reason: ValidationError) -> Self {
        Self {
            target: DispatchTarget::Draft,
            status: OutcomeStatus::Failed {
                reason: FailureKind::Invalid(reason),
            },
        }
    }

    /// The platform this outcome is about, if any
    pub const fn platform(&self) -> Option<PlatformId> {
        match self.target {
            DispatchTarget::Platform(p) => Some(p),
            DispatchTarget::Draft => None,
        }
    }

    /// Whether the platform accepted the post
    pub const fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Succeeded { .. })
    }
}

impl std::fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let target = match self.target {
            DispatchTarget::Draft => "draft",
            DispatchTarget::Platform(p) => p.name(),
        };
        match &self.status {
            OutcomeStatus::Succeeded { post_id: Some(id) } => write!(f, "{target}: posted ({id})"),
            OutcomeStatus::Succeeded { post_id: None } => write!(f, "{target}: posted"),
            OutcomeStatus::Skipped { reason } => write!(f, "{target}: skipped, {reason}"),
            OutcomeStatus::Failed { reason } => write!(f, "{target}: failed, {reason}"),
        }
    }
}

/// Counts over a set of outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Accepted by the platform
    pub succeeded: usize,
    /// Not sent because of validation
    pub skipped: usize,
    /// Attempted and failed, or rejected outright
    pub failed: usize,
}

impl DispatchSummary {
    /// Tally outcomes
    pub fn from_outcomes(outcomes: &[DispatchOutcome]) -> Self {
        outcomes
            .iter()
            .fold(Self::default(), |mut acc, outcome| {
                match outcome.status {
                    OutcomeStatus::Succeeded { .. } => acc.succeeded += 1,
                    OutcomeStatus::Skipped { .. } => acc.skipped += 1,
                    OutcomeStatus::Failed { .. } => acc.failed += 1,
                }
                acc
            })
    }

    /// Every outcome succeeded (and there was at least one)
    pub const fn all_succeeded(&self) -> bool {
        self.succeeded > 0 && self.skipped == 0 && self.failed == 0
    }

    /// Some but not all outcomes succeeded
    pub const fn is_partial(&self) -> bool {
        self.succeeded > 0 && (self.skipped > 0 || self.failed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let outcomes = vec![
            DispatchOutcome::succeeded(PlatformId::Twitter, Some("1".into())),
            DispatchOutcome::skipped(PlatformId::Instagram, ValidationError::MissingRequiredMedia),
            DispatchOutcome::failed(PlatformId::Facebook, FailureKind::NotImplemented),
        ];
        let summary = DispatchSummary::from_outcomes(&outcomes);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);
        assert!(summary.is_partial());
        assert!(!summary.all_succeeded());
    }

    #[test]
    fn test_empty_summary_is_not_success() {
        assert!(!DispatchSummary::from_outcomes(&[]).all_succeeded());
    }

    #[test]
    fn test_rejected_has_no_platform() {
        let outcome = DispatchOutcome::rejected(ValidationError::EmptyText);
        assert_eq!(outcome.platform(), None);
        assert!(!outcome.is_success());
        assert_eq!(outcome.to_string(), "draft: failed, text is empty");
    }

    #[test]
    fn test_status_survives_json() {
        let outcome = DispatchOutcome::failed(PlatformId::Twitter, FailureKind::ServerError(503));
        let json = serde_json::to_string(&outcome.status).unwrap();
        let back: OutcomeStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, outcome.status);
    }
}
