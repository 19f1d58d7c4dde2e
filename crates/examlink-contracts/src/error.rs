//! The error taxonomy for the EXAMLINK service.
//!
//! Validity failures (`InvalidToken`, `Expired`, `Used`, `Revoked`) are
//! expected control flow: every layer maps them to typed rejections, never
//! to escaping panics or generic handlers. `Internal` wraps store and
//! collaborator failures; it is logged with the link id and surfaced
//! without detail that could leak token material.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The unified error type for the EXAMLINK crates.
#[derive(Debug, Error)]
pub enum ExamLinkError {
    /// The presented token is malformed or unknown. Deliberately does not
    /// distinguish the two — callers never learn whether a token "almost"
    /// matched.
    #[error("token is malformed or unknown")]
    InvalidToken,

    /// The link is past its expiry, by stored status or by clock.
    #[error("link has expired")]
    Expired,

    /// The link was already consumed by its one successful submission.
    #[error("link has already been used")]
    Used,

    /// The link was invalidated administratively.
    #[error("link has been revoked")]
    Revoked,

    /// The referenced catalog record does not exist.
    #[error("resource '{resource_id}' not found in catalog")]
    ResourceNotFound { resource_id: String },

    /// The declarant declined the consent text.
    #[error("consent was not accepted by the declarant")]
    ConsentNotAccepted,

    /// A caller-supplied document failed boundary validation.
    #[error("validation failed: {reason}")]
    ValidationFailed { reason: String },

    /// A store uniqueness invariant was violated (duplicate token hash,
    /// second submission for one link). Should not occur in practice.
    #[error("store conflict: {reason}")]
    Conflict { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// A store or collaborator failure that is not the caller's fault.
    #[error("internal error: {reason}")]
    Internal { reason: String },
}

impl ExamLinkError {
    /// The wire rejection reason for validity failures, `None` for
    /// everything else.
    pub fn rejection(&self) -> Option<RejectionReason> {
        match self {
            ExamLinkError::InvalidToken => Some(RejectionReason::Invalid),
            ExamLinkError::Expired => Some(RejectionReason::Expired),
            ExamLinkError::Used => Some(RejectionReason::Used),
            ExamLinkError::Revoked => Some(RejectionReason::Revoked),
            _ => None,
        }
    }
}

/// Convenience alias used throughout the EXAMLINK crates.
pub type ExamLinkResult<T> = Result<T, ExamLinkError>;

/// The four rejection reasons a token holder can observe, in their wire
/// spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RejectionReason {
    Invalid,
    Expired,
    Used,
    Revoked,
}

impl RejectionReason {
    /// The wire spelling, identical to the serde form.
    pub fn as_str(self) -> &'static str {
        match self {
            RejectionReason::Invalid => "invalid",
            RejectionReason::Expired => "expired",
            RejectionReason::Used => "used",
            RejectionReason::Revoked => "revoked",
        }
    }
}
