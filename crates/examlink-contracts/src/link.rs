//! The Link entity and its lifecycle status.
//!
//! A `Link` binds a token hash to one catalog resource plus an immutable
//! header snapshot. Status only ever moves forward out of `Issued`; the
//! three terminal states have no outgoing transitions. Expiry is a derived
//! predicate on `expires_at`, not solely a stored status — every reader
//! must check both.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{resource::ResourceId, resource::ResourceView, token::TokenHash};

/// Unique identifier for a single issued link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkId(pub uuid::Uuid);

impl LinkId {
    /// Create a new, unique link id.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for LinkId {
    fn default() -> Self {
        Self::new()
    }
}

/// Persisted lifecycle state of a link.
///
/// Legal transitions: `Issued → Used`, `Issued → Expired`, `Issued → Revoked`.
/// Never backward, and nothing ever re-enters `Issued`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkStatus {
    /// Live and consumable until `expires_at`.
    Issued,
    /// Consumed by exactly one successful submission.
    Used,
    /// Past its expiry, written lazily or by the pre-issue sweep.
    Expired,
    /// Invalidated administratively, e.g. when a newer link supersedes it.
    Revoked,
}

impl LinkStatus {
    /// True for the three states with no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        !matches!(self, LinkStatus::Issued)
    }
}

/// Immutable copy of display data captured at issuance time.
///
/// Decoupled from the live catalog record so that later edits to the
/// posting never retroactively change an already-issued form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderSnapshot {
    pub announcement_code: String,
    pub contest_name: String,
    pub posting_code: String,
    pub role_title: String,
    pub administrative_unit: String,
    pub file_number: String,
    pub application_date: String,
    pub application_time: String,
    pub specialist_name: String,
    pub specialist_email: String,
}

impl From<&ResourceView> for HeaderSnapshot {
    /// Capture the snapshot from a freshly resolved catalog view.
    fn from(view: &ResourceView) -> Self {
        Self {
            announcement_code: view.announcement_code.clone(),
            contest_name: view.contest_name.clone(),
            posting_code: view.posting_code.clone(),
            role_title: view.role_title.clone(),
            administrative_unit: view.administrative_unit.clone(),
            file_number: view.file_number.clone(),
            application_date: view.application_date.clone(),
            application_time: view.application_time.clone(),
            specialist_name: view.specialist_name.clone(),
            specialist_email: view.specialist_email.clone(),
        }
    }
}

/// The central entity: a token-bound grant of one-time form access.
///
/// Links are never physically deleted — terminal records are retained for
/// audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    /// One-way hash of the bearer token. The raw token is never stored.
    pub token_hash: TokenHash,
    /// The catalog record this link grants access to.
    pub resource_id: ResourceId,
    /// Write-once display snapshot captured at issuance.
    pub header: HeaderSnapshot,
    pub status: LinkStatus,
    pub created_at: DateTime<Utc>,
    /// Absolute cutoff. A link past this instant is unusable regardless of
    /// the persisted `status`.
    pub expires_at: DateTime<Utc>,
    /// Set exactly once, when consumption succeeds.
    pub used_at: Option<DateTime<Utc>>,
    /// Monotonic counter; defends against double-processing even when
    /// status transitions race.
    pub submission_count: u32,
}

impl Link {
    /// Expiry predicate with an inclusive boundary: a link whose
    /// `expires_at` equals `now` is already expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Extra fields applied together with a conditional status transition.
///
/// Passed to the store's compare-and-swap so the new status, `used_at`,
/// and the submission counter land in one atomic write.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionUpdate {
    /// Consumption timestamp to record, if any.
    pub used_at: Option<DateTime<Utc>>,
    /// Bump `submission_count` by one as part of the same write.
    pub increment_submissions: bool,
}
