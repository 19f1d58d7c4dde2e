//! Operation results returned by the lifecycle service.
//!
//! `IssuedLink` is what the issuing caller receives — the only place the
//! raw token ever appears. `VerifiedLink` and `PrefillView` are the
//! read-side results; `VerifyReport` is the uniform wire shape for the
//! verification endpoint (always a body with `valid`, never a transport
//! error for validity failures).

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    error::RejectionReason,
    link::{HeaderSnapshot, LinkId},
    resource::ResourceId,
    submission::{ArtifactRef, ExamAnswers, SubmissionId},
    token::RawToken,
};

/// The issue response. Carries the raw token — its single exposure.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedLink {
    pub link_id: LinkId,
    pub token: RawToken,
    /// Public form URL the specialist receives.
    pub url: String,
    pub expires_at: DateTime<Utc>,
    pub header: HeaderSnapshot,
}

/// A successfully verified, still-consumable link.
#[derive(Debug, Clone, Serialize)]
pub struct VerifiedLink {
    pub link_id: LinkId,
    pub resource_id: ResourceId,
    pub header: HeaderSnapshot,
    pub expires_at: DateTime<Utc>,
}

/// Uniform verification body: `valid` plus a reason on rejection, or the
/// snapshot on success.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectionReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<HeaderSnapshot>,
}

/// The flat read-only field set a form renders before the specialist types
/// anything. Sourced entirely from the link's snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrefillView {
    pub link_id: LinkId,
    pub resource_id: ResourceId,
    pub announcement_code: String,
    pub contest_name: String,
    pub posting_code: String,
    pub role_title: String,
    pub administrative_unit: String,
    pub file_number: String,
    pub application_date: String,
    pub application_time: String,
    pub specialist_name: String,
}

/// Everything a consumption call carries besides the token.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub answers: ExamAnswers,
    pub declarant_name: Option<String>,
}

/// Returned once per link, on the single successful consumption.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub submission_id: SubmissionId,
    pub link_id: LinkId,
    /// Generated document references; empty when the generator failed or
    /// has not completed — they can be regenerated later.
    pub artifacts: Vec<ArtifactRef>,
}
