//! Consent records tied to a link.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::link::LinkId;

/// Unique identifier for a recorded consent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConsentId(pub uuid::Uuid);

impl ConsentId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ConsentId {
    fn default() -> Self {
        Self::new()
    }
}

/// What the declarant is consenting to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentKind {
    /// Privacy notice shown when the form opens.
    AppUse,
    /// Declaration signed when concluding the exam.
    ExamCompletion,
}

/// Caller-supplied consent body, validated at the exam boundary.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsentRequest {
    pub kind: ConsentKind,
    pub declarant_name: String,
    /// Must be true; a declined consent is rejected, never recorded.
    pub accepted: bool,
}

/// A recorded consent. At most one exists per `(link_id, kind)` pair;
/// recording the same pair again returns the existing id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentRecord {
    pub id: ConsentId,
    pub link_id: LinkId,
    pub kind: ConsentKind,
    pub declarant_name: String,
    pub accepted_at: DateTime<Utc>,
}
