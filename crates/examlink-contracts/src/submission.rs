//! Submission and exam answer types.
//!
//! A `Submission` is created at most once per link, at consumption time.
//! Its answers and consent fields are immutable afterwards; attaching
//! artifact references produced by the external generator is the only
//! permitted amendment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::link::{HeaderSnapshot, LinkId};

/// Unique identifier for a recorded submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionId(pub uuid::Uuid);

impl SubmissionId {
    /// Create a new, unique submission id.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

/// One weighted evaluation aspect inside a practical case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseAspect {
    pub name: String,
    /// Percentage weight, 0–100. Weights of one case must sum to 100.
    pub weight: u32,
}

/// One practical case of the exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamCase {
    pub name: String,
    pub aspects: Vec<CaseAspect>,
}

/// The validated answers document.
///
/// The core only ever manipulates this shape; raw caller JSON is validated
/// and deserialized at the submission boundary before it gets here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamAnswers {
    /// Exam modality (e.g. "presential", "remote").
    pub modality: String,
    /// Exam duration in minutes, 1–120.
    pub duration_min: u32,
    /// Optional guide topics, at most 20.
    #[serde(default)]
    pub guide_topics: Vec<String>,
    /// Number of cases the form declared. Must equal `cases.len()`.
    pub declared_case_count: u32,
    /// The practical cases, 1–3.
    pub cases: Vec<ExamCase>,
}

/// Kind of generated output document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Pdf,
    Xlsx,
}

/// Reference to one generated output document in the object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub kind: ArtifactKind,
    /// Object-store key the generator wrote the document under.
    pub key: String,
    /// Presigned download URL, when the generator produced one.
    pub url: Option<String>,
}

/// The one-time answer record bound to a consumed link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    /// Owning link, 1:1.
    pub link_id: LinkId,
    /// Copy of the link's header at consumption, kept with the answers so
    /// artifact rendering never reads the catalog.
    pub header: HeaderSnapshot,
    pub answers: ExamAnswers,
    /// Declarant of the completion consent, when provided.
    pub declarant_name: Option<String>,
    /// When the declarant accepted, i.e. the consumption instant.
    pub accepted_at: DateTime<Utc>,
    pub submitted_at: DateTime<Utc>,
    /// Generated document references, attached after creation when the
    /// external generator completes.
    pub artifacts: Vec<ArtifactRef>,
}
