//! The exam submission handler.
//!
//! Thin orchestration atop the lifecycle service: validate the raw answers
//! document, consume the link (the state machine does the hard part), then
//! ask the external generator for output documents. The contract is only
//! "submission recorded, artifact generation requested" — generator
//! failures never roll anything back, since artifacts can be regenerated.
//!
//! Consent recording rides the same validity gate as verification and is
//! idempotent per `(link, kind)`.

use tracing::{info, warn};

use examlink_contracts::{
    consent::{ConsentId, ConsentRecord, ConsentRequest},
    error::{ExamLinkError, ExamLinkResult},
    lifecycle::{SubmissionReceipt, SubmissionRequest},
};

use examlink_core::{
    traits::{ArtifactGenerator, Clock, ConsentStore, SubmissionStore},
    LinkService,
};

use crate::validate::validate_answers;

/// The submission handler. Owns the lifecycle service plus the
/// collaborators the read path never needs.
pub struct ExamService {
    links: LinkService,
    submissions: Box<dyn SubmissionStore>,
    consents: Box<dyn ConsentStore>,
    artifacts: Box<dyn ArtifactGenerator>,
    clock: Box<dyn Clock>,
}

impl ExamService {
    /// Wire the handler.
    ///
    /// `submissions` must be a handle to the same store the lifecycle
    /// service writes, so artifact references land on the record the
    /// consumption created.
    pub fn new(
        links: LinkService,
        submissions: Box<dyn SubmissionStore>,
        consents: Box<dyn ConsentStore>,
        artifacts: Box<dyn ArtifactGenerator>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            links,
            submissions,
            consents,
            artifacts,
            clock,
        }
    }

    /// The lifecycle service, for read-path calls (verify, prefill) and
    /// issuing in wirings that do not keep a separate handle.
    pub fn links(&self) -> &LinkService {
        &self.links
    }

    /// Submit an exam through a link, consuming it.
    ///
    /// # Pipeline
    ///
    /// 1. Validate the raw answers document (structural + semantic); an
    ///    invalid document is rejected before the link is touched.
    /// 2. Consume the link — strict single-use, atomic against racing
    ///    submissions.
    /// 3. Request artifacts and attach their references, best-effort.
    pub fn submit(
        &self,
        candidate: &str,
        raw_answers: &serde_json::Value,
        declarant_name: Option<String>,
    ) -> ExamLinkResult<SubmissionReceipt> {
        let answers = validate_answers(raw_answers)?;
        let declarant_name = declarant_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        let submission = self.links.consume(
            candidate,
            SubmissionRequest {
                answers,
                declarant_name,
            },
        )?;

        let artifacts = match self.artifacts.generate(&submission) {
            Ok(refs) => {
                if let Err(e) = self.submissions.attach_artifacts(&submission.id, refs.clone()) {
                    warn!(
                        submission_id = %submission.id.0,
                        error = %e,
                        "artifact references could not be attached"
                    );
                }
                refs
            }
            Err(e) => {
                // The submission stands; documents can be regenerated.
                warn!(
                    submission_id = %submission.id.0,
                    link_id = %submission.link_id.0,
                    error = %e,
                    "artifact generation failed"
                );
                Vec::new()
            }
        };

        info!(
            submission_id = %submission.id.0,
            link_id = %submission.link_id.0,
            artifact_count = artifacts.len(),
            "exam submitted"
        );

        Ok(SubmissionReceipt {
            submission_id: submission.id,
            link_id: submission.link_id,
            artifacts,
        })
    }

    /// Record a consent against a still-valid link.
    ///
    /// Rejects a declined consent and a blank declarant name before the
    /// token is even looked at. Recording is idempotent per `(link, kind)`
    /// — a retry returns the originally recorded id.
    pub fn record_consent(
        &self,
        candidate: &str,
        request: ConsentRequest,
    ) -> ExamLinkResult<ConsentId> {
        if !request.accepted {
            return Err(ExamLinkError::ConsentNotAccepted);
        }
        let declarant = request.declarant_name.trim();
        if declarant.is_empty() {
            return Err(ExamLinkError::ValidationFailed {
                reason: "declarant_name must not be blank".to_string(),
            });
        }

        let verified = self.links.verify(candidate)?;

        let consent = ConsentRecord {
            id: ConsentId::new(),
            link_id: verified.link_id,
            kind: request.kind,
            declarant_name: declarant.to_string(),
            accepted_at: self.clock.now(),
        };
        let link_id = consent.link_id.clone();
        let id = self.consents.record(consent)?;

        info!(link_id = %link_id.0, kind = ?request.kind, "consent recorded");
        Ok(id)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
