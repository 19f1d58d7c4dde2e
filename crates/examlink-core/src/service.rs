//! The link lifecycle service: the token-validation state machine.
//!
//! One `LinkService` owns the store, the catalog collaborator, and the
//! clock, and drives every legal transition:
//!
//!   Issued → Used      (exactly one successful consumption)
//!   Issued → Expired   (clock passes `expires_at`; written lazily)
//!   Issued → Revoked   (superseded when a newer link is issued)
//!
//! The correctness invariant is absolute: a link is marked `Used` only
//! through the store's compare-and-swap, and a submission is persisted only
//! after that CAS succeeds. Two concurrent consumptions of one token
//! therefore resolve to exactly one submission — the CAS is the single
//! serialization point; no other locking exists in the service.

use tracing::{debug, error, info, warn};

use examlink_contracts::{
    error::{ExamLinkError, ExamLinkResult},
    lifecycle::{IssuedLink, SubmissionRequest, VerifiedLink, VerifyReport},
    link::{HeaderSnapshot, Link, LinkId, LinkStatus, TransitionUpdate},
    resource::ResourceId,
    submission::{Submission, SubmissionId},
    token::RawToken,
};

use crate::{
    config::ServiceConfig,
    traits::{CatalogResolver, Clock, LinkStore, SubmissionStore},
};

/// The lifecycle service. Construct one per deployment; all methods take
/// `&self` and are safe to call from concurrent requests.
pub struct LinkService {
    store: Box<dyn LinkStore>,
    submissions: Box<dyn SubmissionStore>,
    catalog: Box<dyn CatalogResolver>,
    clock: Box<dyn Clock>,
    config: ServiceConfig,
}

impl LinkService {
    /// Wire a service from its collaborators and configuration.
    pub fn new(
        store: Box<dyn LinkStore>,
        submissions: Box<dyn SubmissionStore>,
        catalog: Box<dyn CatalogResolver>,
        clock: Box<dyn Clock>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            store,
            submissions,
            catalog,
            clock,
            config,
        }
    }

    /// Issue a fresh single-use link for a catalog resource.
    ///
    /// # Pipeline
    ///
    /// 1. Resolve the resource; `ResourceNotFound` if the catalog has no
    ///    such record.
    /// 2. Expire due links and revoke still-live ones for the same
    ///    resource — at most one active link per resource at a time.
    /// 3. Capture the header snapshot from the resolved view.
    /// 4. Generate a token, clamp the TTL into the configured window, and
    ///    persist with `status = Issued`. A token-hash `Conflict` gets one
    ///    regeneration before giving up.
    /// 5. Return the raw token — its only exposure — plus the public URL
    ///    and the snapshot.
    pub fn issue(
        &self,
        resource_id: &ResourceId,
        ttl_hours: Option<i64>,
    ) -> ExamLinkResult<IssuedLink> {
        let view = self
            .catalog
            .resolve(resource_id)?
            .ok_or_else(|| ExamLinkError::ResourceNotFound {
                resource_id: resource_id.0.clone(),
            })?;

        let now = self.clock.now();

        let expired = self.store.expire_stale(resource_id, now)?;
        let revoked = self.store.revoke_active(resource_id, now)?;
        if expired > 0 || revoked > 0 {
            info!(
                resource_id = %resource_id.0,
                expired,
                revoked,
                "invalidated prior links before reissue"
            );
        }

        let ttl = self.config.clamp_ttl_hours(ttl_hours);
        let expires_at = now + chrono::Duration::hours(ttl);
        let header = HeaderSnapshot::from(&view);

        let mut token = examlink_token::generate();
        let mut retried = false;
        loop {
            let link = Link {
                id: LinkId::new(),
                token_hash: examlink_token::hash(&token),
                resource_id: resource_id.clone(),
                header: header.clone(),
                status: LinkStatus::Issued,
                created_at: now,
                expires_at,
                used_at: None,
                submission_count: 0,
            };

            match self.store.create(link) {
                Ok(link_id) => {
                    info!(
                        link_id = %link_id.0,
                        resource_id = %resource_id.0,
                        expires_at = %expires_at,
                        ttl_hours = ttl,
                        "link issued"
                    );
                    return Ok(IssuedLink {
                        link_id,
                        url: self.config.form_url(&token),
                        token,
                        expires_at,
                        header,
                    });
                }
                Err(ExamLinkError::Conflict { reason }) if !retried => {
                    // Token-hash collision. One regeneration, then give up.
                    warn!(
                        resource_id = %resource_id.0,
                        reason = %reason,
                        "token hash collision on create, regenerating"
                    );
                    token = examlink_token::generate();
                    retried = true;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Verify a presented token.
    ///
    /// Read-only on success and callable unlimited times: the one write it
    /// can cause is the best-effort lazy `Expired` transition for a link
    /// whose clock ran out. Rejections are typed — `InvalidToken` for
    /// malformed or unknown tokens (indistinguishable by design), or the
    /// terminal reason for a dead link.
    pub fn verify(&self, candidate: &str) -> ExamLinkResult<VerifiedLink> {
        let link = self.lookup(candidate)?;
        self.classify(&link)?;
        Ok(VerifiedLink {
            link_id: link.id,
            resource_id: link.resource_id,
            header: link.header,
            expires_at: link.expires_at,
        })
    }

    /// Verification in the uniform wire shape: validity failures become a
    /// `valid: false` body with a reason, never an error. Infrastructure
    /// failures still propagate as errors.
    pub fn verify_report(&self, candidate: &str) -> ExamLinkResult<VerifyReport> {
        match self.verify(candidate) {
            Ok(verified) => Ok(VerifyReport {
                valid: true,
                reason: None,
                header: Some(verified.header),
            }),
            Err(e) => match e.rejection() {
                Some(reason) => Ok(VerifyReport {
                    valid: false,
                    reason: Some(reason),
                    header: None,
                }),
                None => Err(e),
            },
        }
    }

    /// Consume a link: the single mutation of its lifetime.
    ///
    /// # Pipeline
    ///
    /// 1. Same validity gate as `verify`.
    /// 2. CAS the link to `Used`, recording `used_at` and bumping the
    ///    submission counter in the same write. Losing the CAS — to a
    ///    concurrent consumer or to expiry in the interim — re-reads the
    ///    record and surfaces its terminal reason; nothing was applied.
    /// 3. Only after the CAS succeeds, persist the submission. A failure
    ///    here leaves the link `Used` with no submission — an operational
    ///    alert surfaced as `Internal`, never silently retried.
    ///
    /// Single-use is strict: a second call with the same token is rejected
    /// with `Used`, never answered with the prior receipt.
    pub fn consume(
        &self,
        candidate: &str,
        request: SubmissionRequest,
    ) -> ExamLinkResult<Submission> {
        let link = self.lookup(candidate)?;
        self.classify(&link)?;

        let now = self.clock.now();
        let update = TransitionUpdate {
            used_at: Some(now),
            increment_submissions: true,
        };
        let won = self
            .store
            .transition_if_issued_and_unexpired(&link.id, LinkStatus::Used, update, now)?;

        if !won {
            let current = self.store.find_by_id(&link.id)?.ok_or_else(|| {
                ExamLinkError::Internal {
                    reason: format!("link {} vanished during consumption", link.id.0),
                }
            })?;
            debug!(
                link_id = %link.id.0,
                status = ?current.status,
                "consumption lost the transition race"
            );
            return Err(match current.status {
                LinkStatus::Used => ExamLinkError::Used,
                LinkStatus::Revoked => ExamLinkError::Revoked,
                // Expired status, or still Issued with the clock past due.
                _ => ExamLinkError::Expired,
            });
        }

        info!(link_id = %link.id.0, used_at = %now, "link consumed");

        let submission = Submission {
            id: SubmissionId::new(),
            link_id: link.id.clone(),
            header: link.header,
            answers: request.answers,
            declarant_name: request.declarant_name,
            accepted_at: now,
            submitted_at: now,
            artifacts: Vec::new(),
        };

        if let Err(e) = self.submissions.insert(submission.clone()) {
            // The link is already Used with no submission attached. This
            // inconsistency needs an operator, not a retry.
            error!(
                link_id = %link.id.0,
                submission_id = %submission.id.0,
                error = %e,
                "submission persistence failed after consumption transition"
            );
            return Err(ExamLinkError::Internal {
                reason: "submission persistence failed after link consumption".to_string(),
            });
        }

        Ok(submission)
    }

    // ── Internal gate ─────────────────────────────────────────────────────────

    /// Syntax check, hash, exact-match lookup. Malformed input never
    /// reaches the store; unknown and malformed tokens both come back as
    /// `InvalidToken`.
    fn lookup(&self, candidate: &str) -> ExamLinkResult<Link> {
        if !examlink_token::is_well_formed(candidate) {
            return Err(ExamLinkError::InvalidToken);
        }
        let hash = examlink_token::hash(&RawToken::new(candidate));
        self.store
            .find_by_token_hash(&hash)?
            .ok_or(ExamLinkError::InvalidToken)
    }

    /// Classify a loaded link against status and clock.
    ///
    /// Expiry is a derived predicate: an `Issued` link past `expires_at`
    /// (inclusive) is rejected as expired even though the stored status
    /// has not caught up, and the `Expired` write is attempted lazily,
    /// best-effort.
    fn classify(&self, link: &Link) -> ExamLinkResult<()> {
        match link.status {
            LinkStatus::Used => Err(ExamLinkError::Used),
            LinkStatus::Revoked => Err(ExamLinkError::Revoked),
            LinkStatus::Expired => Err(ExamLinkError::Expired),
            LinkStatus::Issued => {
                let now = self.clock.now();
                if link.is_expired_at(now) {
                    match self.store.mark_expired_if_due(&link.id, now) {
                        Ok(true) => {
                            debug!(link_id = %link.id.0, "lazily marked link expired")
                        }
                        Ok(false) => {}
                        Err(e) => {
                            debug!(link_id = %link.id.0, error = %e, "lazy expiry write failed")
                        }
                    }
                    Err(ExamLinkError::Expired)
                } else {
                    Ok(())
                }
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use chrono::{DateTime, Duration, TimeZone, Utc};

    use examlink_contracts::{
        error::{ExamLinkError, ExamLinkResult, RejectionReason},
        lifecycle::SubmissionRequest,
        link::{Link, LinkId, LinkStatus, TransitionUpdate},
        resource::{ResourceId, ResourceView},
        submission::{ArtifactRef, ExamAnswers, ExamCase, CaseAspect, Submission, SubmissionId},
        token::TokenHash,
    };

    use crate::{
        config::ServiceConfig,
        traits::{CatalogResolver, LinkStore, ManualClock, SubmissionStore},
    };

    use super::LinkService;

    // ── Mock helpers ─────────────────────────────────────────────────────────

    /// A catalog backed by a mutable map, so tests can mutate a record
    /// after issuance and prove the snapshot does not follow.
    struct MapCatalog {
        records: Arc<Mutex<HashMap<String, ResourceView>>>,
    }

    impl MapCatalog {
        fn with(view: ResourceView) -> (Self, Arc<Mutex<HashMap<String, ResourceView>>>) {
            let records = Arc::new(Mutex::new(HashMap::from([(view.id.0.clone(), view)])));
            (
                Self {
                    records: records.clone(),
                },
                records,
            )
        }
    }

    impl CatalogResolver for MapCatalog {
        fn resolve(&self, id: &ResourceId) -> ExamLinkResult<Option<ResourceView>> {
            Ok(self.records.lock().unwrap().get(&id.0).cloned())
        }
    }

    /// Minimal but honest link store: every mutation under one mutex, so
    /// the CAS semantics match a real store.
    struct TestLinkStore {
        links: Arc<Mutex<HashMap<LinkId, Link>>>,
        lookups: Arc<Mutex<u32>>,
    }

    impl TestLinkStore {
        fn new() -> Self {
            Self {
                links: Arc::new(Mutex::new(HashMap::new())),
                lookups: Arc::new(Mutex::new(0)),
            }
        }
    }

    impl LinkStore for TestLinkStore {
        fn create(&self, link: Link) -> ExamLinkResult<LinkId> {
            let mut links = self.links.lock().unwrap();
            if links.values().any(|l| l.token_hash == link.token_hash) {
                return Err(ExamLinkError::Conflict {
                    reason: "token hash already exists".to_string(),
                });
            }
            let id = link.id.clone();
            links.insert(id.clone(), link);
            Ok(id)
        }

        fn find_by_token_hash(&self, hash: &TokenHash) -> ExamLinkResult<Option<Link>> {
            *self.lookups.lock().unwrap() += 1;
            Ok(self
                .links
                .lock()
                .unwrap()
                .values()
                .find(|l| &l.token_hash == hash)
                .cloned())
        }

        fn find_by_id(&self, id: &LinkId) -> ExamLinkResult<Option<Link>> {
            Ok(self.links.lock().unwrap().get(id).cloned())
        }

        fn transition_if_issued_and_unexpired(
            &self,
            id: &LinkId,
            new_status: LinkStatus,
            update: TransitionUpdate,
            now: DateTime<Utc>,
        ) -> ExamLinkResult<bool> {
            let mut links = self.links.lock().unwrap();
            let link = links.get_mut(id).ok_or(ExamLinkError::Internal {
                reason: "no such link".to_string(),
            })?;
            if link.status != LinkStatus::Issued || link.expires_at <= now {
                return Ok(false);
            }
            link.status = new_status;
            if let Some(used_at) = update.used_at {
                link.used_at = Some(used_at);
            }
            if update.increment_submissions {
                link.submission_count += 1;
            }
            Ok(true)
        }

        fn mark_expired_if_due(&self, id: &LinkId, now: DateTime<Utc>) -> ExamLinkResult<bool> {
            let mut links = self.links.lock().unwrap();
            let link = links.get_mut(id).ok_or(ExamLinkError::Internal {
                reason: "no such link".to_string(),
            })?;
            if link.status == LinkStatus::Issued && link.expires_at <= now {
                link.status = LinkStatus::Expired;
                return Ok(true);
            }
            Ok(false)
        }

        fn expire_stale(&self, resource_id: &ResourceId, now: DateTime<Utc>) -> ExamLinkResult<usize> {
            let mut links = self.links.lock().unwrap();
            let mut count = 0;
            for link in links.values_mut() {
                if &link.resource_id == resource_id
                    && link.status == LinkStatus::Issued
                    && link.expires_at <= now
                {
                    link.status = LinkStatus::Expired;
                    count += 1;
                }
            }
            Ok(count)
        }

        fn revoke_active(&self, resource_id: &ResourceId, now: DateTime<Utc>) -> ExamLinkResult<usize> {
            let mut links = self.links.lock().unwrap();
            let mut count = 0;
            for link in links.values_mut() {
                if &link.resource_id == resource_id
                    && link.status == LinkStatus::Issued
                    && link.expires_at > now
                {
                    link.status = LinkStatus::Revoked;
                    count += 1;
                }
            }
            Ok(count)
        }
    }

    /// Submission store that can be told to fail, for the post-CAS
    /// inconsistency path.
    struct TestSubmissionStore {
        submissions: Arc<Mutex<Vec<Submission>>>,
        fail_inserts: bool,
    }

    impl TestSubmissionStore {
        fn new() -> Self {
            Self {
                submissions: Arc::new(Mutex::new(Vec::new())),
                fail_inserts: false,
            }
        }

        fn failing() -> Self {
            Self {
                submissions: Arc::new(Mutex::new(Vec::new())),
                fail_inserts: true,
            }
        }
    }

    impl SubmissionStore for TestSubmissionStore {
        fn insert(&self, submission: Submission) -> ExamLinkResult<SubmissionId> {
            if self.fail_inserts {
                return Err(ExamLinkError::Internal {
                    reason: "backing store unavailable".to_string(),
                });
            }
            let id = submission.id.clone();
            self.submissions.lock().unwrap().push(submission);
            Ok(id)
        }

        fn find_by_link(&self, link_id: &LinkId) -> ExamLinkResult<Option<Submission>> {
            Ok(self
                .submissions
                .lock()
                .unwrap()
                .iter()
                .find(|s| &s.link_id == link_id)
                .cloned())
        }

        fn attach_artifacts(
            &self,
            id: &SubmissionId,
            artifacts: Vec<ArtifactRef>,
        ) -> ExamLinkResult<()> {
            let mut submissions = self.submissions.lock().unwrap();
            match submissions.iter_mut().find(|s| &s.id == id) {
                Some(s) => {
                    s.artifacts = artifacts;
                    Ok(())
                }
                None => Err(ExamLinkError::Internal {
                    reason: "no such submission".to_string(),
                }),
            }
        }
    }

    fn start_instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 3, 9, 0, 0).unwrap()
    }

    fn make_view(id: &str) -> ResourceView {
        ResourceView {
            id: ResourceId::new(id),
            announcement_code: "ANN-2026-04".to_string(),
            contest_name: "Statistics Analyst Selection".to_string(),
            posting_code: "CFEC2A09C-19482".to_string(),
            role_title: "Senior Statistics Analyst".to_string(),
            administrative_unit: "Regional Directorate North".to_string(),
            file_number: "F-0042".to_string(),
            application_date: "2026-09-01".to_string(),
            application_time: "10:00".to_string(),
            specialist_name: "Laura Mendez".to_string(),
            specialist_email: "laura.mendez@example.org".to_string(),
        }
    }

    fn make_answers() -> ExamAnswers {
        ExamAnswers {
            modality: "presential".to_string(),
            duration_min: 90,
            guide_topics: vec!["sampling".to_string()],
            declared_case_count: 1,
            cases: vec![ExamCase {
                name: "Census design".to_string(),
                aspects: vec![
                    CaseAspect {
                        name: "Methodology".to_string(),
                        weight: 60,
                    },
                    CaseAspect {
                        name: "Presentation".to_string(),
                        weight: 40,
                    },
                ],
            }],
        }
    }

    fn make_request() -> SubmissionRequest {
        SubmissionRequest {
            answers: make_answers(),
            declarant_name: Some("Laura Mendez".to_string()),
        }
    }

    struct Harness {
        service: LinkService,
        clock: ManualClock,
        store_links: Arc<Mutex<HashMap<LinkId, Link>>>,
        store_lookups: Arc<Mutex<u32>>,
        catalog_records: Arc<Mutex<HashMap<String, ResourceView>>>,
        submissions: Arc<Mutex<Vec<Submission>>>,
    }

    fn harness() -> Harness {
        harness_with(TestSubmissionStore::new())
    }

    fn harness_with(submission_store: TestSubmissionStore) -> Harness {
        let clock = ManualClock::new(start_instant());
        let store = TestLinkStore::new();
        let store_links = store.links.clone();
        let store_lookups = store.lookups.clone();
        let submissions = submission_store.submissions.clone();
        let (catalog, catalog_records) = MapCatalog::with(make_view("posting-001"));

        let service = LinkService::new(
            Box::new(store),
            Box::new(submission_store),
            Box::new(catalog),
            Box::new(clock.clone()),
            ServiceConfig::default(),
        );

        Harness {
            service,
            clock,
            store_links,
            store_lookups,
            catalog_records,
            submissions,
        }
    }

    // ── Issue ────────────────────────────────────────────────────────────────

    #[test]
    fn issue_unknown_resource_is_not_found() {
        let h = harness();
        let err = h
            .service
            .issue(&ResourceId::new("posting-404"), None)
            .unwrap_err();
        assert!(matches!(err, ExamLinkError::ResourceNotFound { .. }));
        assert!(h.store_links.lock().unwrap().is_empty());
    }

    #[test]
    fn issue_returns_well_formed_token_and_snapshot() {
        let h = harness();
        let issued = h.service.issue(&ResourceId::new("posting-001"), None).unwrap();

        assert!(examlink_token::is_well_formed(issued.token.as_str()));
        assert_eq!(issued.header.posting_code, "CFEC2A09C-19482");
        assert_eq!(
            issued.url,
            format!("http://localhost:5173/form/{}", issued.token.as_str())
        );
        // Default TTL of 48 hours.
        assert_eq!(issued.expires_at, start_instant() + Duration::hours(48));
    }

    #[test]
    fn issue_clamps_ttl_into_configured_window() {
        let h = harness();
        let long = h
            .service
            .issue(&ResourceId::new("posting-001"), Some(10_000))
            .unwrap();
        assert_eq!(long.expires_at, start_instant() + Duration::hours(720));

        let short = h
            .service
            .issue(&ResourceId::new("posting-001"), Some(0))
            .unwrap();
        assert_eq!(short.expires_at, start_instant() + Duration::hours(1));
    }

    #[test]
    fn issue_revokes_the_prior_active_link() {
        let h = harness();
        let first = h.service.issue(&ResourceId::new("posting-001"), None).unwrap();
        let second = h.service.issue(&ResourceId::new("posting-001"), None).unwrap();

        // The first token is now dead with reason "revoked".
        let err = h.service.verify(first.token.as_str()).unwrap_err();
        assert_eq!(err.rejection(), Some(RejectionReason::Revoked));

        // The second is live.
        assert!(h.service.verify(second.token.as_str()).is_ok());
        assert_eq!(h.store_links.lock().unwrap().len(), 2);
    }

    #[test]
    fn issue_expires_a_due_prior_link_instead_of_revoking() {
        let h = harness();
        let first = h
            .service
            .issue(&ResourceId::new("posting-001"), Some(1))
            .unwrap();

        h.clock.advance(Duration::minutes(61));
        h.service.issue(&ResourceId::new("posting-001"), None).unwrap();

        let err = h.service.verify(first.token.as_str()).unwrap_err();
        assert_eq!(err.rejection(), Some(RejectionReason::Expired));
    }

    // ── Verify ───────────────────────────────────────────────────────────────

    #[test]
    fn verify_rejects_malformed_without_a_store_lookup() {
        let h = harness();
        let err = h.service.verify("not-a-token").unwrap_err();
        assert!(matches!(err, ExamLinkError::InvalidToken));
        assert_eq!(*h.store_lookups.lock().unwrap(), 0);
    }

    #[test]
    fn verify_rejects_unknown_token_as_invalid() {
        let h = harness();
        let err = h.service.verify(&"ab".repeat(24)).unwrap_err();
        assert!(matches!(err, ExamLinkError::InvalidToken));
        assert_eq!(*h.store_lookups.lock().unwrap(), 1);
    }

    #[test]
    fn verify_is_idempotent_and_ignores_catalog_mutation() {
        let h = harness();
        let issued = h.service.issue(&ResourceId::new("posting-001"), None).unwrap();

        // Mutate the catalog record after issuance.
        h.catalog_records
            .lock()
            .unwrap()
            .get_mut("posting-001")
            .unwrap()
            .role_title = "Renamed Role".to_string();

        let first = h.service.verify(issued.token.as_str()).unwrap();
        let second = h.service.verify(issued.token.as_str()).unwrap();

        // The snapshot is authoritative: issuance-time fields, both times.
        assert_eq!(first.header.role_title, "Senior Statistics Analyst");
        assert_eq!(first.header, second.header);
        assert_eq!(
            h.store_links.lock().unwrap()[&first.link_id].submission_count,
            0
        );
    }

    #[test]
    fn verify_expired_by_clock_rejects_and_writes_lazily() {
        let h = harness();
        let issued = h
            .service
            .issue(&ResourceId::new("posting-001"), Some(1))
            .unwrap();

        h.clock.advance(Duration::minutes(61));

        let err = h.service.verify(issued.token.as_str()).unwrap_err();
        assert_eq!(err.rejection(), Some(RejectionReason::Expired));

        // The lazy transition persisted Expired.
        assert_eq!(
            h.store_links.lock().unwrap()[&issued.link_id].status,
            LinkStatus::Expired
        );

        // Still expired on the next read, now from stored status.
        let err = h.service.verify(issued.token.as_str()).unwrap_err();
        assert_eq!(err.rejection(), Some(RejectionReason::Expired));
    }

    #[test]
    fn verify_expiry_boundary_is_inclusive() {
        let h = harness();
        let issued = h
            .service
            .issue(&ResourceId::new("posting-001"), Some(1))
            .unwrap();

        // One millisecond before the cutoff: still valid.
        h.clock.set(issued.expires_at - Duration::milliseconds(1));
        assert!(h.service.verify(issued.token.as_str()).is_ok());

        // Exactly at the cutoff: expired.
        h.clock.set(issued.expires_at);
        let err = h.service.verify(issued.token.as_str()).unwrap_err();
        assert_eq!(err.rejection(), Some(RejectionReason::Expired));
    }

    #[test]
    fn verify_report_uses_the_uniform_shape() {
        let h = harness();
        let issued = h.service.issue(&ResourceId::new("posting-001"), None).unwrap();

        let ok = h.service.verify_report(issued.token.as_str()).unwrap();
        assert!(ok.valid);
        assert!(ok.reason.is_none());
        assert_eq!(ok.header.unwrap().posting_code, "CFEC2A09C-19482");

        let bad = h.service.verify_report("zz").unwrap();
        assert!(!bad.valid);
        assert_eq!(bad.reason, Some(RejectionReason::Invalid));
        assert!(bad.header.is_none());
    }

    // ── Consume ──────────────────────────────────────────────────────────────

    #[test]
    fn consume_succeeds_once_then_rejects_with_used() {
        let h = harness();
        let issued = h.service.issue(&ResourceId::new("posting-001"), None).unwrap();

        let submission = h
            .service
            .consume(issued.token.as_str(), make_request())
            .unwrap();
        assert_eq!(submission.link_id, issued.link_id);
        assert_eq!(submission.answers.cases.len(), 1);

        let link = h.store_links.lock().unwrap()[&issued.link_id].clone();
        assert_eq!(link.status, LinkStatus::Used);
        assert_eq!(link.used_at, Some(start_instant()));
        assert_eq!(link.submission_count, 1);

        // Strict single-use: the second attempt is rejected, not replayed.
        let err = h
            .service
            .consume(issued.token.as_str(), make_request())
            .unwrap_err();
        assert_eq!(err.rejection(), Some(RejectionReason::Used));
        assert_eq!(h.submissions.lock().unwrap().len(), 1);

        // And verify now reports used as well.
        let err = h.service.verify(issued.token.as_str()).unwrap_err();
        assert_eq!(err.rejection(), Some(RejectionReason::Used));
    }

    #[test]
    fn consume_at_one_millisecond_before_expiry_succeeds() {
        let h = harness();
        let issued = h
            .service
            .issue(&ResourceId::new("posting-001"), Some(1))
            .unwrap();

        h.clock.set(issued.expires_at - Duration::milliseconds(1));
        assert!(h.service.consume(issued.token.as_str(), make_request()).is_ok());
    }

    #[test]
    fn consume_exactly_at_expiry_is_rejected() {
        let h = harness();
        let issued = h
            .service
            .issue(&ResourceId::new("posting-001"), Some(1))
            .unwrap();

        h.clock.set(issued.expires_at);
        let err = h
            .service
            .consume(issued.token.as_str(), make_request())
            .unwrap_err();
        assert_eq!(err.rejection(), Some(RejectionReason::Expired));
        assert!(h.submissions.lock().unwrap().is_empty());
    }

    #[test]
    fn consume_persist_failure_surfaces_internal_and_link_stays_used() {
        let h = harness_with(TestSubmissionStore::failing());
        let issued = h.service.issue(&ResourceId::new("posting-001"), None).unwrap();

        let err = h
            .service
            .consume(issued.token.as_str(), make_request())
            .unwrap_err();
        assert!(matches!(err, ExamLinkError::Internal { .. }));

        // The transition is not rolled back: the link stays Used with no
        // submission attached, which is the alert condition.
        assert_eq!(
            h.store_links.lock().unwrap()[&issued.link_id].status,
            LinkStatus::Used
        );
        assert!(h.submissions.lock().unwrap().is_empty());
    }

    #[test]
    fn consume_of_revoked_link_reports_revoked() {
        let h = harness();
        let first = h.service.issue(&ResourceId::new("posting-001"), None).unwrap();
        h.service.issue(&ResourceId::new("posting-001"), None).unwrap();

        let err = h
            .service
            .consume(first.token.as_str(), make_request())
            .unwrap_err();
        assert_eq!(err.rejection(), Some(RejectionReason::Revoked));
    }
}
