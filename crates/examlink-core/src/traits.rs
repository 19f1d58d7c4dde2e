//! Core trait definitions for the EXAMLINK lifecycle service.
//!
//! These traits define the complete seam set around the state machine:
//!
//! - `LinkStore`         — link persistence and the atomic conditional transition
//! - `SubmissionStore`   — one-time answer records
//! - `ConsentStore`      — idempotent consent records
//! - `CatalogResolver`   — external catalog collaborator (read at issuance only)
//! - `ArtifactGenerator` — external document collaborator (called after consumption)
//! - `Clock`             — time source, swappable so expiry boundaries are testable
//!
//! The service wires them together in the correct order. A link is never
//! marked used except through `transition_if_issued_and_unexpired`.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

use examlink_contracts::{
    consent::{ConsentId, ConsentKind, ConsentRecord},
    error::ExamLinkResult,
    link::{Link, LinkId, LinkStatus, TransitionUpdate},
    resource::{ResourceId, ResourceView},
    submission::{ArtifactRef, Submission, SubmissionId},
    token::TokenHash,
};

/// Link persistence.
///
/// Implementations must make `transition_if_issued_and_unexpired` genuinely
/// atomic: the status check, the expiry check, and the write happen as one
/// indivisible step against the store. This is the single serialization
/// point that makes concurrent consumption safe — no other locking exists.
pub trait LinkStore: Send + Sync {
    /// Insert a new link with `status = Issued`.
    ///
    /// Returns `Conflict` if a link with the same token hash already
    /// exists. The codec makes this astronomically unlikely; the issuing
    /// path still handles it with a single regeneration.
    fn create(&self, link: Link) -> ExamLinkResult<LinkId>;

    /// Exact-match point lookup by token hash. No partial matching.
    fn find_by_token_hash(&self, hash: &TokenHash) -> ExamLinkResult<Option<Link>>;

    /// Point lookup by link id.
    fn find_by_id(&self, id: &LinkId) -> ExamLinkResult<Option<Link>>;

    /// The compare-and-swap at the heart of correctness.
    ///
    /// In one atomic step: require `status == Issued` and `expires_at > now`;
    /// if both hold, write `new_status` plus `update` and return `true`.
    /// Otherwise leave the record untouched and return `false`.
    fn transition_if_issued_and_unexpired(
        &self,
        id: &LinkId,
        new_status: LinkStatus,
        update: TransitionUpdate,
        now: DateTime<Utc>,
    ) -> ExamLinkResult<bool>;

    /// Lazy expiry write: `Issued` with `expires_at <= now` becomes
    /// `Expired`. Returns whether a write happened. Used best-effort by
    /// the read path; failures there are logged, never surfaced.
    fn mark_expired_if_due(&self, id: &LinkId, now: DateTime<Utc>) -> ExamLinkResult<bool>;

    /// Mark every still-`Issued`-but-due link of a resource as `Expired`.
    /// Runs before issuing a new link for the same resource.
    fn expire_stale(&self, resource_id: &ResourceId, now: DateTime<Utc>) -> ExamLinkResult<usize>;

    /// Revoke every still-live link of a resource, enforcing at most one
    /// active link per resource at a time.
    fn revoke_active(&self, resource_id: &ResourceId, now: DateTime<Utc>) -> ExamLinkResult<usize>;
}

/// One-time submission records.
///
/// At most one submission may ever exist per link; implementations return
/// `Conflict` on a second insert for the same `link_id`. The consumption
/// CAS makes that unreachable in practice — the store check is the
/// defense-in-depth layer behind it.
pub trait SubmissionStore: Send + Sync {
    /// Persist a submission. Records are immutable once inserted, apart
    /// from `attach_artifacts`.
    fn insert(&self, submission: Submission) -> ExamLinkResult<SubmissionId>;

    /// The submission bound to a link, if consumption has happened.
    fn find_by_link(&self, link_id: &LinkId) -> ExamLinkResult<Option<Submission>>;

    /// Attach generated document references after the fact. The one
    /// permitted amendment — answers and consent fields never change.
    fn attach_artifacts(
        &self,
        id: &SubmissionId,
        artifacts: Vec<ArtifactRef>,
    ) -> ExamLinkResult<()>;
}

/// Idempotent consent records keyed by `(link_id, kind)`.
pub trait ConsentStore: Send + Sync {
    /// Record a consent. If one already exists for the same link and kind,
    /// return the existing id unchanged.
    fn record(&self, consent: ConsentRecord) -> ExamLinkResult<ConsentId>;

    /// The recorded consent for a link and kind, if any.
    fn find(&self, link_id: &LinkId, kind: ConsentKind) -> ExamLinkResult<Option<ConsentRecord>>;
}

/// The external catalog collaborator.
///
/// Adapters normalize whatever field aliases the catalog speaks into the
/// canonical `ResourceView` once, here — the core never re-guesses them.
pub trait CatalogResolver: Send + Sync {
    /// Resolve a catalog record, or `None` when absent.
    fn resolve(&self, id: &ResourceId) -> ExamLinkResult<Option<ResourceView>>;
}

/// The external document generator collaborator.
///
/// Invoked after successful consumption. Failures here must never roll
/// back the submission — artifacts can be regenerated later.
pub trait ArtifactGenerator: Send + Sync {
    /// Produce output documents for a recorded submission.
    fn generate(&self, submission: &Submission) -> ExamLinkResult<Vec<ArtifactRef>>;
}

/// Time source for the lifecycle service.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock implementation used in production wiring.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A hand-advanced clock for tests and demos.
///
/// Clones share the same instant, so a test can hold one handle while the
/// service holds another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("manual clock lock poisoned");
        *now = *now + by;
    }

    /// Jump the clock to an absolute instant.
    pub fn set(&self, to: DateTime<Utc>) {
        let mut now = self.now.lock().expect("manual clock lock poisoned");
        *now = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("manual clock lock poisoned")
    }
}
