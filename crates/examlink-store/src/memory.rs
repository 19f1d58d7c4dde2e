//! In-memory implementations of the store traits.
//!
//! `InMemoryLinkStore` is the reference implementation of `LinkStore`. All
//! records live behind one `Mutex`, which is exactly what makes
//! `transition_if_issued_and_unexpired` a true compare-and-swap: the status
//! check, the expiry check, and the write happen under a single lock
//! acquisition, so two racing consumers can never both observe `Issued`.
//!
//! Links are never removed — terminal records stay for audit.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::debug;

use examlink_contracts::{
    consent::{ConsentId, ConsentKind, ConsentRecord},
    error::{ExamLinkError, ExamLinkResult},
    link::{Link, LinkId, LinkStatus, TransitionUpdate},
    resource::ResourceId,
    submission::{ArtifactRef, Submission, SubmissionId},
    token::TokenHash,
};
use examlink_core::traits::{ConsentStore, LinkStore, SubmissionStore};

// ── Link store ────────────────────────────────────────────────────────────────

/// The mutable interior of an `InMemoryLinkStore`.
struct LinkState {
    /// All links ever created, by id. Never shrinks.
    links: HashMap<LinkId, Link>,
    /// Unique index: token hash → link id.
    by_hash: HashMap<TokenHash, LinkId>,
}

/// An in-memory, mutex-serialized link store.
///
/// # Thread safety
///
/// Every operation acquires the single internal `Mutex`, making the
/// conditional transition atomic with respect to all other operations.
/// Clones share the same state.
#[derive(Clone)]
pub struct InMemoryLinkStore {
    state: Arc<Mutex<LinkState>>,
}

impl InMemoryLinkStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(LinkState {
                links: HashMap::new(),
                by_hash: HashMap::new(),
            })),
        }
    }

    fn lock(&self) -> ExamLinkResult<std::sync::MutexGuard<'_, LinkState>> {
        self.state.lock().map_err(|e| ExamLinkError::Internal {
            reason: format!("link store lock poisoned: {}", e),
        })
    }
}

impl Default for InMemoryLinkStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkStore for InMemoryLinkStore {
    fn create(&self, link: Link) -> ExamLinkResult<LinkId> {
        let mut state = self.lock()?;
        if state.by_hash.contains_key(&link.token_hash) {
            return Err(ExamLinkError::Conflict {
                reason: "token hash already exists".to_string(),
            });
        }
        let id = link.id.clone();
        state.by_hash.insert(link.token_hash.clone(), id.clone());
        state.links.insert(id.clone(), link);
        Ok(id)
    }

    fn find_by_token_hash(&self, hash: &TokenHash) -> ExamLinkResult<Option<Link>> {
        let state = self.lock()?;
        Ok(state
            .by_hash
            .get(hash)
            .and_then(|id| state.links.get(id))
            .cloned())
    }

    fn find_by_id(&self, id: &LinkId) -> ExamLinkResult<Option<Link>> {
        Ok(self.lock()?.links.get(id).cloned())
    }

    /// The compare-and-swap. Status and expiry are checked and the write
    /// applied under one lock acquisition — there is no observable
    /// intermediate state.
    fn transition_if_issued_and_unexpired(
        &self,
        id: &LinkId,
        new_status: LinkStatus,
        update: TransitionUpdate,
        now: DateTime<Utc>,
    ) -> ExamLinkResult<bool> {
        let mut state = self.lock()?;
        let link = match state.links.get_mut(id) {
            Some(link) => link,
            None => return Ok(false),
        };

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
        debug!(link_id = %id.0, status = ?new_status, "link transitioned");
        Ok(true)
    }

    fn mark_expired_if_due(&self, id: &LinkId, now: DateTime<Utc>) -> ExamLinkResult<bool> {
        let mut state = self.lock()?;
        let link = match state.links.get_mut(id) {
            Some(link) => link,
            None => return Ok(false),
        };
        if link.status == LinkStatus::Issued && link.expires_at <= now {
            link.status = LinkStatus::Expired;
            debug!(link_id = %id.0, "link lazily expired");
            return Ok(true);
        }
        Ok(false)
    }

    fn expire_stale(&self, resource_id: &ResourceId, now: DateTime<Utc>) -> ExamLinkResult<usize> {
        let mut state = self.lock()?;
        let mut count = 0;
        for link in state.links.values_mut() {
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
        let mut state = self.lock()?;
        let mut count = 0;
        for link in state.links.values_mut() {
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

// ── Submission store ──────────────────────────────────────────────────────────

struct SubmissionState {
    submissions: Vec<Submission>,
    by_link: HashMap<LinkId, SubmissionId>,
}

/// In-memory submission store. Enforces the 1:1 link/submission invariant
/// as the defense-in-depth layer behind the consumption CAS.
#[derive(Clone)]
pub struct InMemorySubmissionStore {
    state: Arc<Mutex<SubmissionState>>,
}

impl InMemorySubmissionStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SubmissionState {
                submissions: Vec::new(),
                by_link: HashMap::new(),
            })),
        }
    }

    fn lock(&self) -> ExamLinkResult<std::sync::MutexGuard<'_, SubmissionState>> {
        self.state.lock().map_err(|e| ExamLinkError::Internal {
            reason: format!("submission store lock poisoned: {}", e),
        })
    }
}

impl Default for InMemorySubmissionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionStore for InMemorySubmissionStore {
    fn insert(&self, submission: Submission) -> ExamLinkResult<SubmissionId> {
        let mut state = self.lock()?;
        if state.by_link.contains_key(&submission.link_id) {
            return Err(ExamLinkError::Conflict {
                reason: format!("link {} already has a submission", submission.link_id.0),
            });
        }
        let id = submission.id.clone();
        state.by_link.insert(submission.link_id.clone(), id.clone());
        state.submissions.push(submission);
        Ok(id)
    }

    fn find_by_link(&self, link_id: &LinkId) -> ExamLinkResult<Option<Submission>> {
        let state = self.lock()?;
        Ok(state
            .submissions
            .iter()
            .find(|s| &s.link_id == link_id)
            .cloned())
    }

    fn attach_artifacts(
        &self,
        id: &SubmissionId,
        artifacts: Vec<ArtifactRef>,
    ) -> ExamLinkResult<()> {
        let mut state = self.lock()?;
        match state.submissions.iter_mut().find(|s| &s.id == id) {
            Some(submission) => {
                submission.artifacts = artifacts;
                Ok(())
            }
            None => Err(ExamLinkError::Internal {
                reason: format!("submission {} not found for artifact attach", id.0),
            }),
        }
    }
}

// ── Consent store ─────────────────────────────────────────────────────────────

/// In-memory consent store, idempotent per `(link_id, kind)`.
#[derive(Clone)]
pub struct InMemoryConsentStore {
    state: Arc<Mutex<Vec<ConsentRecord>>>,
}

impl InMemoryConsentStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn lock(&self) -> ExamLinkResult<std::sync::MutexGuard<'_, Vec<ConsentRecord>>> {
        self.state.lock().map_err(|e| ExamLinkError::Internal {
            reason: format!("consent store lock poisoned: {}", e),
        })
    }
}

impl Default for InMemoryConsentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsentStore for InMemoryConsentStore {
    fn record(&self, consent: ConsentRecord) -> ExamLinkResult<ConsentId> {
        let mut records = self.lock()?;
        // Safe to retry: the first record for a (link, kind) pair wins.
        if let Some(existing) = records
            .iter()
            .find(|c| c.link_id == consent.link_id && c.kind == consent.kind)
        {
            return Ok(existing.id.clone());
        }
        let id = consent.id.clone();
        records.push(consent);
        Ok(id)
    }

    fn find(&self, link_id: &LinkId, kind: ConsentKind) -> ExamLinkResult<Option<ConsentRecord>> {
        let records = self.lock()?;
        Ok(records
            .iter()
            .find(|c| &c.link_id == link_id && c.kind == kind)
            .cloned())
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
