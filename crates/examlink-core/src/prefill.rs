//! The prefill resolver: read-only header data for the form layer.
//!
//! A prefill request runs the exact validity gate of `verify`, then
//! reshapes the link's immutable snapshot into the flat field set the form
//! renders. The snapshot is authoritative — the catalog is never consulted
//! for fields captured at issuance, precisely because postings may change
//! after a link goes out.

use examlink_contracts::{
    error::ExamLinkResult,
    lifecycle::{PrefillView, VerifiedLink},
};

use crate::service::LinkService;

impl LinkService {
    /// Resolve the prefill view for a presented token, or the same typed
    /// rejection `verify` would produce.
    pub fn prefill(&self, candidate: &str) -> ExamLinkResult<PrefillView> {
        let verified = self.verify(candidate)?;
        Ok(flatten(verified))
    }
}

/// Reshape a verified link into the form-facing field set.
///
/// The specialist email is deliberately not part of the prefill — the form
/// displays who the posting is assigned to, not how to contact them.
fn flatten(verified: VerifiedLink) -> PrefillView {
    let header = verified.header;
    PrefillView {
        link_id: verified.link_id,
        resource_id: verified.resource_id,
        announcement_code: header.announcement_code,
        contest_name: header.contest_name,
        posting_code: header.posting_code,
        role_title: header.role_title,
        administrative_unit: header.administrative_unit,
        file_number: header.file_number,
        application_date: header.application_date,
        application_time: header.application_time,
        specialist_name: header.specialist_name,
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
