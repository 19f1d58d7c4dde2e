//! # examlink-contracts
//!
//! Shared types, schemas, and contracts for the EXAMLINK service.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate — only data definitions and error types.

pub mod consent;
pub mod error;
pub mod lifecycle;
pub mod link;
pub mod resource;
pub mod submission;
pub mod token;

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use error::{ExamLinkError, RejectionReason};
    use link::{HeaderSnapshot, Link, LinkId, LinkStatus};
    use resource::{ResourceId, ResourceView};
    use token::{RawToken, TokenHash};

    // ── Helpers ──────────────────────────────────────────────────────────────

    fn make_view() -> ResourceView {
        ResourceView {
            id: ResourceId::new("posting-001"),
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

    fn make_link(expires_at: chrono::DateTime<Utc>) -> Link {
        Link {
            id: LinkId::new(),
            token_hash: TokenHash("ab".repeat(32)),
            resource_id: ResourceId::new("posting-001"),
            header: HeaderSnapshot::from(&make_view()),
            status: LinkStatus::Issued,
            created_at: Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap(),
            expires_at,
            used_at: None,
            submission_count: 0,
        }
    }

    // ── LinkStatus ───────────────────────────────────────────────────────────

    #[test]
    fn link_status_terminality() {
        assert!(!LinkStatus::Issued.is_terminal());
        assert!(LinkStatus::Used.is_terminal());
        assert!(LinkStatus::Expired.is_terminal());
        assert!(LinkStatus::Revoked.is_terminal());
    }

    #[test]
    fn link_status_serializes_upper_snake() {
        let json = serde_json::to_string(&LinkStatus::Issued).unwrap();
        assert_eq!(json, "\"ISSUED\"");
        let decoded: LinkStatus = serde_json::from_str("\"REVOKED\"").unwrap();
        assert_eq!(decoded, LinkStatus::Revoked);
    }

    // ── Expiry boundary ──────────────────────────────────────────────────────

    #[test]
    fn link_expiry_boundary_is_inclusive() {
        let cutoff = Utc.with_ymd_and_hms(2026, 8, 2, 12, 0, 0).unwrap();
        let link = make_link(cutoff);

        // Exactly at expires_at the link is already expired.
        assert!(link.is_expired_at(cutoff));
        // One millisecond earlier it is still live.
        assert!(!link.is_expired_at(cutoff - chrono::Duration::milliseconds(1)));
        assert!(link.is_expired_at(cutoff + chrono::Duration::milliseconds(1)));
    }

    // ── HeaderSnapshot capture ───────────────────────────────────────────────

    #[test]
    fn header_snapshot_copies_every_display_field() {
        let view = make_view();
        let header = HeaderSnapshot::from(&view);

        assert_eq!(header.announcement_code, view.announcement_code);
        assert_eq!(header.contest_name, view.contest_name);
        assert_eq!(header.posting_code, view.posting_code);
        assert_eq!(header.role_title, view.role_title);
        assert_eq!(header.administrative_unit, view.administrative_unit);
        assert_eq!(header.file_number, view.file_number);
        assert_eq!(header.application_date, view.application_date);
        assert_eq!(header.application_time, view.application_time);
        assert_eq!(header.specialist_name, view.specialist_name);
        assert_eq!(header.specialist_email, view.specialist_email);
    }

    // ── Ids ──────────────────────────────────────────────────────────────────

    #[test]
    fn link_id_new_produces_unique_values() {
        let ids: Vec<LinkId> = (0..100).map(|_| LinkId::new()).collect();

        let unique: std::collections::HashSet<String> =
            ids.iter().map(|id| id.0.to_string()).collect();
        assert_eq!(unique.len(), 100);
    }

    // ── RawToken redaction ───────────────────────────────────────────────────

    #[test]
    fn raw_token_debug_never_prints_the_secret() {
        let token = RawToken::new("deadbeef".repeat(6));
        let rendered = format!("{:?}", token);
        assert!(!rendered.contains("deadbeef"));
        assert!(rendered.contains("redacted"));
    }

    // ── RejectionReason wire spelling ────────────────────────────────────────

    #[test]
    fn rejection_reason_round_trips_lowercase() {
        for (reason, wire) in [
            (RejectionReason::Invalid, "\"invalid\""),
            (RejectionReason::Expired, "\"expired\""),
            (RejectionReason::Used, "\"used\""),
            (RejectionReason::Revoked, "\"revoked\""),
        ] {
            let json = serde_json::to_string(&reason).unwrap();
            assert_eq!(json, wire);
            let decoded: RejectionReason = serde_json::from_str(wire).unwrap();
            assert_eq!(decoded, reason);
            assert_eq!(format!("\"{}\"", reason.as_str()), wire);
        }
    }

    // ── ExamLinkError mapping and display ────────────────────────────────────

    #[test]
    fn error_rejection_maps_validity_failures_only() {
        assert_eq!(
            ExamLinkError::InvalidToken.rejection(),
            Some(RejectionReason::Invalid)
        );
        assert_eq!(ExamLinkError::Expired.rejection(), Some(RejectionReason::Expired));
        assert_eq!(ExamLinkError::Used.rejection(), Some(RejectionReason::Used));
        assert_eq!(ExamLinkError::Revoked.rejection(), Some(RejectionReason::Revoked));

        assert_eq!(
            ExamLinkError::ResourceNotFound { resource_id: "x".to_string() }.rejection(),
            None
        );
        assert_eq!(
            ExamLinkError::Internal { reason: "boom".to_string() }.rejection(),
            None
        );
    }

    #[test]
    fn error_resource_not_found_display() {
        let err = ExamLinkError::ResourceNotFound {
            resource_id: "posting-404".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("posting-404"));
        assert!(msg.contains("not found"));
    }

    #[test]
    fn error_conflict_display() {
        let err = ExamLinkError::Conflict {
            reason: "token hash already exists".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("store conflict"));
        assert!(msg.contains("token hash already exists"));
    }

    #[test]
    fn error_validation_failed_display() {
        let err = ExamLinkError::ValidationFailed {
            reason: "aspect weights of case 1 sum to 90".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("validation failed"));
        assert!(msg.contains("case 1"));
    }
}
