//! Canonical catalog resource shape.
//!
//! The external catalog historically exposed the same concepts under several
//! competing field aliases. A `CatalogResolver` adapter normalizes a record
//! into `ResourceView` exactly once, at the boundary — the core never
//! guesses aliases at call sites.

use serde::{Deserialize, Serialize};

/// Opaque identifier of a record in the external catalog (a job posting).
///
/// The catalog owns the id scheme; the core treats it as an exact-match key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId(pub String);

impl ResourceId {
    /// Construct a resource id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

/// The normalized display fields of a catalog record at resolution time.
///
/// This is the single canonical shape the issuing path reads when building
/// a link's `HeaderSnapshot`. Fields the catalog record lacks are carried
/// as empty strings rather than options — the form layer renders blanks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceView {
    /// The catalog id this view was resolved from.
    pub id: ResourceId,
    /// Code of the public announcement the posting belongs to.
    pub announcement_code: String,
    /// Name of the selection contest within the announcement.
    pub contest_name: String,
    /// The posting's own code (e.g. "CFEC2A09C-19482").
    pub posting_code: String,
    /// Role title of the posting.
    pub role_title: String,
    /// Administrative unit the posting is attached to.
    pub administrative_unit: String,
    /// File number assigned to the posting.
    pub file_number: String,
    /// Scheduled exam application date, preformatted for display.
    pub application_date: String,
    /// Scheduled exam application time, preformatted for display.
    pub application_time: String,
    /// Full name of the assigned specialist.
    pub specialist_name: String,
    /// Contact email of the assigned specialist.
    pub specialist_email: String,
}
