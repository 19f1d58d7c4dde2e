//! Bearer token newtypes.
//!
//! `RawToken` is the secret handed to the specialist, exposed exactly once
//! in the issue response. `TokenHash` is its one-way SHA-256 fingerprint —
//! the only form the store ever sees. The codec that produces and digests
//! these lives in `examlink-token`; this module defines the shapes.

use serde::{Deserialize, Serialize};

/// The secret bearer string: 48 lowercase hex characters.
///
/// Never persisted and never written to logs. `Debug` is implemented by
/// hand so the secret cannot leak through error formatting or tracing.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawToken(pub String);

impl RawToken {
    /// Wrap a candidate string presented by a caller.
    ///
    /// Does not validate — syntactic checks belong to the codec's
    /// `is_well_formed`, which callers run before constructing lookups.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Borrow the token text, e.g. to build the public form URL.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for RawToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RawToken(<redacted>)")
    }
}

/// SHA-256 hex digest of a `RawToken`, used as the storage lookup key.
///
/// Lookups are exact-match by design — no prefix or fuzzy matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenHash(pub String);
