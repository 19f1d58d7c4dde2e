//! # examlink-token
//!
//! The bearer token codec: generation, one-way hashing, and syntax checks.
//!
//! All three functions are pure and side-effect free apart from drawing
//! entropy.  Hash input layout is simply the UTF-8 bytes of the 48-char hex
//! token fed into SHA-256, hex-encoded lowercase — deterministic, so the
//! digest can serve as the exact-match storage key while the raw token is
//! never persisted.

use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

use examlink_contracts::token::{RawToken, TokenHash};

/// Entropy drawn per token. 24 random bytes make guessing infeasible.
pub const TOKEN_BYTES: usize = 24;

/// Length of the hex-encoded token: 48 characters.
pub const TOKEN_HEX_LEN: usize = TOKEN_BYTES * 2;

/// Generate a fresh bearer token from the operating system CSPRNG.
///
/// The token is lowercase hex and `TOKEN_HEX_LEN` characters long, so
/// `is_well_formed(generate().as_str())` always holds.
pub fn generate() -> RawToken {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    RawToken(hex::encode(bytes))
}

/// Compute the SHA-256 storage fingerprint of a token.
///
/// Deterministic: the same token always digests to the same hash. Returns
/// a lowercase 64-character hex string.
pub fn hash(token: &RawToken) -> TokenHash {
    let mut hasher = Sha256::new();
    hasher.update(token.as_str().as_bytes());
    TokenHash(hex::encode(hasher.finalize()))
}

/// Cheap syntactic gate run before any store lookup.
///
/// Accepts exactly `TOKEN_HEX_LEN` hex characters, either case. Anything
/// else is rejected without touching the store.
pub fn is_well_formed(candidate: &str) -> bool {
    candidate.len() == TOKEN_HEX_LEN && candidate.bytes().all(|b| b.is_ascii_hexdigit())
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_are_well_formed() {
        for _ in 0..50 {
            let token = generate();
            assert_eq!(token.as_str().len(), TOKEN_HEX_LEN);
            assert!(is_well_formed(token.as_str()));
            // generate() emits lowercase hex only.
            assert!(token
                .as_str()
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        }
    }

    #[test]
    fn generated_tokens_are_unique() {
        let tokens: std::collections::HashSet<String> =
            (0..200).map(|_| generate().0).collect();
        assert_eq!(tokens.len(), 200);
    }

    #[test]
    fn hash_is_stable_and_deterministic() {
        let token = RawToken::new("0123456789abcdef".repeat(3));
        let first = hash(&token);
        let second = hash(&token);
        assert_eq!(first, second);

        // 64 lowercase hex chars.
        assert_eq!(first.0.len(), 64);
        assert!(first.0.bytes().all(|b| b.is_ascii_hexdigit()));
        assert_eq!(first.0, first.0.to_lowercase());
    }

    #[test]
    fn hash_differs_between_tokens() {
        let a = hash(&RawToken::new("00".repeat(24)));
        let b = hash(&RawToken::new("01".repeat(24)));
        assert_ne!(a, b);
    }

    #[test]
    fn well_formedness_rejects_bad_lengths() {
        assert!(!is_well_formed(""));
        assert!(!is_well_formed("abc123"));
        assert!(!is_well_formed(&"a".repeat(TOKEN_HEX_LEN - 1)));
        assert!(!is_well_formed(&"a".repeat(TOKEN_HEX_LEN + 1)));
        assert!(is_well_formed(&"a".repeat(TOKEN_HEX_LEN)));
    }

    #[test]
    fn well_formedness_rejects_non_hex() {
        let mut candidate = "a".repeat(TOKEN_HEX_LEN);
        candidate.replace_range(10..11, "g");
        assert!(!is_well_formed(&candidate));

        let spaced = format!("{} ", "a".repeat(TOKEN_HEX_LEN - 1));
        assert!(!is_well_formed(&spaced));
    }

    #[test]
    fn well_formedness_accepts_uppercase_hex() {
        assert!(is_well_formed(&"AB".repeat(24)));
    }
}
