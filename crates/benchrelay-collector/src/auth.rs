//! Shared-secret credential verification.
//!
//! Every inbound report carries the worker's shared secret. The gate stores
//! a SHA-256 digest of the configured secret, computed once at construction,
//! and verifies callers by hashing their credential the same way and
//! comparing digests.
//!
//! The secret is hashed over its UTF-16LE code units, which is the encoding
//! workers and collectors have always agreed on for this credential.

use sha2::{Digest as _, Sha256};

/// Credential gate holding the digest of the configured shared secret.
///
/// Verification compares all digest bytes with a full-length scan rather
/// than short-circuiting on the first mismatch. This is not a dedicated
/// constant-time primitive; the scan length is fixed but the comparison
/// is ordinary branching code. A known hardening gap.
#[derive(Clone)]
pub struct AuthGate {
    secret_hash: [u8; 32],
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate")
            .field("secret_hash", &"[REDACTED]")
            .finish()
    }
}

impl AuthGate {
    /// Creates a gate for the given shared secret.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            secret_hash: Self::digest(secret),
        }
    }

    /// Verifies a caller-supplied credential against the stored digest.
    ///
    /// Never panics or faults; an un-verifiable credential is simply
    /// rejected.
    #[must_use]
    pub fn verify(&self, credential: &str) -> bool {
        let candidate = Self::digest(credential);
        candidate
            .iter()
            .zip(self.secret_hash.iter())
            .fold(true, |matching, (a, b)| matching & (a == b))
    }

    fn digest(secret: &str) -> [u8; 32] {
        let mut bytes = Vec::with_capacity(secret.len() * 2);
        for unit in secret.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        Sha256::digest(&bytes).into()
    }
}
