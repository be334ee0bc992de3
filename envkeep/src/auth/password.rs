//! Password digests and constant-time comparison.
//!
//! The digest is a single unsalted SHA-256 over the UTF-8 bytes of the
//! password, hex encoded. It is deterministic, so the same function serves
//! registration and verification.
// TODO: replace with a salted, memory-hard KDF (argon2id) once existing
// hashes can be migrated on next successful login.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Length of a hex-encoded SHA-256 digest
pub const HASH_LEN: usize = 64;

/// Hash a password for storage or comparison
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Compare two byte strings in time independent of their contents
///
/// Inputs of different lengths return `false` immediately. This is the one
/// early exit: digest lengths are fixed and public, so it reveals nothing
/// about the stored value.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Verify a password against a stored digest
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    constant_time_eq(hash_password(password).as_bytes(), stored_hash.as_bytes())
}
