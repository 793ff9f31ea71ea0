//! SHA-256 content hashing for the audit trail
//!
//! Audit digests are plain SHA-256 over the exact bytes that crossed the wire,
//! encoded as lower-case hex. No domain separation is applied so that digests
//! can be reproduced with standard tooling (`sha256sum`).

use sha2::{Digest, Sha256};

/// 32-byte SHA-256 hash
pub type Hash256 = [u8; 32];

/// Hex digest of zero bytes.
pub const EMPTY_SHA256_HEX: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Compute the SHA-256 digest of `bytes`.
pub fn sha256(bytes: &[u8]) -> Hash256 {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().into()
}

/// Compute the lower-case hex SHA-256 digest of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(sha256(bytes))
}
