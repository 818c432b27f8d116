//! BLAKE3 content hashing for dry-run pins and log fingerprints.

use blake3::Hasher;

/// Prefix marking identifiers that were never published.
pub const DRY_RUN_CID_PREFIX: &str = "b3-";

/// Short fingerprint for correlating log lines about the same upload.
///
/// Truncated to 64 bits; not suitable as a storage key.
#[inline]
pub fn fingerprint(data: &[u8]) -> u64 {
    let hash = blake3::hash(data);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

/// Local content identifier: `b3-` followed by the hex digest.
#[inline]
pub fn content_id(data: &[u8]) -> String {
    format!("{DRY_RUN_CID_PREFIX}{}", blake3::hash(data).to_hex())
}

/// Content identifier for a named upload; the name is part of the digest.
pub fn named_content_id(name: &str, data: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(name.as_bytes());
    hasher.update(b"|");
    hasher.update(data);
    format!("{DRY_RUN_CID_PREFIX}{}", hasher.finalize().to_hex())
}
