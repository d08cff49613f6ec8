//! Content hashing utilities.

use sha2::{Digest, Sha256};
use xxhash_rust::xxh3::{xxh3_128, xxh3_64};

/// Compute a content hash for arbitrary bytes
#[must_use]
pub fn content_hash(data: &[u8]) -> u64 {
    xxh3_64(data)
}

/// Lowercase hex SHA-256 of the given bytes.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    let mut out = String::with_capacity(64);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// UUID-shaped identifier derived from content, stable across runs.
///
/// Version and variant bits are set so the value reads as a v4 UUID.
#[must_use]
pub fn deterministic_uuid(data: &[u8]) -> uuid::Uuid {
    let mut bytes = xxh3_128(data).to_be_bytes();
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
    uuid::Uuid::from_bytes(bytes)
}
