//! Digest utilities
//!
//! Two digests are in use: a SHA-256 content digest (`sha256:<hex>`) carried
//! by every resource handed to the pipeline, and a short MD5 token derived
//! from directory names for resource schemes.

use sha2::{Digest, Sha256};

/// Prefix for all content digests produced by this module
const PREFIX: &str = "sha256:";

/// Compute the SHA-256 digest of in-memory content.
///
/// Returns a string in the canonical format `"sha256:<hex>"`.
pub fn content_digest(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{}{:x}", PREFIX, hasher.finalize())
}

/// MD5 of the UTF-8 bytes of `value` as lowercase hex.
///
/// Leading zero nibbles are dropped, i.e. the digest is rendered as an
/// unsigned big integer. Tokens issued by earlier deployments were rendered
/// that way and must keep matching.
pub fn md5_token(value: &str) -> String {
    let hex = format!("{:x}", md5::compute(value.as_bytes()));
    let trimmed = hex.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
