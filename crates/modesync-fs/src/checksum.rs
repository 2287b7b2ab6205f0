//! SHA-256 checksum utilities
//!
//! One canonical format (`sha256:<hex>`) is used for the ownership marker
//! namespace in target files and for drift detection of owned entries.

use sha2::{Digest, Sha256};

const PREFIX: &str = "sha256:";

/// Compute the SHA-256 checksum of string content.
pub fn compute_content_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{}{:x}", PREFIX, hasher.finalize())
}
