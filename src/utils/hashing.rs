//! Stable hashing for state file names

use sha2::{Digest, Sha256};

/// First 16 hex chars of the SHA-256 of `value`.
pub fn stable_key(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let result = hasher.finalize();
    format!("{:x}", result)[..16].to_string()
}
