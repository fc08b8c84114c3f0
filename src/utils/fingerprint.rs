//! Visitor fingerprinting
//!
//! Clients are deduplicated by a one-way SHA-256 digest of their IP address.
//! Raw IPs never leave the request handler and are never persisted.

use sha2::{Digest, Sha256};

/// Compute the visitor fingerprint for a client IP.
pub fn visitor_fingerprint(ip: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ip.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}
