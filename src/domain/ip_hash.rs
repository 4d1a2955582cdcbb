//! Privacy-preserving visitor identity.
//!
//! The raw network address of a visitor never reaches the store: it is
//! reduced to a hex-encoded SHA-256 digest at the ingestion boundary. The
//! digest is unsalted, so the same address always yields the same
//! [`IpHash`]; revisit detection depends on that.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use utoipa::ToSchema;

/// Hex-encoded SHA-256 digest of a visitor's network address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct IpHash(String);

impl IpHash {
    /// Hashes a raw network address.
    #[must_use]
    pub fn from_address(raw: &str) -> Self {
        Self(hex::encode(Sha256::digest(raw.as_bytes())))
    }

    /// Wraps a digest previously produced by [`IpHash::from_address`]
    /// (e.g. when reading it back from the store).
    #[must_use]
    pub const fn from_digest(digest: String) -> Self {
        Self(digest)
    }

    /// Returns the hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IpHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_sha256_test_vector() {
        let hash = IpHash::from_address("abc");
        assert_eq!(
            hash.as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn is_deterministic() {
        assert_eq!(
            IpHash::from_address("203.0.113.7"),
            IpHash::from_address("203.0.113.7")
        );
    }

    #[test]
    fn never_contains_raw_address() {
        let hash = IpHash::from_address("203.0.113.7");
        assert!(!hash.as_str().contains("203.0.113.7"));
        assert_eq!(hash.as_str().len(), 64);
        assert_ne!(hash, IpHash::from_address("203.0.113.8"));
    }
}
