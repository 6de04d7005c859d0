//! Fetch fingerprints: the cache key and blob filename of a fetch.

use crate::Error;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Length of a hex-encoded SHA-256 digest.
const FINGERPRINT_LEN: usize = 64;

/// SHA-256 digest of `"{METHOD} {URL}"`, hex encoded.
///
/// Hex output never contains a path separator, so the value doubles as a
/// blob filename. Request context is deliberately not part of the input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint for a method and URL.
    pub fn compute(method: &str, url: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(method.to_ascii_uppercase().as_bytes());
        hasher.update(b" ");
        hasher.update(url.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Validate a stored fingerprint string.
    pub fn parse(value: &str) -> Result<Self, Error> {
        if value.len() != FINGERPRINT_LEN || !value.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)) {
            return Err(Error::InvalidFingerprint(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Fingerprint> for String {
    fn from(value: Fingerprint) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_fingerprint_stability() {
        let a = Fingerprint::compute("GET", "https://x/y");
        let b = Fingerprint::compute("GET", "https://x/y");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_different_method() {
        let get = Fingerprint::compute("GET", "https://x/y");
        let post = Fingerprint::compute("POST", "https://x/y");
        assert_ne!(get, post);
    }

    #[test]
    fn test_fingerprint_no_collisions_across_urls() {
        let mut seen = HashSet::new();
        for congress in 100..120 {
            for page in 0..50 {
                let url = format!("https://api.congress.gov/v3/bill/{congress}?format=json&offset={page}");
                assert!(seen.insert(Fingerprint::compute("GET", &url)));
            }
        }
        assert_eq!(seen.len(), 20 * 50);
    }

    #[test]
    fn test_fingerprint_format() {
        let fp = Fingerprint::compute("GET", "https://example.com");
        assert_eq!(fp.as_str().len(), 64);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert!(!fp.as_str().contains('/'));
    }

    #[test]
    fn test_parse_round_trip() {
        let fp = Fingerprint::compute("GET", "https://example.com");
        assert_eq!(Fingerprint::parse(fp.as_str()).unwrap(), fp);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(Fingerprint::parse("../etc/passwd"), Err(Error::InvalidFingerprint(_))));
        assert!(matches!(Fingerprint::parse(""), Err(Error::InvalidFingerprint(_))));
        assert!(Fingerprint::parse(&"A".repeat(64)).is_err());
    }
}
