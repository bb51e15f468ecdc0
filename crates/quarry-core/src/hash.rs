//! Content hashing and stable naming hashes

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Identifiers longer than this are truncated by [`truncate_identifier`]
pub const IDENTIFIER_LIMIT: usize = 50;

/// Characters kept from the original identifier when truncating
pub const IDENTIFIER_KEEP: usize = 40;

/// A SHA-256 based content hash of a source file.
///
/// Recorded on built assets so two placements sharing a cache entry can be
/// traced back to the exact bytes that produced it.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Compute a hash from bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let result = hasher.finalize();
        Self(result.into())
    }

    /// Get the hash as a hex string
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Get the hash as a prefixed hex string (e.g., "sha256:abcdef...")
    pub fn to_prefixed_hex(&self) -> String {
        format!("sha256:{}", self.to_hex())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

/// 32-bit polynomial string hash (multiplier 31) over Unicode code points.
///
/// Order-preserving and stable across runs and platforms. Not collision
/// resistant: callers accept that two identities may share a value.
pub fn string_hash_code(s: &str) -> i32 {
    s.chars()
        .fold(0u32, |h, c| h.wrapping_mul(31).wrapping_add(c as u32)) as i32
}

/// Eight lowercase hex digits of the absolute value of [`string_hash_code`]
pub fn hash_suffix(s: &str) -> String {
    format!("{:08x}", string_hash_code(s).unsigned_abs())
}

/// Shorten an identifier that exceeds [`IDENTIFIER_LIMIT`] characters.
///
/// The result keeps the first [`IDENTIFIER_KEEP`] characters followed by
/// `_` and the hash suffix of the full original, so truncating the same
/// input always yields the same name.
pub fn truncate_identifier(name: &str) -> String {
    if name.chars().count() <= IDENTIFIER_LIMIT {
        return name.to_string();
    }
    let head: String = name.chars().take(IDENTIFIER_KEEP).collect();
    format!("{}_{}", head, hash_suffix(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consistent_hashing() {
        let h1 = ContentHash::from_bytes(b"hello");
        let h2 = ContentHash::from_bytes(b"hello");
        assert_eq!(h1, h2);
        assert_ne!(h1, ContentHash::from_bytes(b"world"));
    }

    #[test]
    fn test_prefixed_hex() {
        let h = ContentHash::from_bytes(b"test data");
        let prefixed = h.to_prefixed_hex();
        assert!(prefixed.starts_with("sha256:"));
        assert_eq!(prefixed.len(), 7 + 64);
    }

    #[test]
    fn test_string_hash_known_values() {
        assert_eq!(string_hash_code(""), 0);
        assert_eq!(string_hash_code("hello"), 99162322);
        assert_eq!(hash_suffix("hello"), "05e918d2");
    }

    #[test]
    fn test_hash_suffix_of_min_value() {
        // Hashes to i32::MIN, whose absolute value only fits unsigned.
        assert_eq!(string_hash_code("polygenelubricants"), i32::MIN);
        assert_eq!(hash_suffix("polygenelubricants"), "80000000");
    }

    #[test]
    fn test_short_identifier_untouched() {
        assert_eq!(truncate_identifier("SM_Rock_01"), "SM_Rock_01");
        let exact = "a".repeat(IDENTIFIER_LIMIT);
        assert_eq!(truncate_identifier(&exact), exact);
    }

    #[test]
    fn test_truncation_is_stable() {
        let long = "BuildingFoundation_PersistentLevel_StaticMeshActor_UAID_0123456789";
        let first = truncate_identifier(long);
        let second = truncate_identifier(long);
        assert_eq!(first, second);
        assert_eq!(first.chars().count(), IDENTIFIER_KEEP + 1 + 8);
        assert!(first.starts_with(&long[..IDENTIFIER_KEEP]));
        assert!(first.ends_with(&hash_suffix(long)));
    }

    #[test]
    fn test_truncation_distinguishes_shared_prefix() {
        let a = format!("{}{}", "x".repeat(45), "alpha");
        let b = format!("{}{}", "x".repeat(45), "bravo");
        assert_ne!(truncate_identifier(&a), truncate_identifier(&b));
    }
}
