//! Cache key types.
//!
//! [`ContentHash`] is the fingerprint of a graph state. [`ArtifactKey`] pairs
//! it with the reference-graph version, because generated code depends on
//! both the node graph and the cross-fragment references.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Fingerprint of a program graph state.
///
/// The empty graph maps to [`ContentHash::Empty`], a dedicated variant that
/// can never compare equal to a real digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentHash {
    /// Sentinel for a graph with zero nodes.
    Empty,
    /// blake3 digest of the canonical snapshot.
    Digest([u8; 32]),
}

impl ContentHash {
    /// Wraps a finished blake3 hash.
    pub fn from_digest(hash: blake3::Hash) -> Self {
        ContentHash::Digest(*hash.as_bytes())
    }

    /// Returns `true` for the empty-graph sentinel.
    pub fn is_empty(&self) -> bool {
        matches!(self, ContentHash::Empty)
    }

    /// The raw digest bytes, or `None` for the sentinel.
    pub fn as_bytes(&self) -> Option<&[u8; 32]> {
        match self {
            ContentHash::Empty => None,
            ContentHash::Digest(bytes) => Some(bytes),
        }
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentHash::Empty => f.write_str("empty"),
            ContentHash::Digest(bytes) => {
                for byte in bytes {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }
    }
}

/// Key of a generated-code cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactKey {
    /// Hash of the node graph.
    pub content: ContentHash,
    /// Reference-graph version at generation time.
    pub references: u64,
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@r{}", self.content, self.references)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_never_equals_digest() {
        let zero = ContentHash::Digest([0u8; 32]);
        assert_ne!(ContentHash::Empty, zero);
        assert!(ContentHash::Empty.is_empty());
        assert!(!zero.is_empty());
        assert!(ContentHash::Empty.as_bytes().is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(ContentHash::Empty.to_string(), "empty");
        let h = ContentHash::from_digest(blake3::hash(b"weft"));
        let s = h.to_string();
        assert_eq!(s.len(), 64, "Display should be 64 hex chars");
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));

        let key = ArtifactKey {
            content: ContentHash::Empty,
            references: 3,
        };
        assert_eq!(key.to_string(), "empty@r3");
    }

    #[test]
    fn test_serde_roundtrip() {
        let h = ContentHash::from_digest(blake3::hash(b"serde"));
        let json = serde_json::to_string(&h).unwrap();
        let back: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(h, back);
    }
}
