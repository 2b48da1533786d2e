use cadb_types::ObjectId;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag (e.g. `"cadb-object-v1"`) that is
/// prepended to every hash computation, so identical bytes hashed for two
/// different purposes never collide.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for database objects (raw values and recipes).
    pub const OBJECT: Self = Self {
        domain: "cadb-object-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ObjectId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ObjectId::from_hash(*hasher.finalize().as_bytes())
    }

    /// Verify that data produces the expected object ID.
    pub fn verify(&self, data: &[u8], expected: &ObjectId) -> bool {
        self.hash(data) == *expected
    }

    pub fn domain(&self) -> &str {
        self.domain
    }
}

/// Errors from encoding or hashing.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum HasherError {
    #[error("serialization error: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domains_separate_identical_bytes() {
        let other = ContentHasher::new("cadb-test-v1");
        assert_ne!(ContentHasher::OBJECT.hash(b"x"), other.hash(b"x"));
        assert_eq!(other.domain(), "cadb-test-v1");
    }

    #[test]
    fn domain_hash_differs_from_plain_digest() {
        assert_ne!(ContentHasher::OBJECT.hash(b"x"), ObjectId::from_bytes(b"x"));
    }

    #[test]
    fn verify_detects_tampering() {
        let id = ContentHasher::OBJECT.hash(b"original");
        assert!(ContentHasher::OBJECT.verify(b"original", &id));
        assert!(!ContentHasher::OBJECT.verify(b"tampered", &id));
    }
}
