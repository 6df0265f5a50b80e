//! Cache key generation.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::DocumentReference;

/// Namespace mixed into every key so entries from other producers never collide.
pub const NAMESPACE: &str = "gdoc";

/// Fixed-length fingerprint identifying a (document, query, sheet) triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a document reference.
    pub fn derive(namespace: &str, reference: &DocumentReference) -> Self {
        Self(compute_cache_key(
            namespace,
            &reference.key,
            reference.query.as_deref().unwrap_or(""),
            reference.sheet_id.as_deref().unwrap_or(""),
        ))
    }

    pub fn for_reference(reference: &DocumentReference) -> Self {
        Self::derive(NAMESPACE, reference)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the hex SHA-256 fingerprint over the key components.
pub fn compute_cache_key(namespace: &str, key: &str, query: &str, sheet_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    hasher.update(b"\n");
    hasher.update(key.as_bytes());
    hasher.update(b"\n");
    hasher.update(query.as_bytes());
    hasher.update(b"\n");
    hasher.update(sheet_id.as_bytes());
    hex::encode(hasher.finalize())
}
