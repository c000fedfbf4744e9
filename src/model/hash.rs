//! Content hashing using BLAKE3
//!
//! A node's identity is a digest over its kind tag, its own fields, and the
//! identities of its dependencies, folded in a fixed order and truncated to
//! 64 bits. Two descriptions with equal fields and equal dependency ids hash
//! to the same `NodeId` in any process, which is what makes deduplication in
//! the registry correct.

use super::NodeId;

/// Incremental hasher producing a [`NodeId`].
///
/// Field order matters: callers must fold fields in a fixed, documented
/// order (kind tag first, then scalar fields, then dependency ids).
pub struct ContentHasher {
    inner: blake3::Hasher,
}

impl ContentHasher {
    pub fn new() -> Self {
        ContentHasher {
            inner: blake3::Hasher::new(),
        }
    }

    /// Fold a per-kind type tag; always the first field
    pub fn add_tag(&mut self, tag: u8) {
        self.inner.update(&[tag]);
    }

    pub fn add_bytes(&mut self, bytes: &[u8]) {
        self.inner.update(bytes);
    }

    pub fn add_str(&mut self, s: &str) {
        self.inner.update(s.as_bytes());
    }

    pub fn add_u32(&mut self, v: u32) {
        self.inner.update(&v.to_le_bytes());
    }

    /// Fold a dependency's identity
    pub fn add_id(&mut self, id: NodeId) {
        self.inner.update(&id.as_raw().to_le_bytes());
    }

    /// Finish the digest, truncated to the first 8 bytes
    pub fn finish(&self) -> NodeId {
        let digest = self.inner.finalize();
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&digest.as_bytes()[..8]);
        NodeId::from_raw(u64::from_le_bytes(raw))
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        ContentHasher::new()
    }
}
