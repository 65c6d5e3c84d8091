//! Document fingerprints
//!
//! Provides [`ContentHash`], a 32-byte Blake3 digest of a node's canonical
//! JSON encoding. Two documents with equal content have equal hashes
//! regardless of whether they share structure.

use crate::node::Node;
use std::fmt::{self, Display, Formatter};

/// A 32-byte content hash (Blake3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    #[inline]
    const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Hash a node by its canonical encoding
    ///
    /// Object keys are visited in document order; key order is part of the
    /// content.
    #[must_use]
    pub fn of_node(node: &Node) -> Self {
        let mut hasher = blake3::Hasher::new();
        feed(&mut hasher, node);
        Self::new(*hasher.finalize().as_bytes())
    }

    /// Short string representation (first 16 hex chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

fn feed(hasher: &mut blake3::Hasher, node: &Node) {
    match node {
        Node::Null => {
            hasher.update(b"n");
        }
        Node::Bool(b) => {
            hasher.update(if *b { b"t" } else { b"f" });
        }
        Node::Number(n) => {
            hasher.update(b"#");
            hasher.update(n.to_string().as_bytes());
            hasher.update(&[0]);
        }
        Node::String(s) => {
            hasher.update(b"s");
            hasher.update(&(s.len() as u64).to_le_bytes());
            hasher.update(s.as_bytes());
        }
        Node::Array(items) => {
            hasher.update(b"[");
            hasher.update(&(items.len() as u64).to_le_bytes());
            for item in items.iter() {
                feed(hasher, item);
            }
        }
        Node::Object(map) => {
            hasher.update(b"{");
            hasher.update(&(map.len() as u64).to_le_bytes());
            for (key, value) in map.iter() {
                hasher.update(&(key.len() as u64).to_le_bytes());
                hasher.update(key.as_bytes());
                feed(hasher, value);
            }
        }
    }
}

impl Display for ContentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}
