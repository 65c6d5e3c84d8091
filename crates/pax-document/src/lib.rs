//! PAX Document Model
//!
//! Ordered, structurally shared configuration trees with copy-on-write
//! patching.
//!
//! # Core Concepts
//!
//! - [`Node`]: JSON-like value whose containers are reference counted
//! - [`Document`]: immutable root handle; every edit yields a new one
//! - [`DocPath`]: explicit key/index path into a document
//! - [`patch`](patch::patch): rebuilds only the spine to the target
//! - [`ContentHash`]: Blake3 fingerprint of a document's content
//!
//! # Example
//!
//! ```rust
//! use pax_document::{node, DocPath, Document};
//!
//! let doc = Document::new(node!({"stage": {"name": "deploy"}, "tags": {}}));
//! let path: DocPath = "stage.name".parse().unwrap();
//! let next = doc.set(&path, "release".into()).unwrap();
//!
//! assert!(!doc.same_version(&next));
//! assert!(doc.get(&"tags".parse().unwrap()).unwrap().unwrap()
//!     .same_node(next.get(&"tags".parse().unwrap()).unwrap().unwrap()));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod document;
mod hash;
mod node;
mod path;

pub mod patch;

pub use document::{CodecError, Document};
pub use hash::ContentHash;
pub use node::{Node, NodeKind, NodeMap};
pub use patch::PatchError;
pub use path::{DocPath, PathError, Segment};

#[doc(hidden)]
pub mod __private {
    pub use serde_json::json;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
