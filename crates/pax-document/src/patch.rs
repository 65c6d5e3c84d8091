//! Copy-on-write patching
//!
//! [`patch`] rebuilds only the spine from the root down to the target path.
//! Every node that is not an ancestor of the target is carried over by
//! reference, so identity comparison on the result tells a caller exactly
//! which branches changed.

use crate::node::{Node, NodeKind};
use crate::path::{DocPath, Segment};
use std::sync::Arc;

/// Errors raised while traversing or patching a document
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    /// An intermediate node exists but cannot hold the next segment
    #[error("invalid path at '{at}': expected {expected}, found {found}")]
    InvalidPath {
        /// Prefix of the requested path that resolved to the offending node
        at: DocPath,
        /// Container the next segment needed
        expected: NodeKind,
        /// What is actually there
        found: NodeKind,
    },

    /// Index beyond the end of an array (appending is `index == len`)
    #[error("index {index} out of bounds at '{at}' (len {len})")]
    IndexOutOfBounds {
        /// Path of the array
        at: DocPath,
        /// Requested index
        index: usize,
        /// Current length
        len: usize,
    },
}

impl PatchError {
    /// Path prefix where the failure happened
    #[inline]
    #[must_use]
    pub fn at(&self) -> &DocPath {
        match self {
            Self::InvalidPath { at, .. } | Self::IndexOutOfBounds { at, .. } => at,
        }
    }
}

/// Apply `updater` at `path`, returning the new root
///
/// The updater receives the current node (`None` when missing) and its
/// return value fully replaces it. Missing intermediates are created:
/// objects for key segments, arrays for index segments. `null` counts as
/// missing.
///
/// # Errors
/// [`PatchError::InvalidPath`] when an intermediate is a scalar or the
/// wrong container kind; [`PatchError::IndexOutOfBounds`] when an index is
/// past `len`. The input is never modified.
pub fn patch<F>(root: &Node, path: &DocPath, updater: F) -> Result<Node, PatchError>
where
    F: FnOnce(Option<&Node>) -> Node,
{
    try_patch(root, path, |current| Ok::<_, PatchError>(updater(current)))
}

/// Fallible variant of [`patch`]
///
/// # Errors
/// Traversal errors from [`patch`], or whatever the updater returns.
pub fn try_patch<E, F>(root: &Node, path: &DocPath, updater: F) -> Result<Node, E>
where
    E: From<PatchError>,
    F: FnOnce(Option<&Node>) -> Result<Node, E>,
{
    patch_at(Some(root), path, 0, updater)
}

fn patch_at<E, F>(current: Option<&Node>, path: &DocPath, depth: usize, updater: F) -> Result<Node, E>
where
    E: From<PatchError>,
    F: FnOnce(Option<&Node>) -> Result<Node, E>,
{
    let current = current.filter(|node| !node.is_null());
    let Some(segment) = path.segments().get(depth) else {
        return updater(current);
    };

    match (segment, current) {
        (Segment::Key(key), Some(Node::Object(map))) => {
            let child = patch_at(map.get(key), path, depth + 1, updater)?;
            let mut next = (**map).clone();
            next.insert(key.clone(), child);
            Ok(Node::Object(Arc::new(next)))
        }
        (Segment::Key(key), None) => {
            let child = patch_at(None, path, depth + 1, updater)?;
            Ok(Node::from_pairs([(key.clone(), child)]))
        }
        (Segment::Index(index), Some(Node::Array(items))) => {
            let index = *index;
            if index > items.len() {
                return Err(PatchError::IndexOutOfBounds {
                    at: path.prefix(depth),
                    index,
                    len: items.len(),
                }
                .into());
            }
            let child = patch_at(items.get(index), path, depth + 1, updater)?;
            let mut next = (**items).clone();
            if index == next.len() {
                next.push(child);
            } else {
                next[index] = child;
            }
            Ok(Node::Array(Arc::new(next)))
        }
        (Segment::Index(index), None) => {
            if *index != 0 {
                return Err(PatchError::IndexOutOfBounds {
                    at: path.prefix(depth),
                    index: *index,
                    len: 0,
                }
                .into());
            }
            let child = patch_at(None, path, depth + 1, updater)?;
            Ok(Node::from_items([child]))
        }
        (segment, Some(found)) => Err(PatchError::InvalidPath {
            at: path.prefix(depth),
            expected: expected_container(segment),
            found: found.kind(),
        }
        .into()),
    }
}

/// Typed lookup
///
/// Returns `Ok(None)` when a segment is simply missing (or `null`), and
/// fails when traversal hits a node that cannot be descended into.
///
/// # Errors
/// [`PatchError::InvalidPath`] on a scalar or wrong-kind intermediate.
pub fn lookup<'a>(root: &'a Node, path: &DocPath) -> Result<Option<&'a Node>, PatchError> {
    let mut current = root;
    for (depth, segment) in path.segments().iter().enumerate() {
        let next = match (segment, current) {
            (_, Node::Null) => return Ok(None),
            (Segment::Key(key), Node::Object(map)) => map.get(key),
            (Segment::Index(index), Node::Array(items)) => items.get(*index),
            (segment, found) => {
                return Err(PatchError::InvalidPath {
                    at: path.prefix(depth),
                    expected: expected_container(segment),
                    found: found.kind(),
                })
            }
        };
        match next {
            Some(node) => current = node,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

fn expected_container(segment: &Segment) -> NodeKind {
    match segment {
        Segment::Key(_) => NodeKind::Object,
        Segment::Index(_) => NodeKind::Array,
    }
}
