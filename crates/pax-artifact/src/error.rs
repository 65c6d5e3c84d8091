//! Error types for artifact editing
//!
//! - [`ArtifactError`]: reducer and decoding failures
//! - [`ResolveError`]: editing-context path resolution failures

use crate::entry::ArtifactRole;
use pax_document::{NodeKind, PatchError};

/// Reducer and decoding errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArtifactError {
    /// Sidecar identifier already used at another index
    #[error("duplicate sidecar identifier '{identifier}' (already at index {existing_index})")]
    DuplicateIdentifier {
        identifier: String,
        existing_index: usize,
    },

    /// Sidecar index not addressable
    #[error("sidecar index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Artifact object does not have the expected shape
    #[error("malformed {role} artifact: {reason}")]
    MalformedEntry { role: ArtifactRole, reason: String },

    /// `artifacts` container is not an object
    #[error("artifacts container must be an object, found {found}")]
    MalformedContainer { found: NodeKind },

    /// `sidecars` is not a list of `{sidecar: ...}` wrappers
    #[error("malformed sidecars: {0}")]
    MalformedSidecars(String),
}

impl ArtifactError {
    /// Errors the user can fix by re-entering the artifact
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::DuplicateIdentifier { .. } | Self::IndexOutOfRange { .. })
    }
}

/// Path resolution errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// No stage with this identifier (or name) in the pipeline
    #[error("stage '{0}' not found")]
    StageNotFound(String),

    /// Stage has no override set with this identifier
    #[error("override set '{identifier}' not found in stage '{stage}'")]
    OverrideSetNotFound { identifier: String, stage: String },

    /// Stage does not propagate from another stage
    #[error("stage '{0}' does not use another stage's service")]
    NoParentStage(String),

    /// Document shape prevented traversal
    #[error(transparent)]
    Document(#[from] PatchError),
}

impl ResolveError {
    /// Whether this is a not-found condition (as opposed to a malformed document)
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        !matches!(self, Self::Document(_))
    }
}
