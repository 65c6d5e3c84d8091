//! Error types for editing sessions
//!
//! [`SessionError`] aggregates every layer's failures; [`ErrorKind`] is the
//! coarse classification callers branch on:
//! - `NotFound`: stage, override set or document missing; nothing is saved
//! - `InvalidPath`: document shape blocks the edit; document left unchanged
//! - `DuplicateIdentifier`: sidecar rejected, re-prompt the user
//! - `Network`: connector listing failed, offer a retry

use crate::config::ConfigError;
use crate::store::StoreError;
use pax_artifact::{ArtifactError, ResolveError};
use pax_connector::LookupError;
use pax_document::{CodecError, PatchError};
use std::fmt::{self, Display, Formatter};

/// Coarse session error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InvalidPath,
    DuplicateIdentifier,
    IndexOutOfRange,
    Malformed,
    Network,
    Codec,
    Config,
    Store,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotFound => "not_found",
            Self::InvalidPath => "invalid_path",
            Self::DuplicateIdentifier => "duplicate_identifier",
            Self::IndexOutOfRange => "index_out_of_range",
            Self::Malformed => "malformed",
            Self::Network => "network",
            Self::Codec => "codec",
            Self::Config => "config",
            Self::Store => "store",
        };
        f.write_str(s)
    }
}

/// Main session error type
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Editing context did not resolve
    #[error("resolve failed: {0}")]
    Resolve(#[from] ResolveError),

    /// Patch aborted
    #[error("patch failed: {0}")]
    Patch(#[from] PatchError),

    /// Reducer rejected the action or the stored artifacts are malformed
    #[error("artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    /// Connector listing failed
    #[error("connector lookup failed: {0}")]
    Lookup(#[from] LookupError),

    /// YAML/JSON conversion failed
    #[error("document codec error: {0}")]
    Codec(#[from] CodecError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Document store failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl SessionError {
    /// Classify
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Resolve(ResolveError::Document(_)) | Self::Patch(_) => ErrorKind::InvalidPath,
            Self::Resolve(_) | Self::Store(StoreError::NotFound(_)) => ErrorKind::NotFound,
            Self::Artifact(ArtifactError::DuplicateIdentifier { .. }) => ErrorKind::DuplicateIdentifier,
            Self::Artifact(ArtifactError::IndexOutOfRange { .. }) => ErrorKind::IndexOutOfRange,
            Self::Artifact(_) => ErrorKind::Malformed,
            Self::Lookup(_) => ErrorKind::Network,
            Self::Codec(_) => ErrorKind::Codec,
            Self::Config(_) => ErrorKind::Config,
            Self::Store(_) => ErrorKind::Store,
        }
    }

    /// Check if the user can fix this by re-entering the edit
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Artifact(e) if e.is_recoverable())
    }

    /// Check if error is retryable
    ///
    /// Retries are user-initiated; nothing in the session retries on its own.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Lookup(e) => e.is_retryable(),
            Self::Store(e) => e.is_retryable(),
            _ => false,
        }
    }
}
