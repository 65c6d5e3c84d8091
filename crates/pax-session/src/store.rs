//! Pipeline document persistence
//!
//! Stores exchange whole documents as YAML text keyed by pipeline
//! identifier. The session converts to and from the structured form.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Document store failures
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No document with this identifier
    #[error("document '{0}' not found")]
    NotFound(String),

    /// Identifier cannot name a document
    #[error("invalid document identifier '{0}'")]
    InvalidId(String),

    /// Underlying I/O failed
    #[error("document store I/O: {0}")]
    Io(#[from] std::io::Error),

    /// Remote store rejected the call
    #[error("document store backend: {0}")]
    Backend(String),
}

impl StoreError {
    /// Worth offering the user a retry
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Backend(_))
    }
}

/// Load/save contract of the pipeline persistence service
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch the YAML of document `id`
    async fn load(&self, id: &str) -> Result<String, StoreError>;

    /// Persist the full YAML of document `id`
    async fn save(&self, id: &str, yaml: &str) -> Result<(), StoreError>;
}

/// Directory of `<id>.yaml` files
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing document `id`
    ///
    /// # Errors
    /// [`StoreError::InvalidId`] for empty identifiers or ones that would
    /// escape the store directory.
    pub fn path_for(&self, id: &str) -> Result<PathBuf, StoreError> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !id.starts_with('.');
        if !valid {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        Ok(self.root.join(format!("{id}.yaml")))
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn load(&self, id: &str) -> Result<String, StoreError> {
        let path = self.path_for(id)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(yaml) => Ok(yaml),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound(id.to_string())),
            Err(err) => Err(err.into()),
        }
    }

    async fn save(&self, id: &str, yaml: &str) -> Result<(), StoreError> {
        let path = self.path_for(id)?;
        // Write-then-rename so readers never see a partial document
        let staging = path.with_extension("yaml.tmp");
        tokio::fs::write(&staging, yaml).await?;
        tokio::fs::rename(&staging, &path).await?;
        tracing::debug!(id, path = %path.display(), bytes = yaml.len(), "document written");
        Ok(())
    }
}
