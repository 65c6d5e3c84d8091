//! Session-scoped connector catalog using moka
//!
//! Holds the latest known status of every connector the session has looked
//! up, keyed by scoped reference. Writes are last-writer-wins.

use crate::lookup::ConnectorPage;
use crate::scope::ConnectorReference;
use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::time::Duration;

/// Connectivity status reported by the listing service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectorStatus {
    Success,
    Failure,
    Partial,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ConnectorStatus {
    #[inline]
    #[must_use]
    pub fn is_healthy(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl Display for ConnectorStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::Partial => "PARTIAL",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// Cached connector summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorCatalogEntry {
    pub reference: ConnectorReference,
    pub name: String,
    pub connector_type: String,
    pub status: ConnectorStatus,
}

impl ConnectorCatalogEntry {
    #[must_use]
    pub fn new(reference: ConnectorReference, status: ConnectorStatus) -> Self {
        Self {
            name: reference.identifier.clone(),
            reference,
            connector_type: String::new(),
            status,
        }
    }
}

/// Connector catalog
///
/// Cloning shares the underlying cache.
#[derive(Debug, Clone)]
pub struct ConnectorCatalog {
    inner: Cache<ConnectorReference, ConnectorCatalogEntry>,
}

impl ConnectorCatalog {
    /// Create catalog with max capacity
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::new(max_capacity),
        }
    }

    /// Create catalog whose entries expire after `ttl`
    #[inline]
    #[must_use]
    pub fn with_ttl(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    #[inline]
    pub fn insert(&self, entry: ConnectorCatalogEntry) {
        self.inner.insert(entry.reference.clone(), entry);
    }

    #[inline]
    #[must_use]
    pub fn get(&self, reference: &ConnectorReference) -> Option<ConnectorCatalogEntry> {
        self.inner.get(reference)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, reference: &ConnectorReference) -> bool {
        self.inner.contains_key(reference)
    }

    /// Store every connector of a listing page; returns how many were stored
    pub fn ingest(&self, page: &ConnectorPage) -> usize {
        for summary in &page.content {
            self.insert(summary.to_entry());
        }
        tracing::debug!(count = page.content.len(), "connector page ingested");
        page.content.len()
    }

    #[inline]
    pub fn invalidate(&self, reference: &ConnectorReference) {
        self.inner.invalidate(reference);
    }

    /// Invalidate all entries
    #[inline]
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Number of live entries
    ///
    /// Flushes pending maintenance first so the count reflects recent writes.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }
}

impl Default for ConnectorCatalog {
    fn default() -> Self {
        Self::new(1_000)
    }
}
