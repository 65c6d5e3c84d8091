//! Editing session
//!
//! One session owns one pipeline document and one active editing context.
//! User actions go through the reducer and are committed by the patcher;
//! connector fetches only ever write the catalog.
//!
//! ```text
//! dispatch(action)
//!   resolve(context, root, stage) -> path
//!   from_container(root[path])    -> list
//!   reducer.reduce(list, action)  -> next
//!   patch(root, path, next)       -> root'
//!   derive + reconcile            -> Commit
//!
//! begin_fetch()                   -> FetchTicket { token, query, request }
//! complete_fetch(token, result)   -> Applied | Stale | Failed
//! ```

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::store::DocumentStore;
use pax_artifact::{
    resolve, ArtifactAction, ArtifactEntry, ArtifactList, ArtifactReducer, EditingContext,
};
use pax_connector::{
    list_references, reconcile, ConnectorCatalog, ConnectorListRequest, ConnectorLookup, ConnectorPage,
    ConnectorQuery, FetchToken, FetchTracker, LookupError, Reconciliation, ReferenceSet,
};
use pax_document::{ContentHash, DocPath, Document};
use std::fmt;
use ulid::Ulid;

/// Result of a committed action
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    /// Artifact list after the action
    pub list: ArtifactList,
    /// Whether the document changed
    pub changed: bool,
    /// Connector references of `list`
    pub references: ReferenceSet,
    /// Catalog state for `references`
    pub reconciliation: Reconciliation,
}

/// A connector fetch the caller should run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub token: FetchToken,
    pub query: ConnectorQuery,
    pub request: ConnectorListRequest,
}

/// What a fetch completion did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Catalog updated with this many connectors
    Applied { ingested: usize },
    /// A newer fetch superseded this one; response dropped
    Stale,
    /// The fetch failed; nothing changed
    Failed(LookupError),
    /// Every reference was already in the catalog
    UpToDate,
}

/// Editing session over one pipeline document
pub struct EditingSession {
    id: Ulid,
    document_id: String,
    document: Document,
    saved_hash: ContentHash,
    stage: String,
    context: EditingContext,
    reducer: ArtifactReducer,
    catalog: ConnectorCatalog,
    fetches: FetchTracker,
    config: SessionConfig,
}

impl fmt::Debug for EditingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditingSession")
            .field("id", &self.id)
            .field("document_id", &self.document_id)
            .field("stage", &self.stage)
            .field("context", &self.context)
            .field("modified", &self.is_modified())
            .finish_non_exhaustive()
    }
}

impl EditingSession {
    /// Open a session on an already loaded document
    ///
    /// # Errors
    /// The stage or override set the context names does not exist.
    pub fn open(
        document_id: impl Into<String>,
        document: Document,
        stage: impl Into<String>,
        context: EditingContext,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let stage = stage.into();
        resolve(&context, document.root(), &stage)?;

        let session = Self {
            id: Ulid::new(),
            document_id: document_id.into(),
            saved_hash: document.content_hash(),
            document,
            stage,
            context,
            reducer: ArtifactReducer::new(config.clear_primary),
            catalog: config.build_catalog(),
            fetches: FetchTracker::new(),
            config,
        };
        tracing::info!(
            session = %session.id,
            document = %session.document_id,
            stage = %session.stage,
            context = %session.context,
            "editing session opened"
        );
        Ok(session)
    }

    /// Load a document from `store` and open a session on it
    ///
    /// # Errors
    /// Store failures, YAML errors, and everything [`Self::open`] reports.
    pub async fn load(
        store: &dyn DocumentStore,
        document_id: &str,
        stage: impl Into<String>,
        context: EditingContext,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let yaml = store.load(document_id).await?;
        let document = Document::from_yaml(&yaml)?;
        Self::open(document_id, document, stage, context, config)
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> Ulid {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// Current document version
    #[inline]
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    #[inline]
    #[must_use]
    pub fn stage(&self) -> &str {
        &self.stage
    }

    #[inline]
    #[must_use]
    pub fn context(&self) -> &EditingContext {
        &self.context
    }

    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &ConnectorCatalog {
        &self.catalog
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Switch to another editing context on another (or the same) stage
    ///
    /// # Errors
    /// The new context does not resolve; the session keeps the old one.
    pub fn switch_context(&mut self, stage: impl Into<String>, context: EditingContext) -> Result<(), SessionError> {
        let stage = stage.into();
        resolve(&context, self.document.root(), &stage)?;
        tracing::debug!(session = %self.id, stage = %stage, context = %context, "editing context switched");
        self.stage = stage;
        self.context = context;
        Ok(())
    }

    /// Path of the active artifacts container
    ///
    /// # Errors
    /// The context no longer resolves.
    pub fn artifacts_path(&self) -> Result<DocPath, SessionError> {
        Ok(resolve(&self.context, self.document.root(), &self.stage)?)
    }

    /// Artifact list at the active context, read fresh from the document
    ///
    /// # Errors
    /// Resolution failures or malformed stored artifacts.
    pub fn artifacts(&self) -> Result<ArtifactList, SessionError> {
        let path = self.artifacts_path()?;
        Ok(ArtifactList::from_container(self.document.get(&path)?)?)
    }

    /// Apply an action and commit it into the document
    ///
    /// On error the document is unchanged. An action that leaves the list
    /// as it was commits nothing and keeps the current document version.
    ///
    /// # Errors
    /// Resolution, reducer and patch failures.
    pub fn dispatch(&mut self, action: ArtifactAction) -> Result<Commit, SessionError> {
        let path = self.artifacts_path()?;
        let action_name = action.name();

        let existing = self.document.get(&path)?;
        let list = ArtifactList::from_container(existing)?;
        let next = match self.reducer.reduce(&list, action) {
            Ok(next) => next,
            Err(err) => {
                tracing::debug!(session = %self.id, action = action_name, error = %err, "action rejected");
                return Err(err.into());
            }
        };

        let changed = next != list;
        if changed {
            let container = next.write_container(existing);
            self.document = self.document.set(&path, container)?;
        }

        let references = list_references(&next);
        let reconciliation = reconcile(&references, &self.catalog);
        tracing::debug!(
            session = %self.id,
            action = action_name,
            path = %path,
            changed,
            references = references.len(),
            missing = reconciliation.missing.len(),
            "action committed"
        );

        Ok(Commit {
            list: next,
            changed,
            references,
            reconciliation,
        })
    }

    /// Replace the primary artifact
    ///
    /// # Errors
    /// See [`Self::dispatch`].
    pub fn set_primary(&mut self, entry: ArtifactEntry) -> Result<Commit, SessionError> {
        self.dispatch(ArtifactAction::SetPrimary(entry))
    }

    /// Clear the primary according to the configured policy
    ///
    /// # Errors
    /// See [`Self::dispatch`].
    pub fn clear_primary(&mut self) -> Result<Commit, SessionError> {
        self.dispatch(ArtifactAction::ClearPrimary)
    }

    /// Replace the sidecar at `index`, or append when `index` is the length
    ///
    /// # Errors
    /// See [`Self::dispatch`].
    pub fn upsert_sidecar(&mut self, index: usize, entry: ArtifactEntry) -> Result<Commit, SessionError> {
        self.dispatch(ArtifactAction::UpsertSidecar { index, entry })
    }

    /// Remove the sidecar at `index`; later sidecars shift down
    ///
    /// # Errors
    /// See [`Self::dispatch`].
    pub fn remove_sidecar(&mut self, index: usize) -> Result<Commit, SessionError> {
        self.dispatch(ArtifactAction::RemoveSidecar { index })
    }

    /// Connector references of the active artifact list
    ///
    /// # Errors
    /// See [`Self::artifacts`].
    pub fn references(&self) -> Result<ReferenceSet, SessionError> {
        Ok(list_references(&self.artifacts()?))
    }

    /// Reconcile the active references against the catalog
    ///
    /// # Errors
    /// See [`Self::artifacts`].
    pub fn reconcile(&self) -> Result<Reconciliation, SessionError> {
        Ok(reconcile(&self.references()?, &self.catalog))
    }

    /// Issue a fetch for the references the catalog is missing
    ///
    /// Returns `None` when nothing is missing. Issuing supersedes any fetch
    /// still in flight.
    ///
    /// # Errors
    /// See [`Self::artifacts`].
    pub fn begin_fetch(&mut self) -> Result<Option<FetchTicket>, SessionError> {
        let Some(request) = self.reconcile()?.request() else {
            return Ok(None);
        };
        let token = self.fetches.issue();
        tracing::debug!(
            session = %self.id,
            token = %token,
            connectors = request.connector_identifiers.len(),
            "connector fetch issued"
        );
        Ok(Some(FetchTicket {
            token,
            query: self.config.query(),
            request,
        }))
    }

    /// Deliver the result of the fetch tagged `token`
    pub fn complete_fetch(&mut self, token: FetchToken, result: Result<ConnectorPage, LookupError>) -> FetchOutcome {
        if !self.fetches.settle(token) {
            tracing::debug!(
                session = %self.id,
                token = %token,
                latest = ?self.fetches.latest(),
                "stale connector response dropped"
            );
            return FetchOutcome::Stale;
        }

        match result {
            Ok(page) => {
                let ingested = self.catalog.ingest(&page);
                tracing::debug!(session = %self.id, token = %token, ingested, "connector fetch applied");
                FetchOutcome::Applied { ingested }
            }
            Err(err) => {
                tracing::warn!(session = %self.id, token = %token, error = %err, "connector fetch failed");
                FetchOutcome::Failed(err)
            }
        }
    }

    /// Fetch missing connectors through `lookup`, following pages
    ///
    /// # Errors
    /// [`SessionError::Lookup`] when the listing call fails.
    pub async fn refresh_connectors(&mut self, lookup: &dyn ConnectorLookup) -> Result<FetchOutcome, SessionError> {
        let Some(ticket) = self.begin_fetch()? else {
            return Ok(FetchOutcome::UpToDate);
        };
        let result = fetch_all_pages(lookup, ticket.query, &ticket.request).await;
        match self.complete_fetch(ticket.token, result) {
            FetchOutcome::Failed(err) => Err(err.into()),
            outcome => Ok(outcome),
        }
    }

    /// Whether the document differs from what was loaded or last saved
    #[inline]
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.document.content_hash() != self.saved_hash
    }

    /// Serialize the current document
    ///
    /// # Errors
    /// YAML encoding failure.
    pub fn to_yaml(&self) -> Result<String, SessionError> {
        Ok(self.document.to_yaml()?)
    }

    /// Persist the full document to `store`
    ///
    /// # Errors
    /// Encoding or store failures; the session stays modified.
    pub async fn save(&mut self, store: &dyn DocumentStore) -> Result<ContentHash, SessionError> {
        let yaml = self.to_yaml()?;
        let hash = self.document.content_hash();
        store.save(&self.document_id, &yaml).await?;
        self.saved_hash = hash;
        tracing::info!(session = %self.id, document = %self.document_id, hash = %hash.short(), "document saved");
        Ok(hash)
    }
}

async fn fetch_all_pages(
    lookup: &dyn ConnectorLookup,
    mut query: ConnectorQuery,
    request: &ConnectorListRequest,
) -> Result<ConnectorPage, LookupError> {
    let mut combined = lookup.list_connectors(&query, request).await?;
    while !combined.content.is_empty() && (combined.content.len() as u64) < combined.total_items {
        query.page_index += 1;
        let page = lookup.list_connectors(&query, request).await?;
        if page.content.is_empty() {
            break;
        }
        combined.content.extend(page.content);
    }
    Ok(combined)
}
