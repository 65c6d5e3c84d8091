//! PAX Editing Sessions
//!
//! Owns a pipeline document for the duration of an edit: commits reducer
//! actions through the copy-on-write patcher, keeps the connector catalog
//! fresh with token-tagged fetches, and loads/saves through a
//! [`DocumentStore`].
//!
//! # Example
//!
//! ```rust
//! use pax_artifact::{ArtifactEntry, EditingContext};
//! use pax_document::{node, Document};
//! use pax_session::{EditingSession, SessionConfig};
//!
//! let document = Document::new(node!({"pipeline": {"stages": [{"stage": {"identifier": "deploy"}}]}}));
//! let mut session =
//!     EditingSession::open("release", document, "deploy", EditingContext::Plain, SessionConfig::default()).unwrap();
//!
//! let commit = session
//!     .set_primary(ArtifactEntry::primary("DockerRegistry", node!({"connectorRef": "account.docker"})))
//!     .unwrap();
//! assert!(commit.changed);
//! assert_eq!(commit.reconciliation.missing.len(), 1);
//! assert!(session.is_modified());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod config;
mod error;
mod session;
mod store;

pub mod logging;

pub use config::{CatalogConfig, ConfigError, ConnectorScopeConfig, SessionConfig};
pub use error::{ErrorKind, SessionError};
pub use session::{Commit, EditingSession, FetchOutcome, FetchTicket};
pub use store::{DocumentStore, FileStore, StoreError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
