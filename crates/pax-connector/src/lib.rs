//! PAX Connector Cross-References
//!
//! Derives the scoped connectors an artifact list depends on and reconciles
//! them against a session catalog fed by the connector listing service.
//!
//! # Core Concepts
//!
//! - [`ConnectorReference`]: `(scope, identifier)` parsed from `spec.connectorRef`
//! - [`derive_references`]: ordered, deduplicated references of a list
//! - [`ConnectorCatalog`]: moka-backed session cache of connector status
//! - [`reconcile`]: split references into resolved and missing
//! - [`ConnectorLookup`]: async contract of the listing service
//! - [`FetchTracker`]: monotonic tokens that let stale responses be dropped

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod catalog;
mod fetch;
mod lookup;
mod reconcile;
mod references;
mod scope;

pub use catalog::{ConnectorCatalog, ConnectorCatalogEntry, ConnectorStatus};
pub use fetch::{FetchToken, FetchTracker};
pub use lookup::{
    ConnectorInfo, ConnectorListRequest, ConnectorLookup, ConnectorPage, ConnectorQuery, ConnectorStatusBody,
    ConnectorSummary, LookupError,
};
pub use reconcile::{reconcile, Reconciliation};
pub use references::{derive_references, list_references, ReferenceSet};
pub use scope::{ConnectorReference, ConnectorScope};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
