//! PAX Artifact Editing
//!
//! Primary/sidecar artifact lists for pipeline stages, the reducer that
//! edits them, and the resolver that finds where each editing context
//! keeps its artifacts.
//!
//! # Core Concepts
//!
//! - [`ArtifactEntry`]: one `{type, spec}` artifact, primary or sidecar
//! - [`ArtifactList`]: immutable primary slot plus ordered sidecars
//! - [`ArtifactReducer`]: applies [`ArtifactAction`]s, honouring a [`ClearPrimaryPolicy`]
//! - [`EditingContext`]: plain, override set, stage propagation or parent override set
//! - [`resolve`]: context + stage to the `artifacts` container path
//!
//! # Example
//!
//! ```rust
//! use pax_artifact::{resolve, ArtifactAction, ArtifactEntry, ArtifactList, ArtifactReducer, EditingContext};
//! use pax_document::{node, Node};
//!
//! let root = node!({"pipeline": {"stages": [{"stage": {"identifier": "deploy"}}]}});
//! let path = resolve(&EditingContext::Plain, &root, "deploy").unwrap();
//! assert!(path.to_string().ends_with("serviceDefinition.spec.artifacts"));
//!
//! let list = ArtifactReducer::default()
//!     .reduce(&ArtifactList::new(), ArtifactAction::SetPrimary(ArtifactEntry::primary("Ecr", Node::object())))
//!     .unwrap();
//! assert_eq!(list.primary().unwrap().artifact_type(), "Ecr");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod entry;
mod error;
mod list;
mod reducer;

pub mod resolve;

pub use entry::{ArtifactEntry, ArtifactRole};
pub use error::{ArtifactError, ResolveError};
pub use list::{ArtifactList, PrimarySlot};
pub use reducer::{ArtifactAction, ArtifactReducer, ClearPrimaryPolicy};
pub use resolve::{find_stage, flattened_stages, resolve, EditingContext, StageLocation};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
