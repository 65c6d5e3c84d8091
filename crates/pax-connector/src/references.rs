//! Connector reference derivation

use crate::scope::ConnectorReference;
use indexmap::IndexSet;
use pax_artifact::{ArtifactEntry, ArtifactList};

/// Ordered, deduplicated connector references
pub type ReferenceSet = IndexSet<ConnectorReference>;

/// Distinct connector references of a primary and its sidecars
///
/// The primary's reference comes first, then sidecars in list order.
/// Duplicates keep their first position.
#[must_use]
pub fn derive_references<'a, I>(primary: Option<&'a ArtifactEntry>, sidecars: I) -> ReferenceSet
where
    I: IntoIterator<Item = &'a ArtifactEntry>,
{
    primary
        .into_iter()
        .chain(sidecars)
        .filter_map(ArtifactEntry::connector_ref)
        .filter_map(ConnectorReference::parse)
        .collect()
}

/// [`derive_references`] over a whole list
#[inline]
#[must_use]
pub fn list_references(list: &ArtifactList) -> ReferenceSet {
    derive_references(list.primary(), list.sidecars())
}
