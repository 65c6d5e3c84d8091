//! Reconciling derived references against the catalog

use crate::catalog::{ConnectorCatalog, ConnectorCatalogEntry};
use crate::lookup::ConnectorListRequest;
use crate::scope::ConnectorReference;
use indexmap::IndexMap;

/// Outcome of checking references against the catalog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// References the catalog already knows, in reference order
    pub resolved: IndexMap<ConnectorReference, ConnectorCatalogEntry>,
    /// References that need a fetch, in reference order
    pub missing: Vec<ConnectorReference>,
}

impl Reconciliation {
    /// Nothing left to fetch
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// Batch lookup body for the missing references, if any
    #[must_use]
    pub fn request(&self) -> Option<ConnectorListRequest> {
        if self.is_complete() {
            return None;
        }
        Some(ConnectorListRequest::for_identifiers(
            self.missing.iter().map(|r| r.identifier.as_str()),
        ))
    }
}

/// Split `references` into catalog hits and misses
///
/// Pure with respect to the catalog: nothing is inserted or evicted.
pub fn reconcile<'a, I>(references: I, catalog: &ConnectorCatalog) -> Reconciliation
where
    I: IntoIterator<Item = &'a ConnectorReference>,
{
    let mut out = Reconciliation::default();
    for reference in references {
        match catalog.get(reference) {
            Some(entry) => {
                out.resolved.insert(reference.clone(), entry);
            }
            None if !out.missing.contains(reference) => out.missing.push(reference.clone()),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ConnectorStatus;
    use crate::references::ReferenceSet;
    use crate::scope::ConnectorScope;
    use pretty_assertions::assert_eq;

    fn refs() -> ReferenceSet {
        [
            ConnectorReference::new(ConnectorScope::Account, "docker1"),
            ConnectorReference::new(ConnectorScope::Project, "proj-conn"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn cold_catalog_reports_everything_missing() {
        let catalog = ConnectorCatalog::new(10);
        let outcome = reconcile(&refs(), &catalog);
        assert!(outcome.resolved.is_empty());
        assert_eq!(outcome.missing, refs().into_iter().collect::<Vec<_>>());
        assert_eq!(
            outcome.request().unwrap().connector_identifiers,
            vec!["docker1".to_string(), "proj-conn".to_string()]
        );
    }

    #[test]
    fn warm_catalog_is_idempotent() {
        let catalog = ConnectorCatalog::new(10);
        for reference in &refs() {
            catalog.insert(ConnectorCatalogEntry::new(reference.clone(), ConnectorStatus::Success));
        }

        let first = reconcile(&refs(), &catalog);
        let second = reconcile(&refs(), &catalog);
        assert!(first.missing.is_empty());
        assert!(second.missing.is_empty());
        assert_eq!(first, second);
        assert_eq!(first.request(), None);
    }

    #[test]
    fn partial_hit() {
        let catalog = ConnectorCatalog::new(10);
        let hit = ConnectorReference::new(ConnectorScope::Account, "docker1");
        catalog.insert(ConnectorCatalogEntry::new(hit.clone(), ConnectorStatus::Failure));

        let outcome = reconcile(&refs(), &catalog);
        assert_eq!(outcome.resolved.get(&hit).unwrap().status, ConnectorStatus::Failure);
        assert_eq!(outcome.missing, vec![ConnectorReference::new(ConnectorScope::Project, "proj-conn")]);
        assert!(!outcome.is_complete());
    }

    #[test]
    fn scope_matters_for_hits() {
        let catalog = ConnectorCatalog::new(10);
        catalog.insert(ConnectorCatalogEntry::new(
            ConnectorReference::new(ConnectorScope::Org, "docker1"),
            ConnectorStatus::Success,
        ));
        let outcome = reconcile(&refs(), &catalog);
        assert_eq!(outcome.missing.len(), 2);
    }
}
