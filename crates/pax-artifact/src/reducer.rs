//! Artifact list reducer
//!
//! Pure state transitions over [`ArtifactList`] driven by [`ArtifactAction`].
//! The reducer never touches a document; committing the result is the
//! caller's job.

use crate::entry::ArtifactEntry;
use crate::error::ArtifactError;
use crate::list::{ArtifactList, PrimarySlot};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// What clearing the primary leaves behind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearPrimaryPolicy {
    /// Keep the `primary` key with a null value
    #[default]
    Null,
    /// Keep the primary's `type` and empty its `spec`
    EmptySpec,
    /// Delete the `primary` key
    Remove,
}

/// A user-driven edit of an artifact list
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactAction {
    /// Replace the primary
    SetPrimary(ArtifactEntry),
    /// Clear the primary according to the reducer's policy
    ClearPrimary,
    /// Replace or append a sidecar
    UpsertSidecar { index: usize, entry: ArtifactEntry },
    /// Remove a sidecar
    RemoveSidecar { index: usize },
}

impl ArtifactAction {
    /// Short action name for logs
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetPrimary(_) => "set_primary",
            Self::ClearPrimary => "clear_primary",
            Self::UpsertSidecar { .. } => "upsert_sidecar",
            Self::RemoveSidecar { .. } => "remove_sidecar",
        }
    }
}

impl Display for ArtifactAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetPrimary(entry) => write!(f, "set_primary({})", entry.artifact_type()),
            Self::ClearPrimary => f.write_str("clear_primary"),
            Self::UpsertSidecar { index, entry } => write!(
                f,
                "upsert_sidecar[{index}]({})",
                entry.identifier().unwrap_or("<unnamed>")
            ),
            Self::RemoveSidecar { index } => write!(f, "remove_sidecar[{index}]"),
        }
    }
}

/// Reducer over artifact lists
#[derive(Debug, Clone, Copy, Default)]
pub struct ArtifactReducer {
    clear_policy: ClearPrimaryPolicy,
}

impl ArtifactReducer {
    /// Create reducer with a clear-primary policy
    #[inline]
    #[must_use]
    pub fn new(clear_policy: ClearPrimaryPolicy) -> Self {
        Self { clear_policy }
    }

    /// Configured clear-primary policy
    #[inline]
    #[must_use]
    pub fn clear_policy(&self) -> ClearPrimaryPolicy {
        self.clear_policy
    }

    /// Apply one action
    ///
    /// # Errors
    /// Sidecar identifier collisions and out-of-range indices. On error the
    /// input list is unchanged.
    pub fn reduce(&self, list: &ArtifactList, action: ArtifactAction) -> Result<ArtifactList, ArtifactError> {
        match action {
            ArtifactAction::SetPrimary(entry) => Ok(list.set_primary(entry)),
            ArtifactAction::ClearPrimary => Ok(self.clear_primary(list)),
            ArtifactAction::UpsertSidecar { index, entry } => list.upsert_sidecar(index, entry),
            ArtifactAction::RemoveSidecar { index } => list.remove_sidecar(index),
        }
    }

    fn clear_primary(&self, list: &ArtifactList) -> ArtifactList {
        let slot = match (self.clear_policy, list.primary_slot()) {
            (ClearPrimaryPolicy::Null, _) => PrimarySlot::Cleared,
            (ClearPrimaryPolicy::Remove, _) => PrimarySlot::Absent,
            (ClearPrimaryPolicy::EmptySpec, PrimarySlot::Set(entry)) => {
                PrimarySlot::Set(entry.clone().with_empty_spec())
            }
            // No type to keep
            (ClearPrimaryPolicy::EmptySpec, PrimarySlot::Unreadable(_)) => PrimarySlot::Cleared,
            // Nothing to empty; keep whatever the slot already says.
            (ClearPrimaryPolicy::EmptySpec, other) => other.clone(),
        };
        list.with_primary_slot(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pax_document::{node, Node};

    fn docker() -> ArtifactEntry {
        ArtifactEntry::primary("DockerRegistry", node!({"connectorRef": "account.docker", "tag": "1.0"}))
    }

    fn with_primary() -> ArtifactList {
        ArtifactList::new().set_primary(docker())
    }

    #[test]
    fn set_primary_replaces() {
        let reducer = ArtifactReducer::default();
        let list = reducer
            .reduce(&with_primary(), ArtifactAction::SetPrimary(ArtifactEntry::primary("Gcr", Node::object())))
            .unwrap();
        assert_eq!(list.primary().unwrap().artifact_type(), "Gcr");
    }

    #[test]
    fn clear_primary_null_policy() {
        let reducer = ArtifactReducer::new(ClearPrimaryPolicy::Null);
        let list = reducer.reduce(&with_primary(), ArtifactAction::ClearPrimary).unwrap();
        assert_eq!(list.primary_slot(), &PrimarySlot::Cleared);
        assert_eq!(list.write_container(None), node!({"primary": null}));
    }

    #[test]
    fn clear_primary_empty_spec_policy() {
        let reducer = ArtifactReducer::new(ClearPrimaryPolicy::EmptySpec);
        let list = reducer.reduce(&with_primary(), ArtifactAction::ClearPrimary).unwrap();
        assert_eq!(
            list.write_container(None),
            node!({"primary": {"type": "DockerRegistry", "spec": {}}})
        );
    }

    #[test]
    fn clear_primary_remove_policy() {
        let reducer = ArtifactReducer::new(ClearPrimaryPolicy::Remove);
        let existing = with_primary().write_container(None);
        let list = reducer.reduce(&with_primary(), ArtifactAction::ClearPrimary).unwrap();
        assert_eq!(list.write_container(Some(&existing)), Node::object());
    }

    #[test]
    fn clear_empty_spec_without_primary_is_noop() {
        let reducer = ArtifactReducer::new(ClearPrimaryPolicy::EmptySpec);
        let list = reducer.reduce(&ArtifactList::new(), ArtifactAction::ClearPrimary).unwrap();
        assert_eq!(list, ArtifactList::new());
    }

    #[test]
    fn clear_unreadable_primary() {
        let stored = node!({"primary": {"spec": {"connectorRef": "x"}}});
        let list = ArtifactList::from_container(Some(&stored)).unwrap();

        let emptied = ArtifactReducer::new(ClearPrimaryPolicy::EmptySpec)
            .reduce(&list, ArtifactAction::ClearPrimary)
            .unwrap();
        assert_eq!(emptied.primary_slot(), &PrimarySlot::Cleared);

        let removed = ArtifactReducer::new(ClearPrimaryPolicy::Remove)
            .reduce(&list, ArtifactAction::ClearPrimary)
            .unwrap();
        assert_eq!(removed.write_container(Some(&stored)), Node::object());
    }

    #[test]
    fn reduce_forwards_sidecar_errors() {
        let reducer = ArtifactReducer::default();
        let err = reducer
            .reduce(&ArtifactList::new(), ArtifactAction::RemoveSidecar { index: 0 })
            .unwrap_err();
        assert!(matches!(err, ArtifactError::IndexOutOfRange { .. }));
    }

    #[test]
    fn action_display() {
        let action = ArtifactAction::UpsertSidecar {
            index: 2,
            entry: ArtifactEntry::sidecar("s1", "Ecr", Node::object()),
        };
        assert_eq!(action.to_string(), "upsert_sidecar[2](s1)");
        assert_eq!(action.name(), "upsert_sidecar");
    }
}
