//! Artifact lists
//!
//! [`ArtifactList`] is the in-memory view of one `artifacts` container: an
//! optional primary plus ordered sidecars. It is derived from the document
//! on every read and written back with [`ArtifactList::write_container`].

use crate::entry::{ArtifactEntry, ArtifactRole};
use crate::error::ArtifactError;
use pax_document::Node;

const KEY_PRIMARY: &str = "primary";
const KEY_SIDECARS: &str = "sidecars";
const KEY_SIDECAR: &str = "sidecar";

/// State of the primary slot
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PrimarySlot {
    /// No `primary` key in the container
    #[default]
    Absent,
    /// `primary: null`
    Cleared,
    /// A primary artifact
    Set(ArtifactEntry),
    /// A stored primary that does not decode, such as one without a `type`
    ///
    /// Written back untouched until an action replaces or clears it.
    Unreadable(Node),
}

impl PrimarySlot {
    /// The entry, if one is set
    #[inline]
    #[must_use]
    pub fn entry(&self) -> Option<&ArtifactEntry> {
        match self {
            Self::Set(entry) => Some(entry),
            Self::Absent | Self::Cleared | Self::Unreadable(_) => None,
        }
    }
}

/// Primary + sidecar artifacts of one container
///
/// Values are immutable: every transition returns a new list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArtifactList {
    primary: PrimarySlot,
    sidecars: Vec<ArtifactEntry>,
}

impl ArtifactList {
    /// Empty list
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from parts
    ///
    /// # Errors
    /// [`ArtifactError::DuplicateIdentifier`] when two sidecars share an identifier.
    pub fn from_parts(primary: PrimarySlot, sidecars: Vec<ArtifactEntry>) -> Result<Self, ArtifactError> {
        let mut list = Self {
            primary,
            sidecars: Vec::with_capacity(sidecars.len()),
        };
        for entry in sidecars {
            list = list.upsert_sidecar(list.sidecars.len(), entry)?;
        }
        Ok(list)
    }

    /// Decode an `artifacts` container
    ///
    /// A missing or `null` container reads as empty.
    ///
    /// A primary that fails to decode reads as [`PrimarySlot::Unreadable`].
    /// Stored sidecars are taken as they are, duplicate identifiers included;
    /// uniqueness is only enforced when a sidecar is inserted.
    ///
    /// # Errors
    /// Malformed container, sidecar wrappers or sidecar entries.
    pub fn from_container(container: Option<&Node>) -> Result<Self, ArtifactError> {
        let Some(container) = container.filter(|node| !node.is_null()) else {
            return Ok(Self::new());
        };
        let map = container
            .as_object()
            .ok_or(ArtifactError::MalformedContainer { found: container.kind() })?;

        let primary = match map.get(KEY_PRIMARY) {
            None => PrimarySlot::Absent,
            Some(Node::Null) => PrimarySlot::Cleared,
            Some(node) => match ArtifactEntry::from_node(ArtifactRole::Primary, node) {
                Ok(entry) => PrimarySlot::Set(entry),
                Err(_) => PrimarySlot::Unreadable(node.clone()),
            },
        };

        let sidecars = match map.get(KEY_SIDECARS) {
            None | Some(Node::Null) => Vec::new(),
            Some(Node::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, wrapper)| {
                    let inner = wrapper.get(KEY_SIDECAR).ok_or_else(|| {
                        ArtifactError::MalformedSidecars(format!("item {i} has no '{KEY_SIDECAR}' key"))
                    })?;
                    ArtifactEntry::from_node(ArtifactRole::Sidecar, inner)
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(other) => {
                return Err(ArtifactError::MalformedSidecars(format!(
                    "expected array, found {}",
                    other.kind()
                )))
            }
        };

        Ok(Self { primary, sidecars })
    }

    /// Encode into an `artifacts` container
    ///
    /// Keys of `existing` other than `primary`/`sidecars` are kept in place.
    /// Entries equal to what `existing` already holds keep their original
    /// nodes, so unchanged artifacts stay identity-equal across commits.
    #[must_use]
    pub fn write_container(&self, existing: Option<&Node>) -> Node {
        let existing = existing.filter(|node| node.as_object().is_some());
        let mut container = existing.cloned().unwrap_or_else(Node::object);

        container = match &self.primary {
            PrimarySlot::Absent => container.without_member(KEY_PRIMARY),
            PrimarySlot::Cleared => container.with_member(KEY_PRIMARY, Node::Null),
            PrimarySlot::Unreadable(node) => container.with_member(KEY_PRIMARY, node.clone()),
            PrimarySlot::Set(entry) => {
                let previous = existing.and_then(|c| c.get(KEY_PRIMARY));
                container.with_member(KEY_PRIMARY, reuse_or_encode(previous, entry, ArtifactRole::Primary))
            }
        };

        let previous_sidecars = existing.and_then(|c| c.get(KEY_SIDECARS));
        if self.sidecars.is_empty() && previous_sidecars.is_none() {
            return container;
        }

        let wrappers = self.sidecars.iter().enumerate().map(|(i, entry)| {
            let previous = previous_sidecars.and_then(|s| s.at(i));
            if let Some(wrapper) = previous {
                let inner = wrapper.get(KEY_SIDECAR);
                if inner.is_some_and(|node| decodes_to(node, entry, ArtifactRole::Sidecar)) {
                    return wrapper.clone();
                }
            }
            Node::from_pairs([(KEY_SIDECAR, entry.to_node())])
        });
        container.with_member(KEY_SIDECARS, Node::from_items(wrappers))
    }

    /// Primary slot
    #[inline]
    #[must_use]
    pub fn primary_slot(&self) -> &PrimarySlot {
        &self.primary
    }

    /// Primary artifact, if set
    #[inline]
    #[must_use]
    pub fn primary(&self) -> Option<&ArtifactEntry> {
        self.primary.entry()
    }

    /// Sidecars in order
    #[inline]
    #[must_use]
    pub fn sidecars(&self) -> &[ArtifactEntry] {
        &self.sidecars
    }

    /// Sidecar at `index`
    #[inline]
    #[must_use]
    pub fn sidecar(&self, index: usize) -> Option<&ArtifactEntry> {
        self.sidecars.get(index)
    }

    /// Index of the sidecar with `identifier`
    #[must_use]
    pub fn sidecar_index(&self, identifier: &str) -> Option<usize> {
        self.sidecars
            .iter()
            .position(|entry| entry.identifier() == Some(identifier))
    }

    /// Identifiers of all sidecars, in order
    #[must_use]
    pub fn sidecar_identifiers(&self) -> Vec<&str> {
        self.sidecars.iter().filter_map(ArtifactEntry::identifier).collect()
    }

    /// `true` when there is neither a primary nor any sidecar
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.primary().is_none() && self.sidecars.is_empty()
    }

    /// Replace the primary unconditionally
    #[must_use]
    pub fn set_primary(&self, entry: ArtifactEntry) -> Self {
        Self {
            primary: PrimarySlot::Set(entry.with_role(ArtifactRole::Primary)),
            sidecars: self.sidecars.clone(),
        }
    }

    /// Replace the primary slot
    #[must_use]
    pub fn with_primary_slot(&self, primary: PrimarySlot) -> Self {
        Self {
            primary,
            sidecars: self.sidecars.clone(),
        }
    }

    /// Replace (`index < len`) or append (`index == len`) a sidecar
    ///
    /// # Errors
    /// [`ArtifactError::DuplicateIdentifier`] when another index already uses
    /// the entry's identifier; [`ArtifactError::IndexOutOfRange`] when
    /// `index > len`. `self` is untouched either way.
    pub fn upsert_sidecar(&self, index: usize, entry: ArtifactEntry) -> Result<Self, ArtifactError> {
        let len = self.sidecars.len();
        if index > len {
            return Err(ArtifactError::IndexOutOfRange { index, len });
        }
        if let Some(identifier) = entry.identifier() {
            if let Some(existing_index) = self
                .sidecars
                .iter()
                .enumerate()
                .find(|(i, other)| *i != index && other.identifier() == Some(identifier))
                .map(|(i, _)| i)
            {
                return Err(ArtifactError::DuplicateIdentifier {
                    identifier: identifier.to_string(),
                    existing_index,
                });
            }
        }

        let entry = entry.with_role(ArtifactRole::Sidecar);
        let mut sidecars = self.sidecars.clone();
        if index == len {
            sidecars.push(entry);
        } else {
            sidecars[index] = entry;
        }
        Ok(Self {
            primary: self.primary.clone(),
            sidecars,
        })
    }

    /// Splice out the sidecar at `index`; later sidecars shift down by one
    ///
    /// # Errors
    /// [`ArtifactError::IndexOutOfRange`] when `index >= len`.
    pub fn remove_sidecar(&self, index: usize) -> Result<Self, ArtifactError> {
        let len = self.sidecars.len();
        if index >= len {
            return Err(ArtifactError::IndexOutOfRange { index, len });
        }
        let mut sidecars = self.sidecars.clone();
        sidecars.remove(index);
        Ok(Self {
            primary: self.primary.clone(),
            sidecars,
        })
    }
}

fn decodes_to(node: &Node, entry: &ArtifactEntry, role: ArtifactRole) -> bool {
    ArtifactEntry::from_node(role, node).is_ok_and(|decoded| &decoded == entry)
}

fn reuse_or_encode(previous: Option<&Node>, entry: &ArtifactEntry, role: ArtifactRole) -> Node {
    match previous {
        Some(node) if decodes_to(node, entry, role) => node.clone(),
        _ => entry.to_node(),
    }
}
