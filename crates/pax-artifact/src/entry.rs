//! Artifact entries
//!
//! An [`ArtifactEntry`] is the typed view of one artifact object in a
//! pipeline document: `{type, spec}` for the primary, and the inner object
//! of `{sidecar: {identifier, type, spec}}` for each sidecar.

use crate::error::ArtifactError;
use pax_document::{Node, NodeKind, NodeMap};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

const KEY_IDENTIFIER: &str = "identifier";
const KEY_TYPE: &str = "type";
const KEY_SPEC: &str = "spec";
const KEY_CONNECTOR_REF: &str = "connectorRef";

/// Which slot an artifact occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactRole {
    /// The single primary artifact
    Primary,
    /// One of the ordered sidecars
    Sidecar,
}

impl Display for ArtifactRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => f.write_str("primary"),
            Self::Sidecar => f.write_str("sidecar"),
        }
    }
}

/// One artifact definition
///
/// # Invariants
/// - `spec` is always an object
/// - keys other than `identifier`/`type`/`spec` survive a read/write cycle
/// - a decoded entry encodes its keys in the order they were stored
///
/// Equality ignores the stored key order.
#[derive(Debug, Clone)]
pub struct ArtifactEntry {
    role: ArtifactRole,
    identifier: Option<String>,
    artifact_type: String,
    spec: Node,
    extras: NodeMap,
    key_order: Vec<String>,
}

impl PartialEq for ArtifactEntry {
    fn eq(&self, other: &Self) -> bool {
        self.role == other.role
            && self.identifier == other.identifier
            && self.artifact_type == other.artifact_type
            && self.spec == other.spec
            && self.extras == other.extras
    }
}

impl ArtifactEntry {
    /// Create a primary artifact
    #[must_use]
    pub fn primary(artifact_type: impl Into<String>, spec: Node) -> Self {
        Self::new(ArtifactRole::Primary, None, artifact_type.into(), spec)
    }

    /// Create a sidecar artifact
    #[must_use]
    pub fn sidecar(identifier: impl Into<String>, artifact_type: impl Into<String>, spec: Node) -> Self {
        Self::new(
            ArtifactRole::Sidecar,
            Some(identifier.into()),
            artifact_type.into(),
            spec,
        )
    }

    fn new(role: ArtifactRole, identifier: Option<String>, artifact_type: String, spec: Node) -> Self {
        let spec = if spec.as_object().is_some() { spec } else { Node::object() };
        Self {
            role,
            identifier,
            artifact_type,
            spec,
            extras: NodeMap::new(),
            key_order: Vec::new(),
        }
    }

    /// Decode from a document node
    ///
    /// # Errors
    /// [`ArtifactError::MalformedEntry`] when the node is not an object, has
    /// no string `type`, or carries a non-object `spec`.
    pub fn from_node(role: ArtifactRole, node: &Node) -> Result<Self, ArtifactError> {
        let map = node.as_object().ok_or_else(|| ArtifactError::MalformedEntry {
            role,
            reason: format!("expected object, found {}", node.kind()),
        })?;

        let artifact_type = map
            .get(KEY_TYPE)
            .and_then(Node::as_str)
            .ok_or_else(|| ArtifactError::MalformedEntry {
                role,
                reason: "missing string 'type'".to_string(),
            })?
            .to_string();

        let identifier = match map.get(KEY_IDENTIFIER) {
            None | Some(Node::Null) => None,
            Some(Node::String(s)) => Some(s.clone()),
            Some(other) => {
                return Err(ArtifactError::MalformedEntry {
                    role,
                    reason: format!("'identifier' must be a string, found {}", other.kind()),
                })
            }
        };

        let spec = match map.get(KEY_SPEC) {
            None | Some(Node::Null) => Node::object(),
            Some(spec) if spec.kind() == NodeKind::Object => spec.clone(),
            Some(other) => {
                return Err(ArtifactError::MalformedEntry {
                    role,
                    reason: format!("'spec' must be an object, found {}", other.kind()),
                })
            }
        };

        let extras = map
            .iter()
            .filter(|(k, _)| !matches!(k.as_str(), KEY_IDENTIFIER | KEY_TYPE | KEY_SPEC))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(Self {
            role,
            identifier,
            artifact_type,
            spec,
            extras,
            key_order: map.keys().cloned().collect(),
        })
    }

    /// Encode as a document node
    ///
    /// Keys the entry was decoded with keep their stored positions; keys it
    /// gained since follow in `identifier`, `type`, `spec`, extras order.
    #[must_use]
    pub fn to_node(&self) -> Node {
        let mut fields = NodeMap::with_capacity(3 + self.extras.len());
        if let Some(identifier) = &self.identifier {
            fields.insert(KEY_IDENTIFIER.to_string(), Node::from(identifier.as_str()));
        }
        fields.insert(KEY_TYPE.to_string(), Node::from(self.artifact_type.as_str()));
        fields.insert(KEY_SPEC.to_string(), self.spec.clone());
        fields.extend(self.extras.iter().map(|(k, v)| (k.clone(), v.clone())));

        let mut pairs: Vec<(String, Node)> = Vec::with_capacity(fields.len());
        for key in &self.key_order {
            if let Some(value) = fields.shift_remove(key) {
                pairs.push((key.clone(), value));
            }
        }
        pairs.extend(fields);
        Node::from_pairs(pairs)
    }

    /// Slot this entry occupies
    #[inline]
    #[must_use]
    pub fn role(&self) -> ArtifactRole {
        self.role
    }

    /// Same entry in another slot
    #[inline]
    #[must_use]
    pub fn with_role(mut self, role: ArtifactRole) -> Self {
        self.role = role;
        self
    }

    /// Sidecar identifier
    #[inline]
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    /// Artifact source type (`DockerRegistry`, `Ecr`, ...)
    #[inline]
    #[must_use]
    pub fn artifact_type(&self) -> &str {
        &self.artifact_type
    }

    /// Type-specific settings
    #[inline]
    #[must_use]
    pub fn spec(&self) -> &Node {
        &self.spec
    }

    /// Same entry with `key` set in its spec
    #[must_use]
    pub fn with_spec_field(mut self, key: impl Into<String>, value: Node) -> Self {
        self.spec = self.spec.with_member(key, value);
        self
    }

    /// Same entry with an emptied spec
    #[must_use]
    pub fn with_empty_spec(mut self) -> Self {
        self.spec = Node::object();
        self
    }

    /// Raw `spec.connectorRef` value
    #[inline]
    #[must_use]
    pub fn connector_ref(&self) -> Option<&str> {
        self.spec.get_str(KEY_CONNECTOR_REF)
    }
}
