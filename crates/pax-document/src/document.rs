//! Root documents
//!
//! [`Document`] is an immutable handle on a pipeline configuration tree.
//! Every edit produces a new `Document`; the previous one stays valid and
//! shares all untouched branches with its successor.

use crate::hash::ContentHash;
use crate::node::Node;
use crate::patch::{self, PatchError};
use crate::path::DocPath;

/// Errors converting between documents and their wire formats
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),
}

/// Immutable pipeline document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    root: Node,
}

impl Document {
    /// Wrap a root node
    #[inline]
    #[must_use]
    pub fn new(root: Node) -> Self {
        Self { root }
    }

    /// Root node
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Unwrap into the root node
    #[inline]
    #[must_use]
    pub fn into_root(self) -> Node {
        self.root
    }

    /// Node at `path`, `None` when missing
    ///
    /// # Errors
    /// [`PatchError::InvalidPath`] when traversal hits a scalar.
    #[inline]
    pub fn get(&self, path: &DocPath) -> Result<Option<&Node>, PatchError> {
        patch::lookup(&self.root, path)
    }

    /// New document with the node at `path` replaced by `updater`'s result
    ///
    /// # Errors
    /// See [`patch::patch`]. On error `self` is unchanged.
    #[inline]
    pub fn patch<F>(&self, path: &DocPath, updater: F) -> Result<Self, PatchError>
    where
        F: FnOnce(Option<&Node>) -> Node,
    {
        patch::patch(&self.root, path, updater).map(Self::new)
    }

    /// Fallible variant of [`Document::patch`]
    ///
    /// # Errors
    /// Traversal errors or the updater's own error.
    #[inline]
    pub fn try_patch<E, F>(&self, path: &DocPath, updater: F) -> Result<Self, E>
    where
        E: From<PatchError>,
        F: FnOnce(Option<&Node>) -> Result<Node, E>,
    {
        patch::try_patch(&self.root, path, updater).map(Self::new)
    }

    /// Set the node at `path`
    ///
    /// # Errors
    /// See [`patch::patch`].
    #[inline]
    pub fn set(&self, path: &DocPath, value: Node) -> Result<Self, PatchError> {
        self.patch(path, |_| value)
    }

    /// Identity comparison with another version
    ///
    /// `true` means no patch happened between the two handles.
    #[inline]
    #[must_use]
    pub fn same_version(&self, other: &Self) -> bool {
        self.root.same_node(&other.root)
    }

    /// Content fingerprint
    #[inline]
    #[must_use]
    pub fn content_hash(&self) -> ContentHash {
        ContentHash::of_node(&self.root)
    }

    /// Parse from JSON string
    ///
    /// # Errors
    /// Returns error if JSON is invalid
    pub fn from_json(json: &str) -> Result<Self, CodecError> {
        let root: Node = serde_json::from_str(json)?;
        Ok(Self::new(root))
    }

    /// Parse from YAML string
    ///
    /// # Errors
    /// Returns error if YAML is invalid
    pub fn from_yaml(yaml: &str) -> Result<Self, CodecError> {
        let value: serde_json::Value = serde_yaml::from_str(yaml)?;
        Ok(Self::new(Node::from(value)))
    }

    /// Serialize to pretty JSON
    ///
    /// # Errors
    /// Returns error if serialization fails (rare for JSON)
    pub fn to_json(&self) -> Result<String, CodecError> {
        Ok(serde_json::to_string_pretty(&self.root)?)
    }

    /// Serialize to YAML
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_yaml(&self) -> Result<String, CodecError> {
        Ok(serde_yaml::to_string(&self.root)?)
    }
}

impl From<Node> for Document {
    fn from(root: Node) -> Self {
        Self::new(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node;

    const YAML: &str = "\
pipeline:
  identifier: release
  stages:
    - stage:
        identifier: deploy
        name: Deploy
        spec:
          serviceConfig:
            serviceDefinition:
              type: Kubernetes
              spec:
                artifacts:
                  primary:
                    type: DockerRegistry
                    spec:
                      connectorRef: account.docker
                      imagePath: library/nginx
";

    #[test]
    fn yaml_round_trip_preserves_order() {
        let doc = Document::from_yaml(YAML).unwrap();
        let out = doc.to_yaml().unwrap();
        let again = Document::from_yaml(&out).unwrap();
        assert_eq!(doc, again);

        let stage = doc
            .get(&"pipeline.stages[0].stage".parse().unwrap())
            .unwrap()
            .unwrap();
        let keys: Vec<_> = stage.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["identifier", "name", "spec"]);
    }

    #[test]
    fn json_parse_and_print() {
        let doc = Document::from_json(r#"{"b": 1, "a": {"c": [true]}}"#).unwrap();
        let json = doc.to_json().unwrap();
        assert!(json.find("\"b\"").unwrap() < json.find("\"a\"").unwrap());
    }

    #[test]
    fn invalid_yaml_is_codec_error() {
        let result = Document::from_yaml("pipeline: [unclosed");
        assert!(matches!(result, Err(CodecError::InvalidYaml(_))));
    }

    #[test]
    fn patch_produces_new_version() {
        let doc = Document::from_yaml(YAML).unwrap();
        let path: DocPath = "pipeline.identifier".parse().unwrap();
        let next = doc.set(&path, Node::from("hotfix")).unwrap();

        assert!(!doc.same_version(&next));
        assert!(doc.same_version(&doc.clone()));
        assert_ne!(doc.content_hash(), next.content_hash());
        assert_eq!(doc.get(&path).unwrap(), Some(&Node::from("release")));
    }

    #[test]
    fn content_hash_ignores_identity() {
        let a = Document::new(node!({"k": [1]}));
        let b = Document::new(node!({"k": [1]}));
        assert!(!a.same_version(&b));
        assert_eq!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn failed_patch_keeps_document() {
        let doc = Document::from_yaml(YAML).unwrap();
        let err = doc
            .set(&"pipeline.identifier.nested".parse().unwrap(), Node::Null)
            .unwrap_err();
        assert!(matches!(err, PatchError::InvalidPath { .. }));
        assert_eq!(doc, Document::from_yaml(YAML).unwrap());
    }
}
