//! Document tree nodes
//!
//! [`Node`] is an ordered JSON-like value whose containers are reference
//! counted. Cloning a node never copies a sub-tree, so two document versions
//! can share every branch a patch did not touch.

use indexmap::IndexMap;
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::{Number, Value as JsonValue};
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Ordered object body
pub type NodeMap = IndexMap<String, Node>;

/// A value in a document tree
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Node {
    /// Null / absent value
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Number
    Number(Number),
    /// String
    String(String),
    /// Shared array
    Array(Arc<Vec<Node>>),
    /// Shared, insertion-ordered object
    Object(Arc<NodeMap>),
}

/// Shape of a node, used in diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// `null`
    Null,
    /// `true` / `false`
    Bool,
    /// Numeric scalar
    Number,
    /// String scalar
    String,
    /// Array container
    Array,
    /// Object container
    Object,
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        };
        f.write_str(name)
    }
}

impl Node {
    /// Empty object
    #[inline]
    #[must_use]
    pub fn object() -> Self {
        Self::Object(Arc::new(NodeMap::new()))
    }

    /// Empty array
    #[inline]
    #[must_use]
    pub fn array() -> Self {
        Self::Array(Arc::new(Vec::new()))
    }

    /// String scalar
    #[inline]
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Object from ordered pairs
    #[must_use]
    pub fn from_pairs<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Node)>,
    {
        Self::Object(Arc::new(
            pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Array from items
    #[must_use]
    pub fn from_items<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Node>,
    {
        Self::Array(Arc::new(items.into_iter().collect()))
    }

    /// Shape of this node
    #[inline]
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Null => NodeKind::Null,
            Self::Bool(_) => NodeKind::Bool,
            Self::Number(_) => NodeKind::Number,
            Self::String(_) => NodeKind::String,
            Self::Array(_) => NodeKind::Array,
            Self::Object(_) => NodeKind::Object,
        }
    }

    /// Check for null
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Object body, if this is an object
    #[inline]
    #[must_use]
    pub fn as_object(&self) -> Option<&NodeMap> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Array items, if this is an array
    #[inline]
    #[must_use]
    pub fn as_array(&self) -> Option<&[Node]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// String value, if this is a string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Member lookup on an object; `None` for anything else
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// String member lookup on an object
    #[inline]
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Node::as_str)
    }

    /// Element lookup on an array; `None` for anything else
    #[inline]
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&Node> {
        self.as_array().and_then(|items| items.get(index))
    }

    /// Copy of this object with `key` set to `value`
    ///
    /// Existing keys keep their position; new keys are appended. A non-object
    /// receiver is replaced by a fresh object.
    #[must_use]
    pub fn with_member(&self, key: impl Into<String>, value: Node) -> Self {
        let mut map = self.as_object().cloned().unwrap_or_default();
        map.insert(key.into(), value);
        Self::Object(Arc::new(map))
    }

    /// Copy of this object without `key`, order of the rest preserved
    #[must_use]
    pub fn without_member(&self, key: &str) -> Self {
        let mut map = self.as_object().cloned().unwrap_or_default();
        map.shift_remove(key);
        Self::Object(Arc::new(map))
    }

    /// Identity comparison
    ///
    /// Containers are identical when they share the same allocation. Scalars
    /// carry no identity and compare by value.
    #[must_use]
    pub fn same_node(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            (Self::Array(a), Self::Array(b)) => Arc::ptr_eq(a, b),
            (Self::Object(_) | Self::Array(_), _) | (_, Self::Object(_) | Self::Array(_)) => false,
            (a, b) => a == b,
        }
    }

    /// Convert into a `serde_json` value
    #[must_use]
    pub fn to_json_value(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::Number(n) => JsonValue::Number(n.clone()),
            Self::String(s) => JsonValue::String(s.clone()),
            Self::Array(items) => JsonValue::Array(items.iter().map(Node::to_json_value).collect()),
            Self::Object(map) => JsonValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json_value()))
                    .collect(),
            ),
        }
    }
}

impl From<JsonValue> for Node {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(b),
            JsonValue::Number(n) => Self::Number(n),
            JsonValue::String(s) => Self::String(s),
            JsonValue::Array(items) => Self::from_items(items.into_iter().map(Node::from)),
            JsonValue::Object(map) => Self::from_pairs(map.into_iter().map(|(k, v)| (k, Node::from(v)))),
        }
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => n.serialize(serializer),
            Self::String(s) => serializer.serialize_str(s),
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map.iter() {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // serde_json is built with preserve_order, so key order survives.
        JsonValue::deserialize(deserializer).map(Node::from)
    }
}

/// Build a [`Node`] with `serde_json::json!` syntax
#[macro_export]
macro_rules! node {
    ($($json:tt)+) => {
        $crate::Node::from($crate::__private::json!($($json)+))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_preserves_key_order() {
        let node = Node::from(json!({"z": 1, "a": 2, "m": 3}));
        let keys: Vec<_> = node.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn json_round_trip() {
        let value = json!({"a": [1, "two", null, {"b": true}]});
        assert_eq!(Node::from(value.clone()).to_json_value(), value);
    }

    #[test]
    fn clone_shares_containers() {
        let node = Node::from(json!({"a": {"b": 1}}));
        let copy = node.clone();
        assert!(node.same_node(&copy));
        assert!(node.get("a").unwrap().same_node(copy.get("a").unwrap()));
    }

    #[test]
    fn equal_but_distinct_containers_are_not_same() {
        let a = Node::from(json!({"k": 1}));
        let b = Node::from(json!({"k": 1}));
        assert_eq!(a, b);
        assert!(!a.same_node(&b));
    }

    #[test]
    fn scalars_compare_by_value() {
        assert!(Node::from("x").same_node(&Node::from("x")));
        assert!(!Node::from("x").same_node(&Node::from("y")));
        assert!(!Node::Null.same_node(&Node::object()));
    }

    #[test]
    fn with_member_keeps_position() {
        let node = Node::from(json!({"a": 1, "b": 2, "c": 3}));
        let updated = node.with_member("b", Node::from("x"));
        let keys: Vec<_> = updated.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(updated.get_str("b"), Some("x"));
        // Original untouched
        assert_eq!(node.get("b"), Some(&Node::from(json!(2))));
    }

    #[test]
    fn without_member_keeps_order_of_rest() {
        let node = Node::from(json!({"a": 1, "b": 2, "c": 3}));
        let updated = node.without_member("a");
        let keys: Vec<_> = updated.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["b", "c"]);
    }

    #[test]
    fn node_macro_builds_objects() {
        let node = node!({"type": "DockerRegistry"});
        assert_eq!(node.get_str("type"), Some("DockerRegistry"));
        assert_eq!(node.kind(), NodeKind::Object);
    }

    #[test]
    fn accessors_on_wrong_kind_return_none() {
        let node = Node::from("scalar");
        assert!(node.get("a").is_none());
        assert!(node.at(0).is_none());
        assert!(node.as_object().is_none());
    }
}
