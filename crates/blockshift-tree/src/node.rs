//! Raw block tree nodes
//!
//! A stored block tree is plain JSON. Its shape is not self-describing: the
//! same JSON array can be a stream, a list or an opaque leaf value depending
//! on the block definition at that position. [`BlockValue`] is the union a
//! caller gets once it has decided the [`ContainerKind`] from the schema.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name of the single child of every list block
pub const LIST_ITEM_NAME: &str = "item";

/// Raw tree as read from storage
pub type RawTree = Value;

/// Container shape of a block, as declared by its definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    /// Ordered sequence of typed children
    Stream,
    /// Fixed mapping of named children
    Struct,
    /// Homogeneous list of items
    List,
    /// Opaque value
    Leaf,
}

impl ContainerKind {
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stream => "stream",
            Self::Struct => "struct",
            Self::List => "list",
            Self::Leaf => "leaf",
        }
    }
}

impl std::fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One typed element of a stream (or a typed list item)
///
/// Keys other than `type`, `id` and `value` are carried in `extra` so that
/// rewriting a node never drops data the engine does not know about. Only a
/// string `id` is lifted into [`RawNode::id`]; any other `id` value (number,
/// `null`) stays in `extra` and is written back exactly as read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub value: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawNode {
    /// Create node with an explicit id
    #[inline]
    #[must_use]
    pub fn new(block_type: impl Into<String>, id: impl Into<String>, value: Value) -> Self {
        Self {
            block_type: block_type.into(),
            id: Some(id.into()),
            value,
            extra: Map::new(),
        }
    }

    /// Create a brand new block with a freshly generated id
    #[inline]
    #[must_use]
    pub fn with_generated_id(block_type: impl Into<String>, value: Value) -> Self {
        Self::new(block_type, uuid::Uuid::new_v4().to_string(), value)
    }

    /// Take a JSON object apart into a node
    ///
    /// # Errors
    /// Returns error if the value is not an object with a string `type`
    pub fn from_value(value: Value) -> Result<Self, TreeError> {
        let mut map = match value {
            Value::Object(map) => map,
            other => {
                return Err(TreeError::NotANode {
                    found: value_kind(&other),
                })
            }
        };

        let block_type = match map.remove("type") {
            Some(Value::String(t)) => t,
            _ => return Err(TreeError::MissingType),
        };
        Ok(Self::from_parts(block_type, map))
    }

    /// Build from an object whose `type` key was already taken out
    fn from_parts(block_type: String, mut map: Map<String, Value>) -> Self {
        let id = if map.get("id").is_some_and(Value::is_string) {
            map.remove("id").and_then(|id| match id {
                Value::String(id) => Some(id),
                _ => None,
            })
        } else {
            None
        };
        let value = map.remove("value").unwrap_or(Value::Null);

        Self {
            block_type,
            id,
            value,
            extra: map,
        }
    }

    /// Reassemble the JSON object
    #[must_use]
    pub fn into_value(self) -> Value {
        let mut map = Map::with_capacity(3 + self.extra.len());
        map.insert("type".to_string(), Value::String(self.block_type));
        map.insert("value".to_string(), self.value);
        if let Some(id) = self.id {
            map.insert("id".to_string(), Value::String(id));
        }
        map.extend(self.extra);
        Value::Object(map)
    }

    /// Block name recorded on a raw stream child, without taking it apart
    ///
    /// # Errors
    /// Returns error if the child is not an object with a string `type`
    pub fn peek_type(value: &Value) -> Result<&str, TreeError> {
        match value {
            Value::Object(map) => map
                .get("type")
                .and_then(Value::as_str)
                .ok_or(TreeError::MissingType),
            other => Err(TreeError::NotANode {
                found: value_kind(other),
            }),
        }
    }
}

/// One element of a list block
///
/// Lists are stored either as typed items (`{"type": "item", "id", "value"}`)
/// or, in older data, as bare values. Both encodings are kept as they are.
#[derive(Debug, Clone, PartialEq)]
pub enum ListItem {
    Typed(RawNode),
    Bare(Value),
}

impl ListItem {
    /// Classify a raw list element
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(mut map)
                if map.get("type").and_then(Value::as_str) == Some(LIST_ITEM_NAME)
                    && map.contains_key("value") =>
            {
                map.remove("type");
                Self::Typed(RawNode::from_parts(LIST_ITEM_NAME.to_string(), map))
            }
            other => Self::Bare(other),
        }
    }

    /// New typed item with a generated id
    #[inline]
    #[must_use]
    pub fn new_typed(value: Value) -> Self {
        Self::Typed(RawNode::with_generated_id(LIST_ITEM_NAME, value))
    }

    /// The item's value, whatever the encoding
    #[inline]
    #[must_use]
    pub fn value(&self) -> &Value {
        match self {
            Self::Typed(node) => &node.value,
            Self::Bare(value) => value,
        }
    }

    /// Replace the value, keeping the encoding (and id) of the item
    #[must_use]
    pub fn map_value<F>(self, f: F) -> Self
    where
        F: FnOnce(Value) -> Value,
    {
        match self {
            Self::Typed(mut node) => {
                node.value = f(node.value);
                Self::Typed(node)
            }
            Self::Bare(value) => Self::Bare(f(value)),
        }
    }

    /// Fallible variant of [`ListItem::map_value`]
    ///
    /// # Errors
    /// Propagates the error of `f`
    pub fn try_map_value<F, E>(self, f: F) -> Result<Self, E>
    where
        F: FnOnce(Value) -> Result<Value, E>,
    {
        match self {
            Self::Typed(mut node) => {
                node.value = f(node.value)?;
                Ok(Self::Typed(node))
            }
            Self::Bare(value) => f(value).map(Self::Bare),
        }
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Typed(node) => node.into_value(),
            Self::Bare(value) => value,
        }
    }
}

/// A raw value read with the shape its block definition declares
///
/// Stream children stay raw JSON: a walker only takes apart the children it
/// actually changes and moves every other child across untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockValue {
    Stream(Vec<Value>),
    Struct(Map<String, Value>),
    List(Vec<ListItem>),
    Leaf(Value),
}

impl BlockValue {
    /// Read `value` as a container of the given kind
    ///
    /// A `null` stream or list is read as empty, matching how blank fields
    /// are stored.
    ///
    /// # Errors
    /// Returns error if the JSON shape does not fit the kind
    pub fn read(value: Value, kind: ContainerKind) -> Result<Self, TreeError> {
        match (kind, value) {
            (ContainerKind::Stream, Value::Array(children)) => Ok(Self::Stream(children)),
            (ContainerKind::Stream, Value::Null) => Ok(Self::Stream(Vec::new())),
            (ContainerKind::Struct, Value::Object(map)) => Ok(Self::Struct(map)),
            (ContainerKind::List, Value::Array(items)) => Ok(Self::List(
                items.into_iter().map(ListItem::from_value).collect(),
            )),
            (ContainerKind::List, Value::Null) => Ok(Self::List(Vec::new())),
            (ContainerKind::Leaf, value) => Ok(Self::Leaf(value)),
            (expected, found) => Err(TreeError::ShapeMismatch {
                expected,
                found: value_kind(&found),
            }),
        }
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> ContainerKind {
        match self {
            Self::Stream(_) => ContainerKind::Stream,
            Self::Struct(_) => ContainerKind::Struct,
            Self::List(_) => ContainerKind::List,
            Self::Leaf(_) => ContainerKind::Leaf,
        }
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Stream(children) => Value::Array(children),
            Self::Struct(map) => Value::Object(map),
            Self::List(items) => {
                Value::Array(items.into_iter().map(ListItem::into_value).collect())
            }
            Self::Leaf(value) => value,
        }
    }
}

/// Short name of a JSON value's type, for error messages
#[must_use]
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Errors raised when raw data does not have the shape it should
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// Container data of the wrong JSON type
    #[error("expected {expected} data, found {found}")]
    ShapeMismatch {
        expected: ContainerKind,
        found: &'static str,
    },

    /// Stream child that is not an object
    #[error("stream child must be an object, found {found}")]
    NotANode { found: &'static str },

    /// Stream child without a block name
    #[error("stream child has no \"type\"")]
    MissingType,
}
