//! Structural edit operations
//!
//! Provides [`Operation`], the closed set of edits a migration can apply at
//! the container a block path points to.
//!
//! NOT text patches: each variant knows which container kind it acts on and
//! rewrites only the children it names. Ids and unrelated structure are
//! carried over unchanged.

use crate::error::OperationError;
use blockshift_tree::{BlockValue, ContainerKind, ListItem, RawNode, LIST_ITEM_NAME};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Edit applied at the end of a block path
///
/// Serialized with an `op` tag so that migration plans can be written as
/// configuration:
///
/// ```toml
/// op = "rename_stream_children"
/// old_name = "char1"
/// new_name = "renamed1"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Stream children of type `old_name` become `new_name`
    RenameStreamChildren { old_name: String, new_name: String },

    /// Struct field `old_name` becomes `new_name`, in place
    RenameStructChildren { old_name: String, new_name: String },

    /// Drop stream children of type `name`
    RemoveStreamChildren { name: String },

    /// Drop struct field `name`
    RemoveStructChildren { name: String },

    /// Replace the targeted value wholesale
    AlterBlockValue { new_value: Value },

    /// Gather the values of all `block_name` children into one new list
    /// block appended to the stream
    StreamChildrenToList {
        block_name: String,
        list_block_name: String,
    },

    /// Move all children whose type is in `block_names` into one new nested
    /// stream block appended to the stream
    StreamChildrenToStream {
        block_names: Vec<String>,
        stream_block_name: String,
    },

    /// Wrap each `block_name` child in a `struct_block_name` struct block
    StreamChildrenToStruct {
        block_name: String,
        struct_block_name: String,
    },

    /// Wrap each list item value `v` as `{block_name: v}`
    ListChildrenToStruct { block_name: String },
}

impl Operation {
    #[must_use]
    pub fn rename_stream_children(
        old_name: impl Into<String>,
        new_name: impl Into<String>,
    ) -> Self {
        Self::RenameStreamChildren {
            old_name: old_name.into(),
            new_name: new_name.into(),
        }
    }

    #[must_use]
    pub fn rename_struct_children(
        old_name: impl Into<String>,
        new_name: impl Into<String>,
    ) -> Self {
        Self::RenameStructChildren {
            old_name: old_name.into(),
            new_name: new_name.into(),
        }
    }

    #[must_use]
    pub fn remove_stream_children(name: impl Into<String>) -> Self {
        Self::RemoveStreamChildren { name: name.into() }
    }

    #[must_use]
    pub fn remove_struct_children(name: impl Into<String>) -> Self {
        Self::RemoveStructChildren { name: name.into() }
    }

    #[must_use]
    pub fn alter_block_value(new_value: Value) -> Self {
        Self::AlterBlockValue { new_value }
    }

    #[must_use]
    pub fn stream_children_to_list(
        block_name: impl Into<String>,
        list_block_name: impl Into<String>,
    ) -> Self {
        Self::StreamChildrenToList {
            block_name: block_name.into(),
            list_block_name: list_block_name.into(),
        }
    }

    #[must_use]
    pub fn stream_children_to_stream<I, S>(
        block_names: I,
        stream_block_name: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::StreamChildrenToStream {
            block_names: block_names.into_iter().map(Into::into).collect(),
            stream_block_name: stream_block_name.into(),
        }
    }

    #[must_use]
    pub fn stream_children_to_struct(
        block_name: impl Into<String>,
        struct_block_name: impl Into<String>,
    ) -> Self {
        Self::StreamChildrenToStruct {
            block_name: block_name.into(),
            struct_block_name: struct_block_name.into(),
        }
    }

    #[must_use]
    pub fn list_children_to_struct(block_name: impl Into<String>) -> Self {
        Self::ListChildrenToStruct {
            block_name: block_name.into(),
        }
    }

    /// Name used in logs and errors
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::RenameStreamChildren { .. } => "RenameStreamChildrenOperation",
            Self::RenameStructChildren { .. } => "RenameStructChildrenOperation",
            Self::RemoveStreamChildren { .. } => "RemoveStreamChildrenOperation",
            Self::RemoveStructChildren { .. } => "RemoveStructChildrenOperation",
            Self::AlterBlockValue { .. } => "AlterBlockValueOperation",
            Self::StreamChildrenToList { .. } => "StreamChildrenToListBlockOperation",
            Self::StreamChildrenToStream { .. } => "StreamChildrenToStreamBlockOperation",
            Self::StreamChildrenToStruct { .. } => "StreamChildrenToStructBlockOperation",
            Self::ListChildrenToStruct { .. } => "ListChildrenToStructBlockOperation",
        }
    }

    /// Container kind the operation rewrites (`None` = any)
    #[must_use]
    pub fn target_kind(&self) -> Option<ContainerKind> {
        match self {
            Self::RenameStreamChildren { .. }
            | Self::RemoveStreamChildren { .. }
            | Self::StreamChildrenToList { .. }
            | Self::StreamChildrenToStream { .. }
            | Self::StreamChildrenToStruct { .. } => Some(ContainerKind::Stream),
            Self::RenameStructChildren { .. } | Self::RemoveStructChildren { .. } => {
                Some(ContainerKind::Struct)
            }
            Self::ListChildrenToStruct { .. } => Some(ContainerKind::List),
            Self::AlterBlockValue { .. } => None,
        }
    }

    /// Whether the operation rewrites a direct child called `node_type` of
    /// its target container
    #[must_use]
    pub fn applies_to(&self, node_type: &str) -> bool {
        match self {
            Self::RenameStreamChildren { old_name, .. }
            | Self::RenameStructChildren { old_name, .. } => old_name == node_type,
            Self::RemoveStreamChildren { name } | Self::RemoveStructChildren { name } => {
                name == node_type
            }
            Self::StreamChildrenToList { block_name, .. }
            | Self::StreamChildrenToStruct { block_name, .. } => block_name == node_type,
            Self::StreamChildrenToStream { block_names, .. } => {
                block_names.iter().any(|n| n == node_type)
            }
            Self::ListChildrenToStruct { .. } => node_type == LIST_ITEM_NAME,
            Self::AlterBlockValue { .. } => false,
        }
    }

    /// Apply to the value at the target position
    ///
    /// Pure: the returned value is a new container built from `value`'s
    /// parts.
    ///
    /// # Errors
    /// Returns error if `value` is not of the operation's target kind or a
    /// child is malformed
    pub fn apply(&self, value: BlockValue) -> Result<BlockValue, OperationError> {
        if let Some(expected) = self.target_kind() {
            if value.kind() != expected {
                return Err(OperationError::WrongTarget {
                    operation: self.name(),
                    expected,
                    found: value.kind(),
                });
            }
        }

        let applied = match (self, value) {
            (Self::RenameStreamChildren { new_name, .. }, BlockValue::Stream(children)) => {
                BlockValue::Stream(self.map_stream_children(children, |mut node| {
                    node.block_type.clone_from(new_name);
                    node
                })?)
            }
            (
                Self::StreamChildrenToStruct {
                    block_name,
                    struct_block_name,
                },
                BlockValue::Stream(children),
            ) => {
                BlockValue::Stream(self.map_stream_children(children, |mut node| {
                    let mut fields = Map::new();
                    fields.insert(block_name.clone(), std::mem::take(&mut node.value));
                    node.block_type.clone_from(struct_block_name);
                    node.value = Value::Object(fields);
                    node
                })?)
            }
            (Self::RemoveStreamChildren { .. }, BlockValue::Stream(children)) => {
                let (_, kept) = self.partition_stream(children)?;
                BlockValue::Stream(kept)
            }
            (Self::StreamChildrenToList { list_block_name, .. }, BlockValue::Stream(children)) => {
                let (taken, mut kept) = self.partition_stream(children)?;
                if !taken.is_empty() {
                    let items = taken
                        .into_iter()
                        .map(|child| {
                            RawNode::from_value(child)
                                .map(|node| ListItem::new_typed(node.value).into_value())
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    kept.push(
                        RawNode::with_generated_id(list_block_name, Value::Array(items))
                            .into_value(),
                    );
                }
                BlockValue::Stream(kept)
            }
            (
                Self::StreamChildrenToStream { stream_block_name, .. },
                BlockValue::Stream(children),
            ) => {
                let (taken, mut kept) = self.partition_stream(children)?;
                if !taken.is_empty() {
                    kept.push(
                        RawNode::with_generated_id(stream_block_name, Value::Array(taken))
                            .into_value(),
                    );
                }
                BlockValue::Stream(kept)
            }
            (Self::RenameStructChildren { old_name, new_name }, BlockValue::Struct(fields)) => {
                BlockValue::Struct(
                    fields
                        .into_iter()
                        .map(|(key, value)| {
                            if key == *old_name {
                                (new_name.clone(), value)
                            } else {
                                (key, value)
                            }
                        })
                        .collect(),
                )
            }
            (Self::RemoveStructChildren { name }, BlockValue::Struct(fields)) => {
                BlockValue::Struct(fields.into_iter().filter(|(key, _)| key != name).collect())
            }
            (Self::ListChildrenToStruct { block_name }, BlockValue::List(items)) => {
                BlockValue::List(
                    items
                        .into_iter()
                        .map(|item| {
                            item.map_value(|value| {
                                let mut fields = Map::new();
                                fields.insert(block_name.clone(), value);
                                Value::Object(fields)
                            })
                        })
                        .collect(),
                )
            }
            (Self::AlterBlockValue { new_value }, _) => BlockValue::Leaf(new_value.clone()),
            (_, value) => {
                return Err(OperationError::WrongTarget {
                    operation: self.name(),
                    expected: self.target_kind().unwrap_or(ContainerKind::Leaf),
                    found: value.kind(),
                })
            }
        };

        Ok(applied)
    }

    /// Rewrite the children this operation applies to, keep the rest as is
    fn map_stream_children<F>(
        &self,
        children: Vec<Value>,
        mut f: F,
    ) -> Result<Vec<Value>, OperationError>
    where
        F: FnMut(RawNode) -> RawNode,
    {
        children
            .into_iter()
            .map(|child| -> Result<Value, OperationError> {
                if self.applies_to(RawNode::peek_type(&child)?) {
                    Ok(f(RawNode::from_value(child)?).into_value())
                } else {
                    Ok(child)
                }
            })
            .collect()
    }

    /// Split children into (applies, does not apply), both in original order
    fn partition_stream(
        &self,
        children: Vec<Value>,
    ) -> Result<(Vec<Value>, Vec<Value>), OperationError> {
        let mut taken = Vec::new();
        let mut kept = Vec::with_capacity(children.len());
        for child in children {
            if self.applies_to(RawNode::peek_type(&child)?) {
                taken.push(child);
            } else {
                kept.push(child);
            }
        }
        Ok((taken, kept))
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RenameStreamChildren { old_name, new_name }
            | Self::RenameStructChildren { old_name, new_name } => {
                write!(f, "{}({old_name} -> {new_name})", self.name())
            }
            Self::RemoveStreamChildren { name } | Self::RemoveStructChildren { name } => {
                write!(f, "{}({name})", self.name())
            }
            Self::AlterBlockValue { .. } => f.write_str(self.name()),
            Self::StreamChildrenToList { block_name, list_block_name } => {
                write!(f, "{}({block_name} -> {list_block_name})", self.name())
            }
            Self::StreamChildrenToStream { block_names, stream_block_name } => {
                write!(f, "{}([{}] -> {stream_block_name})", self.name(), block_names.join(", "))
            }
            Self::StreamChildrenToStruct { block_name, struct_block_name } => {
                write!(f, "{}({block_name} -> {struct_block_name})", self.name())
            }
            Self::ListChildrenToStruct { block_name } => write!(f, "{}({block_name})", self.name()),
        }
    }
}
