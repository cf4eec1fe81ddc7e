//! Block definitions
//!
//! Provides [`BlockDef`], the current shape of every block a tree may hold.

use blockshift_tree::{BlockPath, ContainerKind, LIST_ITEM_NAME};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Child definitions of a stream or struct block, in declaration order
pub type ChildBlocks = IndexMap<String, BlockDef>;

/// Definition of a block and, recursively, of its children
///
/// Serialized with a `kind` tag:
///
/// ```json
/// {"kind": "stream", "children": {
///     "char1": {"kind": "leaf"},
///     "simplelist": {"kind": "list", "child": {"kind": "leaf"}}
/// }}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BlockDef {
    /// Ordered, repeatable typed children
    Stream {
        #[serde(default)]
        children: ChildBlocks,
    },
    /// Named fields
    Struct {
        #[serde(default)]
        children: ChildBlocks,
    },
    /// Items all sharing one definition, addressed as `item`
    List { child: Box<BlockDef> },
    /// Any value without block children
    Leaf,
}

impl BlockDef {
    /// Stream definition from `(name, definition)` pairs
    #[must_use]
    pub fn stream<I, S>(children: I) -> Self
    where
        I: IntoIterator<Item = (S, BlockDef)>,
        S: Into<String>,
    {
        Self::Stream {
            children: children.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Struct definition from `(name, definition)` pairs
    #[must_use]
    pub fn structure<I, S>(children: I) -> Self
    where
        I: IntoIterator<Item = (S, BlockDef)>,
        S: Into<String>,
    {
        Self::Struct {
            children: children.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    #[inline]
    #[must_use]
    pub fn list(child: BlockDef) -> Self {
        Self::List {
            child: Box::new(child),
        }
    }

    #[inline]
    #[must_use]
    pub fn leaf() -> Self {
        Self::Leaf
    }

    /// Container kind of data stored for this block
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ContainerKind {
        match self {
            Self::Stream { .. } => ContainerKind::Stream,
            Self::Struct { .. } => ContainerKind::Struct,
            Self::List { .. } => ContainerKind::List,
            Self::Leaf => ContainerKind::Leaf,
        }
    }

    /// Definition of the direct child called `name`
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&BlockDef> {
        match self {
            Self::Stream { children } | Self::Struct { children } => children.get(name),
            Self::List { child } => (name == LIST_ITEM_NAME).then_some(child.as_ref()),
            Self::Leaf => None,
        }
    }

    /// Names valid directly below this block
    #[must_use]
    pub fn child_names(&self) -> Vec<&str> {
        match self {
            Self::Stream { children } | Self::Struct { children } => {
                children.keys().map(String::as_str).collect()
            }
            Self::List { .. } => vec![LIST_ITEM_NAME],
            Self::Leaf => Vec::new(),
        }
    }

    /// Walk down `path`, returning the definition it ends at
    #[must_use]
    pub fn descend(&self, path: &BlockPath) -> Option<&BlockDef> {
        path.iter().try_fold(self, |def, name| def.child(name))
    }
}
