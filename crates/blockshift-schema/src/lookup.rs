//! Schema lookup by block path
//!
//! [`BlockSchema`] is the read-only port the transformer validates block
//! names against. [`StreamFieldSchema`] is the concrete adapter, built from
//! the definitions currently configured for one stream field.

use crate::def::BlockDef;
use blockshift_tree::{BlockPath, ContainerKind};
use std::sync::Arc;

/// Read-only view of the current block definitions
///
/// Always reflects the definitions configured *now*; data written under an
/// older definition is checked against it, never the other way around.
pub trait BlockSchema {
    /// Definition of the root container
    fn root(&self) -> &BlockDef;

    /// Definition at `path`, if every segment is defined
    fn definition_at(&self, path: &BlockPath) -> Option<&BlockDef> {
        self.root().descend(path)
    }

    /// Names valid directly below `path` (empty if `path` is undefined)
    fn child_names(&self, path: &BlockPath) -> Vec<&str> {
        self.definition_at(path)
            .map(BlockDef::child_names)
            .unwrap_or_default()
    }

    /// Whether `name` is a valid child at `path`
    fn exists(&self, path: &BlockPath, name: &str) -> bool {
        self.definition_at(path)
            .and_then(|def| def.child(name))
            .is_some()
    }
}

impl BlockSchema for BlockDef {
    fn root(&self) -> &BlockDef {
        self
    }
}

impl<T: BlockSchema + ?Sized> BlockSchema for &T {
    fn root(&self) -> &BlockDef {
        (**self).root()
    }
}

impl<T: BlockSchema + ?Sized> BlockSchema for Arc<T> {
    fn root(&self) -> &BlockDef {
        (**self).root()
    }
}

/// Current definitions of one stream field
#[derive(Debug, Clone, PartialEq)]
pub struct StreamFieldSchema {
    root: BlockDef,
}

impl StreamFieldSchema {
    /// Wrap a root definition
    ///
    /// # Errors
    /// Returns error if `root` is not a stream block
    pub fn new(root: BlockDef) -> Result<Self, SchemaError> {
        match root.kind() {
            ContainerKind::Stream => Ok(Self { root }),
            found => Err(SchemaError::RootNotStream { found }),
        }
    }

    /// Load definitions from JSON text
    ///
    /// # Errors
    /// Returns error on malformed JSON or a non-stream root
    pub fn from_json_str(text: &str) -> Result<Self, SchemaError> {
        let root: BlockDef = serde_json::from_str(text)?;
        Self::new(root)
    }

    /// Load definitions from YAML text
    ///
    /// # Errors
    /// Returns error on malformed YAML or a non-stream root
    pub fn from_yaml_str(text: &str) -> Result<Self, SchemaError> {
        let root: BlockDef = serde_yaml::from_str(text)?;
        Self::new(root)
    }

    #[inline]
    #[must_use]
    pub fn into_inner(self) -> BlockDef {
        self.root
    }
}

impl BlockSchema for StreamFieldSchema {
    fn root(&self) -> &BlockDef {
        &self.root
    }
}

/// Errors loading block definitions
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Stream fields must have a stream at the root
    #[error("root block definition must be a stream, found {found}")]
    RootNotStream { found: ContainerKind },

    /// JSON parse failure
    #[error("invalid block definitions (JSON): {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parse failure
    #[error("invalid block definitions (YAML): {0}")]
    Yaml(#[from] serde_yaml::Error),
}
