//! Error types for block tree transformations

use blockshift_tree::{BlockPath, ContainerKind, PathError, TreeError};

/// A block name in the data that the current definitions do not know
///
/// Raised at the first such name met while walking towards the target,
/// in document order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("No current block def named {name}")]
pub struct InvalidBlockDefError {
    name: String,
    position: BlockPath,
    on_path: bool,
}

impl InvalidBlockDefError {
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, position: BlockPath, on_path: bool) -> Self {
        Self {
            name: name.into(),
            position,
            on_path,
        }
    }

    /// The unresolvable block name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Container in which the name was found
    #[inline]
    #[must_use]
    pub fn position(&self) -> &BlockPath {
        &self.position
    }

    /// Whether the name was the path segment being walked (as opposed to a
    /// sibling met on the way)
    #[inline]
    #[must_use]
    pub fn on_path(&self) -> bool {
        self.on_path
    }
}

/// Errors applying one operation to a container
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OperationError {
    /// Operation targeted a container of another kind
    #[error("{operation} operates on {expected} blocks, found {found}")]
    WrongTarget {
        operation: &'static str,
        expected: ContainerKind,
        found: ContainerKind,
    },

    /// Malformed child data
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Errors from [`apply_changes`](crate::apply_changes)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransformError {
    /// Data names a block the current definitions do not have
    #[error(transparent)]
    InvalidBlockDef(#[from] InvalidBlockDefError),

    /// Raw data does not have the shape its definition declares
    #[error("malformed block data at '{path}': {source}")]
    Malformed {
        path: BlockPath,
        #[source]
        source: TreeError,
    },

    /// Operation could not be applied at the target
    #[error("cannot apply operation at '{path}': {source}")]
    Operation {
        path: BlockPath,
        #[source]
        source: OperationError,
    },

    /// Block path string did not parse
    #[error("invalid block path: {0}")]
    Path(#[from] PathError),
}

impl TransformError {
    /// Check if this is a block definition mismatch
    #[inline]
    #[must_use]
    pub fn is_invalid_block_def(&self) -> bool {
        matches!(self, Self::InvalidBlockDef(_))
    }

    /// Fully qualified type name of the underlying error
    #[must_use]
    pub fn qualified_name(&self) -> &'static str {
        match self {
            Self::InvalidBlockDef(_) => std::any::type_name::<InvalidBlockDefError>(),
            Self::Malformed { .. } => std::any::type_name::<TreeError>(),
            Self::Operation { .. } => std::any::type_name::<OperationError>(),
            Self::Path(_) => std::any::type_name::<PathError>(),
        }
    }

    /// Message of the underlying error, without the wrapping context
    #[must_use]
    pub fn root_message(&self) -> String {
        match self {
            Self::InvalidBlockDef(e) => e.to_string(),
            Self::Malformed { source, .. } => source.to_string(),
            Self::Operation { source, .. } => source.to_string(),
            Self::Path(e) => e.to_string(),
        }
    }
}
