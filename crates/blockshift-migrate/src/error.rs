//! Error types for migration runs

use crate::storage::StorageError;
use blockshift_ops::TransformError;

/// Migration failure
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// A tree holds a block name the current definitions do not have
    #[error("{context}: {source}")]
    InvalidBlockDef {
        /// Which record (and snapshot) was being migrated
        context: String,
        #[source]
        source: TransformError,
    },

    /// A tree has the wrong shape for its definitions, or the plan does not
    /// fit the blocks it targets
    #[error("{context}: {source}")]
    Transform {
        context: String,
        #[source]
        source: TransformError,
    },

    /// Snapshot payload field holds text that is not a JSON tree
    #[error("{context}: {source}")]
    SnapshotDecode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Storage port failure
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Invalid configuration or plan
    #[error("configuration error: {0}")]
    Config(String),
}

impl MigrationError {
    /// Wrap a transformer failure on `subject` (e.g. `"BlockPage object (1)"`)
    pub(crate) fn from_transform(subject: &str, source: TransformError) -> Self {
        if source.is_invalid_block_def() {
            Self::InvalidBlockDef {
                context: format!("Invalid block def in {subject}"),
                source,
            }
        } else {
            Self::Transform {
                context: format!("Could not migrate {subject}"),
                source,
            }
        }
    }

    /// Context line of a per-tree failure
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        match self {
            Self::InvalidBlockDef { context, .. }
            | Self::Transform { context, .. }
            | Self::SnapshotDecode { context, .. } => Some(context),
            Self::Storage(_) | Self::Config(_) => None,
        }
    }

    /// Check if the underlying cause is an unknown block name
    #[inline]
    #[must_use]
    pub fn is_invalid_block_def(&self) -> bool {
        matches!(self, Self::InvalidBlockDef { source, .. } if source.is_invalid_block_def())
    }

    /// Fully qualified type name of the underlying error
    #[must_use]
    pub fn qualified_name(&self) -> &'static str {
        match self {
            Self::InvalidBlockDef { source, .. } | Self::Transform { source, .. } => {
                source.qualified_name()
            }
            Self::SnapshotDecode { .. } => std::any::type_name::<serde_json::Error>(),
            Self::Storage(_) => std::any::type_name::<StorageError>(),
            Self::Config(_) => std::any::type_name::<Self>(),
        }
    }

    /// Message of the underlying error, without the context
    #[must_use]
    pub fn root_message(&self) -> String {
        match self {
            Self::InvalidBlockDef { source, .. } | Self::Transform { source, .. } => {
                source.root_message()
            }
            Self::SnapshotDecode { source, .. } => source.to_string(),
            Self::Storage(e) => e.to_string(),
            Self::Config(message) => message.clone(),
        }
    }

    /// Log message: context line, then `<error type>: <message>`
    #[must_use]
    pub fn report(&self) -> String {
        let cause = format!("{}: {}", self.qualified_name(), self.root_message());
        match self.context() {
            Some(context) => format!("{context}\n{cause}"),
            None => cause,
        }
    }
}
