//! Storage port
//!
//! [`RecordStore`] is everything the orchestrator needs from persistence:
//! enumerate records, load a record's current tree and its snapshot history,
//! and write back one record's changes in a single call.

use blockshift_tree::RawTree;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of a record (a document owning a stream field)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Identifier of a snapshot, unique within a store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(pub u64);

impl std::fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stored historical copy of a record's content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: SnapshotId,
    pub created_at: DateTime<Utc>,
    /// Serialized record, e.g. `{"content": "<json text of the tree>"}`
    pub payload: Value,
}

/// Snapshots of one record, oldest first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordHistory {
    pub snapshots: Vec<Snapshot>,
    /// Currently published snapshot
    pub live: Option<SnapshotId>,
    /// Most recently created snapshot, when the store tracks it explicitly
    pub latest: Option<SnapshotId>,
}

impl RecordHistory {
    /// Latest snapshot id, falling back to the last one created
    #[must_use]
    pub fn latest_id(&self) -> Option<SnapshotId> {
        self.latest
            .or_else(|| self.snapshots.last().map(|snapshot| snapshot.id))
    }
}

/// All writes for one record, applied together or not at all
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordUpdate {
    pub record: RecordId,
    /// New current tree
    pub content: Option<RawTree>,
    /// New payloads for migrated snapshots
    pub snapshots: Vec<(SnapshotId, Value)>,
}

impl RecordUpdate {
    #[inline]
    #[must_use]
    pub fn new(record: RecordId) -> Self {
        Self {
            record,
            content: None,
            snapshots: Vec::new(),
        }
    }
}

/// Persistence behind a migration
///
/// Implementations must apply a [`RecordUpdate`] atomically: a failed
/// `commit` leaves the record as it was.
#[cfg_attr(test, mockall::automock)]
pub trait RecordStore {
    /// Human readable kind of the stored records (used in error messages)
    fn record_kind(&self) -> String;

    /// All record ids, in processing order
    ///
    /// # Errors
    /// Backend failure
    fn record_ids(&self) -> Result<Vec<RecordId>, StorageError>;

    /// Current tree of a record
    ///
    /// # Errors
    /// Unknown record or backend failure
    fn load_content(&self, id: &RecordId) -> Result<RawTree, StorageError>;

    /// Snapshot history of a record
    ///
    /// # Errors
    /// Unknown record or backend failure
    fn load_history(&self, id: &RecordId) -> Result<RecordHistory, StorageError>;

    /// Write all changes of one record
    ///
    /// # Errors
    /// Unknown record or snapshot, or backend failure
    fn commit(&self, update: RecordUpdate) -> Result<(), StorageError>;
}

/// Storage errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// Record does not exist
    #[error("record not found: {0}")]
    RecordNotFound(RecordId),

    /// Snapshot does not belong to the record
    #[error("snapshot {snapshot} not found for record {record}")]
    SnapshotNotFound {
        record: RecordId,
        snapshot: SnapshotId,
    },

    /// Backend specific failure
    #[error("storage backend error: {0}")]
    Backend(String),
}
