//! In-memory record store
//!
//! Reference [`RecordStore`] implementation. Records keep insertion order;
//! each commit is applied under a single write lock after every target has
//! been checked, so a rejected update changes nothing.

use crate::storage::{
    RecordHistory, RecordId, RecordStore, RecordUpdate, Snapshot, SnapshotId, StorageError,
};
use blockshift_tree::RawTree;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;

#[derive(Debug, Clone)]
struct StoredRecord {
    content: RawTree,
    history: RecordHistory,
}

#[derive(Debug, Default)]
struct Inner {
    records: IndexMap<RecordId, StoredRecord>,
    next_snapshot: u64,
    commits: usize,
}

/// Thread-safe in-memory [`RecordStore`]
#[derive(Debug)]
pub struct InMemoryStore {
    kind: String,
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    /// Create an empty store holding records of `kind`
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Insert a record, or replace its current tree if it exists
    pub fn insert_record(&self, id: impl Into<RecordId>, content: RawTree) {
        let mut inner = self.inner.write();
        match inner.records.entry(id.into()) {
            indexmap::map::Entry::Occupied(mut entry) => entry.get_mut().content = content,
            indexmap::map::Entry::Vacant(entry) => {
                entry.insert(StoredRecord {
                    content,
                    history: RecordHistory::default(),
                });
            }
        }
    }

    /// Append a snapshot with a raw payload
    ///
    /// The new snapshot becomes the record's latest one.
    ///
    /// # Errors
    /// Returns error if the record does not exist
    pub fn push_snapshot(
        &self,
        id: &RecordId,
        created_at: DateTime<Utc>,
        payload: Value,
    ) -> Result<SnapshotId, StorageError> {
        let mut inner = self.inner.write();
        inner.next_snapshot += 1;
        let snapshot_id = SnapshotId(inner.next_snapshot);

        let record = inner
            .records
            .get_mut(id)
            .ok_or_else(|| StorageError::RecordNotFound(id.clone()))?;
        record.history.snapshots.push(Snapshot {
            id: snapshot_id,
            created_at,
            payload,
        });
        record.history.latest = Some(snapshot_id);
        Ok(snapshot_id)
    }

    /// Append a snapshot of `tree`, serialized as JSON text under `field`
    ///
    /// # Errors
    /// Returns error if the record does not exist
    pub fn save_snapshot(
        &self,
        id: &RecordId,
        created_at: DateTime<Utc>,
        field: &str,
        tree: &RawTree,
    ) -> Result<SnapshotId, StorageError> {
        let mut payload = serde_json::Map::new();
        payload.insert(field.to_owned(), Value::String(tree.to_string()));
        self.push_snapshot(id, created_at, Value::Object(payload))
    }

    /// Mark a snapshot as the published one
    ///
    /// # Errors
    /// Returns error if the record or snapshot does not exist
    pub fn set_live(&self, id: &RecordId, snapshot: SnapshotId) -> Result<(), StorageError> {
        self.with_history(id, snapshot, |history| history.live = Some(snapshot))
    }

    /// Override which snapshot counts as latest
    ///
    /// # Errors
    /// Returns error if the record or snapshot does not exist
    pub fn set_latest(&self, id: &RecordId, snapshot: SnapshotId) -> Result<(), StorageError> {
        self.with_history(id, snapshot, |history| history.latest = Some(snapshot))
    }

    /// Current tree of a record
    #[must_use]
    pub fn content(&self, id: &RecordId) -> Option<RawTree> {
        self.inner
            .read()
            .records
            .get(id)
            .map(|record| record.content.clone())
    }

    /// Raw payload of a snapshot
    #[must_use]
    pub fn snapshot_payload(&self, id: &RecordId, snapshot: SnapshotId) -> Option<Value> {
        self.inner.read().records.get(id).and_then(|record| {
            record
                .history
                .snapshots
                .iter()
                .find(|s| s.id == snapshot)
                .map(|s| s.payload.clone())
        })
    }

    /// Tree stored in a snapshot under `field`, decoded from JSON text
    #[must_use]
    pub fn snapshot_tree(
        &self,
        id: &RecordId,
        snapshot: SnapshotId,
        field: &str,
    ) -> Option<RawTree> {
        let payload = self.snapshot_payload(id, snapshot)?;
        match payload.get(field)? {
            Value::String(text) => serde_json::from_str(text).ok(),
            other => Some(other.clone()),
        }
    }

    /// Number of successful commits
    #[must_use]
    pub fn commit_count(&self) -> usize {
        self.inner.read().commits
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().records.is_empty()
    }

    fn with_history<F>(&self, id: &RecordId, snapshot: SnapshotId, f: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut RecordHistory),
    {
        let mut inner = self.inner.write();
        let record = inner
            .records
            .get_mut(id)
            .ok_or_else(|| StorageError::RecordNotFound(id.clone()))?;
        if !record.history.snapshots.iter().any(|s| s.id == snapshot) {
            return Err(StorageError::SnapshotNotFound {
                record: id.clone(),
                snapshot,
            });
        }
        f(&mut record.history);
        Ok(())
    }
}

impl RecordStore for InMemoryStore {
    fn record_kind(&self) -> String {
        self.kind.clone()
    }

    fn record_ids(&self) -> Result<Vec<RecordId>, StorageError> {
        Ok(self.inner.read().records.keys().cloned().collect())
    }

    fn load_content(&self, id: &RecordId) -> Result<RawTree, StorageError> {
        self.content(id)
            .ok_or_else(|| StorageError::RecordNotFound(id.clone()))
    }

    fn load_history(&self, id: &RecordId) -> Result<RecordHistory, StorageError> {
        self.inner
            .read()
            .records
            .get(id)
            .map(|record| record.history.clone())
            .ok_or_else(|| StorageError::RecordNotFound(id.clone()))
    }

    fn commit(&self, update: RecordUpdate) -> Result<(), StorageError> {
        let mut inner = self.inner.write();
        let record = inner
            .records
            .get_mut(&update.record)
            .ok_or_else(|| StorageError::RecordNotFound(update.record.clone()))?;

        // Resolve every snapshot before touching anything
        let mut positions = Vec::with_capacity(update.snapshots.len());
        for (snapshot, _) in &update.snapshots {
            let position = record
                .history
                .snapshots
                .iter()
                .position(|s| s.id == *snapshot)
                .ok_or_else(|| StorageError::SnapshotNotFound {
                    record: update.record.clone(),
                    snapshot: *snapshot,
                })?;
            positions.push(position);
        }

        if let Some(content) = update.content {
            record.content = content;
        }
        for (position, (_, payload)) in positions.into_iter().zip(update.snapshots) {
            record.history.snapshots[position].payload = payload;
        }
        inner.commits += 1;

        tracing::debug!("Committed record {}", update.record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn snapshots_keep_creation_order() {
        let store = InMemoryStore::new("BlockPage");
        let id = RecordId::from("1");
        store.insert_record(id.clone(), json!([]));

        let first = store.save_snapshot(&id, at(1), "content", &json!([])).unwrap();
        let second = store.save_snapshot(&id, at(2), "content", &json!([1])).unwrap();
        store.set_live(&id, first).unwrap();

        let history = store.load_history(&id).unwrap();
        let ids: Vec<_> = history.snapshots.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![first, second]);
        assert_eq!(history.live, Some(first));
        assert_eq!(history.latest_id(), Some(second));
        assert_eq!(
            store.snapshot_payload(&id, second),
            Some(json!({"content": "[1]"}))
        );
        assert_eq!(store.snapshot_tree(&id, second, "content"), Some(json!([1])));
    }

    #[test]
    fn commit_writes_content_and_snapshots() {
        let store = InMemoryStore::new("BlockPage");
        let id = RecordId::from("1");
        store.insert_record(id.clone(), json!([]));
        let snapshot = store.save_snapshot(&id, at(1), "content", &json!([])).unwrap();

        store
            .commit(RecordUpdate {
                record: id.clone(),
                content: Some(json!(["new"])),
                snapshots: vec![(snapshot, json!({"content": "[\"new\"]"}))],
            })
            .unwrap();

        assert_eq!(store.content(&id), Some(json!(["new"])));
        assert_eq!(store.snapshot_tree(&id, snapshot, "content"), Some(json!(["new"])));
        assert_eq!(store.commit_count(), 1);
    }

    #[test]
    fn rejected_commit_changes_nothing() {
        let store = InMemoryStore::new("BlockPage");
        let id = RecordId::from("1");
        store.insert_record(id.clone(), json!(["old"]));

        let err = store
            .commit(RecordUpdate {
                record: id.clone(),
                content: Some(json!(["new"])),
                snapshots: vec![(SnapshotId(99), json!({}))],
            })
            .unwrap_err();

        assert!(matches!(err, StorageError::SnapshotNotFound { .. }));
        assert_eq!(store.content(&id), Some(json!(["old"])));
        assert_eq!(store.commit_count(), 0);
    }

    #[test]
    fn unknown_record() {
        let store = InMemoryStore::new("BlockPage");
        let missing = RecordId::from("nope");
        assert!(matches!(
            store.load_content(&missing),
            Err(StorageError::RecordNotFound(_))
        ));
        assert!(store.push_snapshot(&missing, at(1), json!({})).is_err());
        assert!(store.is_empty());
    }
}
