//! Revision-aware migration orchestrator
//!
//! For each record the orchestrator:
//! 1. Migrates the current tree; any failure is fatal
//! 2. Classifies every snapshot as live, latest or other
//! 3. Migrates in-scope snapshots; failures on live or latest snapshots are
//!    fatal, failures on other snapshots are logged and skipped
//! 4. Commits everything that succeeded as one [`RecordUpdate`]
//!
//! A fatal failure stops before the commit, so the record is left untouched.

use crate::config::MigrationConfig;
use crate::error::MigrationError;
use crate::log::{LogRecord, MigrationLog, TracingLog};
use crate::plan::MigrationPlan;
use crate::storage::{RecordId, RecordStore, RecordUpdate, Snapshot, SnapshotId};
use blockshift_schema::BlockSchema;
use serde::Serialize;
use serde_json::Value;

/// Role of a snapshot within its record's history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotRole {
    /// Currently published
    Live,
    /// Most recently created
    Latest,
    /// Any older draft
    Other,
}

impl SnapshotRole {
    /// Classify a snapshot; live wins when a snapshot is both
    #[must_use]
    pub fn classify(id: SnapshotId, live: Option<SnapshotId>, latest: Option<SnapshotId>) -> Self {
        if live == Some(id) {
            Self::Live
        } else if latest == Some(id) {
            Self::Latest
        } else {
            Self::Other
        }
    }

    /// Whether a failure on this snapshot aborts the record
    #[inline]
    #[must_use]
    pub fn is_critical(self) -> bool {
        !matches!(self, Self::Other)
    }
}

/// Result of migrating one snapshot
#[derive(Debug)]
enum Outcome {
    Migrated(Value),
    /// Nothing to do
    Skipped,
    /// Failed; logged and left as it was
    Recovered(MigrationError),
    /// Failed; the record must not be committed
    Fatal(MigrationError),
}

/// Result of migrating one record
#[derive(Debug)]
enum RecordOutcome {
    Committed,
    Fatal(MigrationError),
}

/// Counters for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub records_migrated: usize,
    pub snapshots_migrated: usize,
    /// Out of scope, or without the configured payload field
    pub snapshots_skipped: usize,
    /// Failed on a non critical snapshot, logged and left unchanged
    pub snapshots_recovered: usize,
    /// Records abandoned under `continue_on_record_error`
    pub failed_records: Vec<RecordId>,
}

impl MigrationReport {
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed_records.is_empty() && self.snapshots_recovered == 0
    }
}

/// Drives a [`MigrationPlan`] over every record of a store
#[derive(Debug, Clone, Default)]
pub struct MigrationOrchestrator<L = TracingLog> {
    config: MigrationConfig,
    log: L,
}

impl MigrationOrchestrator<TracingLog> {
    /// Create orchestrator reporting through `tracing`
    #[inline]
    #[must_use]
    pub fn new(config: MigrationConfig) -> Self {
        Self {
            config,
            log: TracingLog,
        }
    }
}

impl<L: MigrationLog> MigrationOrchestrator<L> {
    /// With another log sink
    #[must_use]
    pub fn with_log<M: MigrationLog>(self, log: M) -> MigrationOrchestrator<M> {
        MigrationOrchestrator {
            config: self.config,
            log,
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn log(&self) -> &L {
        &self.log
    }

    /// Migrate every record in `store`
    ///
    /// # Errors
    /// - [`MigrationError::InvalidBlockDef`], [`MigrationError::Transform`] or
    ///   [`MigrationError::SnapshotDecode`] for a failure on a current tree,
    ///   live or latest snapshot (unless `continue_on_record_error` is set)
    /// - [`MigrationError::Storage`] on any storage failure
    pub fn run<St, Sc>(
        &self,
        store: &St,
        schema: &Sc,
        plan: &MigrationPlan,
    ) -> Result<MigrationReport, MigrationError>
    where
        St: RecordStore + ?Sized,
        Sc: BlockSchema + ?Sized,
    {
        let kind = store.record_kind();
        let ids = store.record_ids()?;
        tracing::info!(
            "Migrating {} {} records ({} steps, revisions from {})",
            ids.len(),
            kind,
            plan.len(),
            self.config.revisions_from
        );

        let mut report = MigrationReport::default();
        for id in ids {
            match self.migrate_record(store, schema, plan, &kind, &id, &mut report)? {
                RecordOutcome::Committed => report.records_migrated += 1,
                RecordOutcome::Fatal(err) if self.config.continue_on_record_error => {
                    self.log.log(LogRecord::error(err.report()));
                    report.failed_records.push(id);
                }
                RecordOutcome::Fatal(err) => {
                    tracing::error!("Migration aborted: {}", err);
                    return Err(err);
                }
            }
        }

        tracing::info!(
            "Migrated {} records, {} snapshots ({} skipped, {} recovered, {} failed records)",
            report.records_migrated,
            report.snapshots_migrated,
            report.snapshots_skipped,
            report.snapshots_recovered,
            report.failed_records.len()
        );
        Ok(report)
    }

    /// Migrate one record; storage errors propagate, tree errors come back
    /// as an outcome
    fn migrate_record<St, Sc>(
        &self,
        store: &St,
        schema: &Sc,
        plan: &MigrationPlan,
        kind: &str,
        id: &RecordId,
        report: &mut MigrationReport,
    ) -> Result<RecordOutcome, MigrationError>
    where
        St: RecordStore + ?Sized,
        Sc: BlockSchema + ?Sized,
    {
        tracing::debug!("Migrating {} object ({})", kind, id);
        let mut update = RecordUpdate::new(id.clone());

        let content = store.load_content(id)?;
        match plan.apply(content, schema) {
            Ok(tree) => update.content = Some(tree),
            Err(source) => {
                let subject = format!("{kind} object ({id})");
                return Ok(RecordOutcome::Fatal(MigrationError::from_transform(
                    &subject, source,
                )));
            }
        }

        let history = store.load_history(id)?;
        let live = history.live;
        let latest = history.latest_id();

        // Counted only once the record commits
        let mut migrated = 0;
        let mut skipped = 0;
        let mut recovered = 0;

        for snapshot in &history.snapshots {
            let role = SnapshotRole::classify(snapshot.id, live, latest);
            if !role.is_critical() && !self.config.revisions_from.includes(&snapshot.created_at) {
                skipped += 1;
                continue;
            }

            match self.migrate_snapshot(snapshot, role, schema, plan, kind, id) {
                Outcome::Migrated(payload) => {
                    update.snapshots.push((snapshot.id, payload));
                    migrated += 1;
                }
                Outcome::Skipped => skipped += 1,
                Outcome::Recovered(err) => {
                    self.log.log(LogRecord::error(err.report()));
                    recovered += 1;
                }
                Outcome::Fatal(err) => return Ok(RecordOutcome::Fatal(err)),
            }
        }

        store.commit(update)?;
        report.snapshots_migrated += migrated;
        report.snapshots_skipped += skipped;
        report.snapshots_recovered += recovered;
        Ok(RecordOutcome::Committed)
    }

    fn migrate_snapshot<Sc>(
        &self,
        snapshot: &Snapshot,
        role: SnapshotRole,
        schema: &Sc,
        plan: &MigrationPlan,
        kind: &str,
        id: &RecordId,
    ) -> Outcome
    where
        Sc: BlockSchema + ?Sized,
    {
        let field = self.config.field_name.as_str();
        let Some(stored) = snapshot.payload.get(field) else {
            tracing::debug!("Snapshot {} has no '{}' field, skipping", snapshot.id, field);
            return Outcome::Skipped;
        };

        let subject = || {
            format!(
                "{kind} object ({id}) for revision id ({}) created at {}",
                snapshot.id,
                snapshot.created_at.to_rfc3339()
            )
        };
        let fail = |err: MigrationError| {
            if role.is_critical() {
                Outcome::Fatal(err)
            } else {
                Outcome::Recovered(err)
            }
        };

        // Trees are usually stored as JSON text; native JSON is written back as is
        let (tree, as_text) = match stored {
            Value::String(text) => match serde_json::from_str(text) {
                Ok(tree) => (tree, true),
                Err(source) => {
                    return fail(MigrationError::SnapshotDecode {
                        context: format!("Could not decode {}", subject()),
                        source,
                    })
                }
            },
            other => (other.clone(), false),
        };

        let tree = match plan.apply(tree, schema) {
            Ok(tree) => tree,
            Err(source) => return fail(MigrationError::from_transform(&subject(), source)),
        };

        tracing::trace!("Migrated {:?} snapshot {} of {}", role, snapshot.id, id);
        let mut payload = snapshot.payload.clone();
        payload[field] = if as_text {
            Value::String(tree.to_string())
        } else {
            tree
        };
        Outcome::Migrated(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::CapturingLog;
    use crate::storage::{MockRecordStore, RecordHistory, StorageError};
    use blockshift_ops::Operation;
    use blockshift_schema::BlockDef;
    use blockshift_tree::BlockPath;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn schema() -> BlockDef {
        BlockDef::stream([("char1", BlockDef::leaf()), ("renamed1", BlockDef::leaf())])
    }

    fn rename_plan() -> MigrationPlan {
        MigrationPlan::single(
            Operation::rename_stream_children("char1", "renamed1"),
            BlockPath::root(),
        )
    }

    /// Walks through `invalid_name1`, so trees holding it fail
    fn invalid_path_plan() -> MigrationPlan {
        MigrationPlan::single(
            Operation::rename_struct_children("char1", "renamed1"),
            BlockPath::single("invalid_name1"),
        )
    }

    fn bad_tree() -> Value {
        json!([{"type": "invalid_name1", "value": {}, "id": "1"}])
    }

    fn malformed_tree() -> Value {
        json!({"not": "a stream"})
    }

    fn snapshot(id: u64, day: u32, tree: &Value) -> Snapshot {
        Snapshot {
            id: SnapshotId(id),
            created_at: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            payload: json!({"content": tree.to_string()}),
        }
    }

    fn mock_store(content: Value, history: RecordHistory) -> MockRecordStore {
        let mut store = MockRecordStore::new();
        store
            .expect_record_kind()
            .return_const("BlockPage".to_string());
        store
            .expect_record_ids()
            .returning(|| Ok(vec![RecordId::from("1")]));
        store
            .expect_load_content()
            .returning(move |_| Ok(content.clone()));
        store
            .expect_load_history()
            .returning(move |_| Ok(history.clone()));
        store
    }

    #[test]
    fn classify_roles() {
        let live = Some(SnapshotId(1));
        let latest = Some(SnapshotId(2));
        assert_eq!(SnapshotRole::classify(SnapshotId(1), live, latest), SnapshotRole::Live);
        assert_eq!(SnapshotRole::classify(SnapshotId(2), live, latest), SnapshotRole::Latest);
        assert_eq!(SnapshotRole::classify(SnapshotId(3), live, latest), SnapshotRole::Other);
        assert_eq!(
            SnapshotRole::classify(SnapshotId(1), live, live),
            SnapshotRole::Live
        );
        assert!(!SnapshotRole::Other.is_critical());
    }

    #[test]
    fn commits_once_per_record() {
        let good = json!([{"type": "char1", "value": "a", "id": "1"}]);
        let history = RecordHistory {
            snapshots: vec![snapshot(1, 1, &good)],
            live: None,
            latest: None,
        };
        let mut store = mock_store(good, history);
        store
            .expect_commit()
            .withf(|update| {
                update.content == Some(json!([{"type": "renamed1", "value": "a", "id": "1"}]))
                    && update.snapshots.len() == 1
            })
            .times(1)
            .returning(|_| Ok(()));

        let report = MigrationOrchestrator::new(MigrationConfig::default())
            .run(&store, &schema(), &rename_plan())
            .unwrap();
        assert_eq!(report.records_migrated, 1);
        assert_eq!(report.snapshots_migrated, 1);
    }

    #[test]
    fn fatal_current_tree_never_commits() {
        let mut store = mock_store(bad_tree(), RecordHistory::default());
        store.expect_commit().never();

        let err = MigrationOrchestrator::new(MigrationConfig::default())
            .run(&store, &schema(), &invalid_path_plan())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid block def in BlockPage object (1): No current block def named invalid_name1"
        );
    }

    #[test]
    fn fatal_latest_snapshot_never_commits() {
        let good = json!([]);
        let history = RecordHistory {
            snapshots: vec![snapshot(7, 1, &good), snapshot(8, 2, &bad_tree())],
            live: Some(SnapshotId(7)),
            latest: None,
        };
        let mut store = mock_store(good, history);
        store.expect_commit().never();

        let err = MigrationOrchestrator::new(MigrationConfig::default())
            .run(&store, &schema(), &invalid_path_plan())
            .unwrap_err();
        assert!(err.is_invalid_block_def());
        assert_eq!(
            err.context(),
            Some(
                "Invalid block def in BlockPage object (1) \
                 for revision id (8) created at 2024-01-02T00:00:00+00:00"
            )
        );
    }

    #[test]
    fn other_snapshot_failure_is_logged_and_committed_around() {
        let good = json!([{"type": "char1", "value": "a", "id": "1"}]);
        let history = RecordHistory {
            snapshots: vec![snapshot(1, 1, &bad_tree()), snapshot(2, 2, &good)],
            live: None,
            latest: None,
        };
        let mut store = mock_store(good, history);
        store
            .expect_commit()
            .withf(|update| update.snapshots.iter().map(|(id, _)| *id).eq([SnapshotId(2)]))
            .times(1)
            .returning(|_| Ok(()));

        let log = CapturingLog::new();
        let report = MigrationOrchestrator::new(MigrationConfig::default())
            .with_log(&log)
            .run(&store, &schema(), &invalid_path_plan())
            .unwrap();

        assert_eq!(report.snapshots_recovered, 1);
        assert_eq!(report.snapshots_migrated, 1);
        assert!(!report.is_clean());
        let lines = log.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with(
            "ERROR:blockshift_migrate::migrate:\
             Invalid block def in BlockPage object (1) for revision id (1)"
        ));
        assert!(lines[0]
            .ends_with("InvalidBlockDefError: No current block def named invalid_name1"));
    }

    #[test]
    fn malformed_other_snapshot_is_recovered() {
        let good = json!([{"type": "char1", "value": "a", "id": "1"}]);
        let history = RecordHistory {
            snapshots: vec![snapshot(1, 1, &malformed_tree()), snapshot(2, 2, &good)],
            live: None,
            latest: None,
        };
        let mut store = mock_store(good, history);
        store
            .expect_commit()
            .withf(|update| update.snapshots.iter().map(|(id, _)| *id).eq([SnapshotId(2)]))
            .times(1)
            .returning(|_| Ok(()));

        let log = CapturingLog::new();
        let report = MigrationOrchestrator::new(MigrationConfig::default())
            .with_log(&log)
            .run(&store, &schema(), &rename_plan())
            .unwrap();

        assert_eq!(report.snapshots_recovered, 1);
        let lines = log.lines();
        assert!(lines[0].starts_with(
            "ERROR:blockshift_migrate::migrate:\
             Could not migrate BlockPage object (1) for revision id (1)"
        ));
        assert!(lines[0].ends_with("TreeError: expected stream data, found object"));
        assert!(!log.text().contains("Invalid block def"));
    }

    #[test]
    fn malformed_live_snapshot_is_fatal() {
        let history = RecordHistory {
            snapshots: vec![snapshot(1, 1, &malformed_tree()), snapshot(2, 2, &json!([]))],
            live: Some(SnapshotId(1)),
            latest: None,
        };
        let mut store = mock_store(json!([]), history);
        store.expect_commit().never();

        let err = MigrationOrchestrator::new(MigrationConfig::default())
            .run(&store, &schema(), &rename_plan())
            .unwrap_err();
        assert!(matches!(err, MigrationError::Transform { .. }));
        assert!(!err.is_invalid_block_def());
        assert_eq!(
            err.to_string(),
            "Could not migrate BlockPage object (1) for revision id (1) created at \
             2024-01-01T00:00:00+00:00: malformed block data at '': \
             expected stream data, found object"
        );
    }

    #[test]
    fn undecodable_live_snapshot_is_fatal() {
        let history = RecordHistory {
            snapshots: vec![Snapshot {
                id: SnapshotId(1),
                created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                payload: json!({"content": "[not json"}),
            }],
            live: Some(SnapshotId(1)),
            latest: None,
        };
        let mut store = mock_store(json!([]), history);
        store.expect_commit().never();

        let err = MigrationOrchestrator::new(MigrationConfig::default())
            .run(&store, &schema(), &rename_plan())
            .unwrap_err();
        assert!(matches!(err, MigrationError::SnapshotDecode { .. }));
    }

    #[test]
    fn storage_failure_propagates() {
        let mut store = MockRecordStore::new();
        store
            .expect_record_kind()
            .return_const("BlockPage".to_string());
        store
            .expect_record_ids()
            .returning(|| Err(StorageError::Backend("offline".to_string())));

        let err = MigrationOrchestrator::new(MigrationConfig::default())
            .run(&store, &schema(), &rename_plan())
            .unwrap_err();
        assert!(matches!(err, MigrationError::Storage(_)));
    }

    #[test]
    fn continue_on_record_error_collects_failures() {
        let mut store = mock_store(bad_tree(), RecordHistory::default());
        store.expect_commit().never();

        let log = CapturingLog::new();
        let report = MigrationOrchestrator::new(
            MigrationConfig::default().with_continue_on_record_error(true),
        )
        .with_log(&log)
        .run(&store, &schema(), &invalid_path_plan())
        .unwrap();

        assert_eq!(report.failed_records, vec![RecordId::from("1")]);
        assert_eq!(report.records_migrated, 0);
        assert!(log.text().contains("Invalid block def in BlockPage object (1)"));
    }
}
