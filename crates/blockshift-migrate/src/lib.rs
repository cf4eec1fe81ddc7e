//! Revision-aware stream field migrations
//!
//! Runs a [`MigrationPlan`] over every record of a [`RecordStore`]: the
//! current tree of each record and, selectively, its stored snapshots.
//!
//! # Core Concepts
//!
//! - [`MigrationOrchestrator`]: Per-record driver with the fatal / recoverable policy
//! - [`RecordStore`]: Storage port; [`InMemoryStore`] is the reference adapter
//! - [`MigrationLog`]: Logging port for recovered failures
//! - [`MigrationConfig`]: Payload field, snapshot cutoff, batch behaviour
//!
//! # Failure policy
//!
//! | Tree                    | On failure                      |
//! |-------------------------|---------------------------------|
//! | Current content         | fatal                           |
//! | Live snapshot           | fatal                           |
//! | Latest snapshot         | fatal                           |
//! | Other, in scope         | logged at error, left unchanged |
//! | Other, out of scope     | not evaluated                   |
//!
//! # Example
//!
//! ```rust
//! use blockshift_migrate::{InMemoryStore, MigrationConfig, MigrationOrchestrator, MigrationPlan};
//! use blockshift_ops::Operation;
//! use blockshift_schema::BlockDef;
//! use blockshift_tree::BlockPath;
//! use serde_json::json;
//!
//! let schema = BlockDef::stream([("renamed1", BlockDef::leaf())]);
//! let store = InMemoryStore::new("BlockPage");
//! store.insert_record("1", json!([{"type": "char1", "id": "0001", "value": "Test"}]));
//!
//! let plan = MigrationPlan::single(
//!     Operation::rename_stream_children("char1", "renamed1"),
//!     BlockPath::root(),
//! );
//! let report = MigrationOrchestrator::new(MigrationConfig::default())
//!     .run(&store, &schema, &plan)
//!     .unwrap();
//!
//! assert_eq!(report.records_migrated, 1);
//! assert_eq!(store.content(&"1".into()).unwrap()[0]["type"], "renamed1");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod config;
mod error;
mod log;
mod memory;
mod orchestrator;
mod plan;
mod storage;

pub use config::{MigrationConfig, RevisionsFrom};
pub use error::MigrationError;
pub use log::{CapturingLog, LogLevel, LogRecord, MigrationLog, TracingLog, MIGRATE_TARGET};
pub use memory::InMemoryStore;
pub use orchestrator::{MigrationOrchestrator, MigrationReport, SnapshotRole};
pub use plan::{MigrationPlan, PlanStep};
pub use storage::{
    RecordHistory, RecordId, RecordStore, RecordUpdate, Snapshot, SnapshotId, StorageError,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
