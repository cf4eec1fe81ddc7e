//! Testing utilities for the blockshift workspace
//!
//! Shared fixtures: a sample stream field schema, raw tree builders and
//! stores seeded with records and snapshot histories.

#![allow(missing_docs)]

use blockshift_migrate::{InMemoryStore, RecordId, SnapshotId};
use blockshift_schema::{BlockDef, StreamFieldSchema};
use blockshift_tree::{RawNode, RawTree};
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};

/// Record kind used by seeded stores
pub const SAMPLE_KIND: &str = "SamplePage";

/// Snapshot payload field used by seeded stores
pub const CONTENT_FIELD: &str = "content";

/// Install a `tracing` subscriber honouring `RUST_LOG`; safe to call twice
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn simple_struct() -> BlockDef {
    BlockDef::structure([("char1", BlockDef::leaf()), ("char2", BlockDef::leaf())])
}

fn simple_stream() -> BlockDef {
    BlockDef::stream([("char1", BlockDef::leaf()), ("char2", BlockDef::leaf())])
}

/// Root definition of the sample stream field
#[must_use]
pub fn sample_block_def() -> BlockDef {
    BlockDef::stream([
        ("char1", BlockDef::leaf()),
        ("char2", BlockDef::leaf()),
        ("simplestruct", simple_struct()),
        (
            "nestedstruct",
            BlockDef::structure([
                ("char1", BlockDef::leaf()),
                ("char2", BlockDef::leaf()),
                ("struct1", simple_struct()),
                ("stream1", simple_stream()),
                ("list1", BlockDef::list(BlockDef::leaf())),
            ]),
        ),
        ("simplestream", simple_stream()),
        (
            "nestedstream",
            BlockDef::stream([
                ("char1", BlockDef::leaf()),
                ("stream1", simple_stream()),
                ("struct1", simple_struct()),
                ("list1", BlockDef::list(BlockDef::leaf())),
            ]),
        ),
        ("simplelist", BlockDef::list(BlockDef::leaf())),
        ("nestedlist_struct", BlockDef::list(simple_struct())),
        ("nestedlist_stream", BlockDef::list(simple_stream())),
    ])
}

/// The sample stream field schema
///
/// # Panics
/// Never: the sample root is a stream
#[must_use]
pub fn sample_schema() -> StreamFieldSchema {
    StreamFieldSchema::new(sample_block_def()).expect("sample root is a stream")
}

/// Stream child with a fresh id
#[must_use]
pub fn block(block_type: &str, value: Value) -> Value {
    RawNode::with_generated_id(block_type, value).into_value()
}

/// Stream child with a fixed id
#[must_use]
pub fn block_with_id(block_type: &str, id: &str, value: Value) -> Value {
    RawNode::new(block_type, id, value).into_value()
}

/// Default value of a `nestedstruct` block
#[must_use]
pub fn nestedstruct_value() -> Value {
    json!({
        "char1": "",
        "char2": "",
        "struct1": {"char1": "", "char2": ""},
        "stream1": [],
        "list1": [],
    })
}

/// Contents of the three sample records: a mix of `char1` and `char2` blocks
#[must_use]
pub fn sample_contents() -> Vec<RawTree> {
    vec![
        json!([
            block("char1", json!("Test char 1")),
            block("char1", json!("Test char 2")),
            block("char2", json!("Test char 3")),
            block("char2", json!("Test char 4")),
        ]),
        json!([
            block("char1", json!("Test char 1")),
            block("char1", json!("Test char 2")),
            block("char2", json!("Test char 3")),
        ]),
        json!([
            block("char2", json!("Test char 1")),
            block("char2", json!("Test char 2")),
            block("char2", json!("Test char 3")),
        ]),
    ]
}

/// A `char1` block followed by a default `nestedstruct` block
///
/// Ids are fixed so that repeated calls compare equal.
#[must_use]
pub fn valid_page_content() -> RawTree {
    json!([
        block_with_id("char1", "page-0", json!("Char Block 1")),
        block_with_id("nestedstruct", "page-1", nestedstruct_value()),
    ])
}

/// Two `invalid_name1` blocks, unknown to the sample schema
#[must_use]
pub fn invalid_blocks() -> Vec<Value> {
    vec![
        block_with_id("invalid_name1", "0001", json!({"char1": "foo", "char2": "foo"})),
        block_with_id("invalid_name1", "0002", json!({"char1": "foo", "char2": "foo"})),
    ]
}

/// [`valid_page_content`] with [`invalid_blocks`] appended
#[must_use]
pub fn invalid_page_content() -> RawTree {
    let mut content = valid_page_content();
    if let Value::Array(children) = &mut content {
        children.extend(invalid_blocks());
    }
    content
}

/// [`invalid_page_content`] whose `nestedstruct` also holds an unknown
/// `invalid_name2` field
#[must_use]
pub fn bad_raw_data() -> RawTree {
    let mut content = invalid_page_content();
    content[1]["value"]["invalid_name2"] =
        json!([block_with_id("char1", "0003", json!("foo"))]);
    content
}

/// Fixed reference instant for snapshot timestamps
#[must_use]
pub fn reference_now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-06-15T12:00:00Z")
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_default()
}

/// `days` before [`reference_now`]
#[must_use]
pub fn days_ago(days: i64) -> DateTime<Utc> {
    reference_now() - Duration::days(days)
}

/// Seeded record with its snapshot ids, oldest first
#[derive(Debug, Clone)]
pub struct SeededRecord {
    pub id: RecordId,
    pub content: RawTree,
    pub snapshots: Vec<SnapshotId>,
}

/// Store holding `contents` as records `1..=n`
///
/// With `with_history`, each record gets five snapshots of its content
/// created 5, 4, 3, 2 and 1 days before [`reference_now`]; the second one
/// (4 days ago) is live and the last one is latest.
///
/// # Errors
/// Storage failures while seeding
pub fn seeded_store(
    contents: Vec<RawTree>,
    with_history: bool,
) -> anyhow::Result<(InMemoryStore, Vec<SeededRecord>)> {
    let store = InMemoryStore::new(SAMPLE_KIND);
    let mut records = Vec::with_capacity(contents.len());

    for (index, content) in contents.into_iter().enumerate() {
        let id = RecordId::new((index + 1).to_string());
        store.insert_record(id.clone(), content.clone());

        let mut snapshots = Vec::new();
        if with_history {
            for i in 0..5 {
                let snapshot = store.save_snapshot(&id, days_ago(5 - i), CONTENT_FIELD, &content)?;
                if i == 1 {
                    store.set_live(&id, snapshot)?;
                }
                snapshots.push(snapshot);
            }
        }
        records.push(SeededRecord {
            id,
            content,
            snapshots,
        });
    }
    Ok((store, records))
}

/// Store with a single page record holding [`valid_page_content`]
#[must_use]
pub fn page_store() -> (InMemoryStore, RecordId) {
    let store = InMemoryStore::new(SAMPLE_KIND);
    let id = RecordId::new("1");
    store.insert_record(id.clone(), valid_page_content());
    (store, id)
}

/// Assert that `char1` blocks became `renamed1` (when `is_altered`) and
/// that ids and all other types are unchanged
///
/// # Panics
/// On any mismatch
pub fn assert_blocks_renamed(old_content: &Value, new_content: &Value, is_altered: bool) {
    let (Some(old), Some(new)) = (old_content.as_array(), new_content.as_array()) else {
        panic!("stream contents must be arrays: {old_content} / {new_content}");
    };
    assert_eq!(old.len(), new.len(), "block count changed");

    for (old_block, new_block) in old.iter().zip(new) {
        assert_eq!(old_block["id"], new_block["id"]);
        if is_altered && old_block["type"] == "char1" {
            assert_eq!(new_block["type"], "renamed1");
        } else {
            assert_eq!(old_block["type"], new_block["type"]);
        }
    }
}
