use blockshift_ops::{apply_changes, apply_changes_to_raw_data, Operation};
use blockshift_test_utils::{
    assert_blocks_renamed, block_with_id, nestedstruct_value, sample_contents, sample_schema,
};
use blockshift_tree::BlockPath;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{json, Value};

fn rename_char1() -> Operation {
    Operation::rename_stream_children("char1", "renamed1")
}

#[test]
fn test_rename_at_root() {
    let schema = sample_schema();
    for content in sample_contents() {
        let out = apply_changes_to_raw_data(&content, "", &rename_char1(), &schema).unwrap();
        assert_blocks_renamed(&content, &out, true);
    }
}

#[test]
fn test_rename_inside_nested_stream_keeps_siblings() {
    let raw = json!([
        block_with_id("char1", "a", json!("top")),
        block_with_id(
            "nestedstream",
            "b",
            json!([
                block_with_id("char1", "b1", json!("x")),
                block_with_id("list1", "b2", json!(["y"])),
            ]),
        ),
    ]);

    let out =
        apply_changes_to_raw_data(&raw, "nestedstream", &rename_char1(), &sample_schema()).unwrap();

    assert_eq!(out[0], raw[0]);
    assert_eq!(out[1]["id"], "b");
    assert_eq!(out[1]["value"][0]["type"], "renamed1");
    assert_eq!(out[1]["value"][0]["id"], "b1");
    assert_eq!(out[1]["value"][1], raw[1]["value"][1]);
}

#[test]
fn test_rename_inside_struct_stream() {
    let mut value = nestedstruct_value();
    value["stream1"] = json!([block_with_id("char1", "s1", json!("x"))]);
    let raw = json!([block_with_id("nestedstruct", "n", value)]);

    let out = apply_changes_to_raw_data(
        &raw,
        "nestedstruct.stream1",
        &rename_char1(),
        &sample_schema(),
    )
    .unwrap();

    assert_eq!(out[0]["value"]["stream1"][0]["type"], "renamed1");
    assert_eq!(out[0]["value"]["struct1"], raw[0]["value"]["struct1"]);
}

#[test]
fn test_list_of_streams() {
    let raw = json!([block_with_id(
        "nestedlist_stream",
        "l",
        json!([
            {"type": "item", "id": "i1", "value": [block_with_id("char1", "c1", json!("x"))]},
            {"type": "item", "id": "i2", "value": [block_with_id("char2", "c2", json!("y"))]},
        ]),
    )]);

    let out = apply_changes_to_raw_data(
        &raw,
        "nestedlist_stream.item",
        &rename_char1(),
        &sample_schema(),
    )
    .unwrap();

    assert_eq!(out[0]["value"][0]["id"], "i1");
    assert_eq!(out[0]["value"][0]["value"][0]["type"], "renamed1");
    assert_eq!(out[0]["value"][1], raw[0]["value"][1]);
}

#[test]
fn test_stream_children_to_list_at_root() {
    let raw = json!([
        block_with_id("char1", "1", json!("a")),
        block_with_id("char2", "2", json!("b")),
        block_with_id("char1", "3", json!("c")),
    ]);

    let out = apply_changes_to_raw_data(
        &raw,
        "",
        &Operation::stream_children_to_list("char1", "simplelist"),
        &sample_schema(),
    )
    .unwrap();

    let children = out.as_array().unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0], raw[1]);
    assert_eq!(children[1]["type"], "simplelist");
    let items: Vec<&Value> = children[1]["value"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| &item["value"])
        .collect();
    assert_eq!(items, vec![&json!("a"), &json!("c")]);
}

fn arb_stream() -> impl Strategy<Value = Value> {
    prop::collection::vec(
        (prop::sample::select(vec!["char1", "char2"]), "[a-z]{0,8}"),
        0..12,
    )
    .prop_map(|children| {
        Value::Array(
            children
                .into_iter()
                .enumerate()
                .map(|(i, (kind, text))| block_with_id(kind, &i.to_string(), json!(text)))
                .collect(),
        )
    })
}

proptest! {
    #[test]
    fn prop_rename_is_idempotent(raw in arb_stream()) {
        let schema = sample_schema();
        let root = BlockPath::root();
        let once = apply_changes(raw.clone(), &root, &rename_char1(), &schema).unwrap();
        let twice = apply_changes(once.clone(), &root, &rename_char1(), &schema).unwrap();
        prop_assert_eq!(&once, &twice);
    }

    #[test]
    fn prop_rename_preserves_ids_and_order(raw in arb_stream()) {
        let schema = sample_schema();
        let out = apply_changes(raw.clone(), &BlockPath::root(), &rename_char1(), &schema).unwrap();
        let ids = |v: &Value| {
            v.as_array().unwrap().iter().map(|b| b["id"].clone()).collect::<Vec<_>>()
        };
        prop_assert_eq!(ids(&raw), ids(&out));
        prop_assert!(out.as_array().unwrap().iter().all(|b| b["type"] != "char1"));
    }
}
