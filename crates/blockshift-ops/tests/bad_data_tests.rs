use blockshift_ops::{apply_changes_to_raw_data, Operation, TransformError};
use blockshift_test_utils::{bad_raw_data, sample_schema, valid_page_content};
use pretty_assertions::assert_eq;

#[test]
fn test_rename_invalid_stream_child() {
    let err = apply_changes_to_raw_data(
        &bad_raw_data(),
        "invalid_name1",
        &Operation::rename_struct_children("char1", "renamed1"),
        &sample_schema(),
    )
    .unwrap_err();

    assert!(err.is_invalid_block_def());
    assert_eq!(err.to_string(), "No current block def named invalid_name1");
}

#[test]
fn test_rename_invalid_struct_child() {
    let err = apply_changes_to_raw_data(
        &bad_raw_data(),
        "nestedstruct.invalid_name2",
        &Operation::rename_stream_children("char1", "renamed1"),
        &sample_schema(),
    )
    .unwrap_err();

    assert_eq!(err.to_string(), "No current block def named invalid_name2");
    let TransformError::InvalidBlockDef(inner) = err else {
        panic!("expected an invalid block def");
    };
    assert_eq!(inner.position().to_string(), "nestedstruct");
    assert!(inner.on_path());
}

#[test]
fn test_invalid_path_on_valid_data_is_noop() {
    let raw = valid_page_content();
    let out = apply_changes_to_raw_data(
        &raw,
        "invalid_name1",
        &Operation::rename_struct_children("char1", "renamed1"),
        &sample_schema(),
    )
    .unwrap();

    assert_eq!(out, raw);
}

#[test]
fn test_failure_leaves_input_untouched() {
    let raw = bad_raw_data();
    let before = raw.clone();
    let _ = apply_changes_to_raw_data(
        &raw,
        "invalid_name1",
        &Operation::rename_struct_children("char1", "renamed1"),
        &sample_schema(),
    );
    assert_eq!(raw, before);
}
