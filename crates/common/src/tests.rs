use super::*;
use std::io;
use types::DataType;

#[test]
fn config_defaults_are_sane() {
    let cfg = EngineConfig::default();
    assert_eq!(cfg.data_dir, PathBuf::from("./db_data"));
    assert_eq!(cfg.num_buffers, 4);
}

#[test]
fn engine_error_formats_cleanly() {
    let err = EngineError::Decode("bad tag".into());
    assert!(format!("{err}").contains("bad tag"));
}

#[test]
fn io_error_converts() {
    let e = io::Error::other("oops");
    let engine_err: EngineError = e.into();
    assert!(matches!(engine_err, EngineError::Io(_)));
}

#[test]
fn table_schema_rejects_empty_and_overlong_field_lists() {
    assert!(TableSchema::new(vec![]).is_err());

    let too_many: Vec<FieldSpec> = (0..MAX_FIELDS_PER_TABLE + 1)
        .map(|i| FieldSpec::new(format!("f{i}"), DataType::Integer).unwrap())
        .collect();
    assert!(TableSchema::new(too_many).is_err());
}

#[test]
fn field_spec_rejects_bad_names() {
    assert!(FieldSpec::new("", DataType::Integer).is_err());
    let long_name = "x".repeat(MAX_FIELD_NAME);
    assert!(FieldSpec::new(long_name, DataType::Integer).is_err());
}

#[test]
fn table_schema_looks_up_fields_by_name() {
    let schema = TableSchema::new(vec![
        FieldSpec::new("id", DataType::Integer).unwrap(),
        FieldSpec::new("name", DataType::String).unwrap(),
    ])
    .unwrap();

    assert_eq!(schema.field_index("name"), Some(1));
    assert_eq!(schema.field_index("missing"), None);
    assert_eq!(schema.field("id").unwrap().data_type, DataType::Integer);
}

#[test]
fn result_set_accumulates_records() {
    let mut rs = ResultSet::new();
    assert!(rs.is_empty());
    rs.push(Record::new(vec![FieldValue {
        name: "id".into(),
        value: Value::Int(1),
    }]));
    assert_eq!(rs.count(), 1);
}

#[test]
fn compare_op_holds_matches_ordering() {
    use std::cmp::Ordering::*;
    assert!(CompareOp::Eq.holds(Equal));
    assert!(!CompareOp::Eq.holds(Less));
    assert!(CompareOp::Ge.holds(Equal));
    assert!(CompareOp::Ge.holds(Greater));
    assert!(!CompareOp::Ge.holds(Less));
    assert!(CompareOp::Ne.holds(Less));
    assert!(!CompareOp::Ne.holds(Equal));
}

#[test]
fn field_list_all_is_empty() {
    let all = FieldList::all();
    assert!(all.is_all());

    let projected: FieldList = vec!["a".into(), "b".into()].into();
    assert!(!projected.is_all());
}
