use recordutils::{
    ConstructError, DeclarationError, EnumDef, ErrorNode, FieldInvalid, Kwargs, RecordDecl, RecordOptions, Registry,
    Value, construct_json, dump, dump_json, field,
};
use serde_json::json;

fn checked() -> RecordOptions {
    RecordOptions::checked()
}

fn kwargs(json: serde_json::Value) -> Kwargs {
    match Value::from(json) {
        Value::Map(entries) => entries.into_iter().map(|(k, v)| (k.text(), v)).collect(),
        other => panic!("not an object: {other}"),
    }
}

fn nested_registry() -> Registry {
    let mut registry = Registry::new();
    registry
        .declare_record(RecordDecl::new("C").options(checked()).field(field("c_value", "int")))
        .unwrap();
    registry
        .declare_record(
            RecordDecl::new("B")
                .options(checked())
                .field(field("b_value", "int"))
                .field(field("c", "C")),
        )
        .unwrap();
    registry
        .declare_record(
            RecordDecl::new("Outer")
                .options(RecordOptions { ignore_additional_properties: true, ..checked() })
                .field(field("a", "int"))
                .field(field("b", "List[B]"))
                .field(field("k", "List[int]")),
        )
        .unwrap();
    registry
}

#[test]
fn nested_list_with_per_element_failures() {
    let registry = nested_registry();
    let err = registry
        .construct(
            "Outer",
            kwargs(json!({
                "a": "2",
                "b": [
                    {"b_value": "1", "c": {"c_value": 1}},
                    {"b_value": "2", "c": {"c_value": "1"}}
                ],
                "k": [1, 2, "a"]
            })),
        )
        .unwrap_err();
    let ConstructError::Invalid(invalid) = err else { panic!("expected an aggregated error, got {err}") };
    assert_eq!(invalid.record(), "Outer");
    let tree = invalid.tree();

    assert_eq!(tree.get("a").and_then(ErrorNode::as_message), Some("'2' is of type 'str' instead of 'int'"));

    let b = tree.get("b").unwrap();
    let first = b.at(0).and_then(ErrorNode::as_tree).unwrap();
    assert!(first.contains("b_value"));
    let second = b.at(1).and_then(ErrorNode::as_tree).unwrap();
    let c = second.get("c").and_then(ErrorNode::as_tree).unwrap();
    assert_eq!(c.get("c_value").and_then(ErrorNode::as_message), Some("'1' is of type 'str' instead of 'int'"));

    assert_eq!(
        tree.get("k").and_then(|node| node.at(2)).and_then(ErrorNode::as_message),
        Some("'a' is of type 'str' instead of 'int'")
    );

    let paths: Vec<String> = tree.paths().into_iter().map(|(path, _)| path).collect();
    assert!(paths.contains(&"b[1].c.c_value".to_string()), "{paths:?}");
}

#[test]
fn valid_nested_input_builds_records() {
    let registry = nested_registry();
    let record = registry
        .construct(
            "Outer",
            kwargs(json!({"a": 1, "b": [{"b_value": 1, "c": {"c_value": 2}}], "k": [], "extra": "dropped"})),
        )
        .unwrap();
    let b = record.get("b").and_then(Value::as_list).unwrap();
    let inner = b[0].as_record().unwrap();
    assert_eq!(inner.type_name(), "B");
    assert_eq!(inner.get("c").and_then(Value::as_record).and_then(|c| c.get("c_value")), Some(&Value::Int(2)));
    assert_eq!(
        dump_json(&record),
        json!({"a": 1, "b": [{"b_value": 1, "c": {"c_value": 2}}], "k": []})
    );
}

#[test]
fn custom_validator_rejects_negative() {
    let mut registry = Registry::new();
    registry
        .declare_record(RecordDecl::new("Positive").options(checked()).field(field("a", "int").validator(|value| {
            match value.as_i64() {
                Some(n) if n < 0 => Err(FieldInvalid::new("The given integer is negative.")),
                _ => Ok(()),
            }
        })))
        .unwrap();
    assert!(registry.construct("Positive", kwargs(json!({"a": 1}))).is_ok());
    let err = registry.construct("Positive", kwargs(json!({"a": -1}))).unwrap_err();
    assert_eq!(
        err.tree().and_then(|tree| tree.get("a")).and_then(ErrorNode::as_message),
        Some("The given integer is negative.")
    );
}

#[test]
fn last_failing_validator_wins() {
    let mut registry = Registry::with_stock_validators();
    registry
        .declare_record(
            RecordDecl::new("Picky")
                .options(checked())
                .field(field("a", "int").named_validator("non_negative").named_validator("odd")),
        )
        .unwrap();
    let err = registry.construct("Picky", kwargs(json!({"a": -2}))).unwrap_err();
    assert_eq!(
        err.tree().and_then(|tree| tree.get("a")).and_then(ErrorNode::as_message),
        Some("The given integer is not an odd number.")
    );
}

#[test]
fn type_failures_skip_field_validators() {
    let mut registry = Registry::with_stock_validators();
    registry
        .declare_record(RecordDecl::new("Odd").options(checked()).field(field("a", "int").named_validator("odd")))
        .unwrap();
    let err = registry.construct("Odd", kwargs(json!({"a": "x"}))).unwrap_err();
    assert_eq!(
        err.tree().and_then(|tree| tree.get("a")).and_then(ErrorNode::as_message),
        Some("'x' is of type 'str' instead of 'int'")
    );
}

#[test]
fn enum_values_nest_into_members() {
    let mut registry = Registry::new();
    registry.declare_enum(EnumDef::new("MyCoolEnum", [("pepe", Value::from("frog"))])).unwrap();
    registry
        .declare_record(RecordDecl::new("CompositeClass").options(checked()).field(field("a", "MyCoolEnum")))
        .unwrap();
    let record = registry.construct("CompositeClass", kwargs(json!({"a": "frog"}))).unwrap();
    let member = record.get("a").and_then(Value::as_enum).unwrap();
    assert_eq!((member.enum_name(), member.name()), ("MyCoolEnum", "pepe"));
    assert_eq!(record.to_string(), "CompositeClass(a=MyCoolEnum.pepe)");

    let err = registry.construct("CompositeClass", kwargs(json!({"a": "cat"}))).unwrap_err();
    assert!(err.tree().unwrap().contains("a"));
}

#[test]
fn optional_fields_take_their_sentinel_and_are_not_dumped() {
    let mut registry = Registry::new();
    let base = registry
        .declare_record(
            RecordDecl::new("OptionalField")
                .options(checked())
                .field(field("a", "str").optional().default_optional_value("0"))
                .field(field("b", "str"))
                .field(field("a_typing", "Optional[str]")),
        )
        .unwrap();
    registry
        .declare_record(
            RecordDecl::new("OptionalInheritField")
                .extends(&base)
                .options(checked())
                .field(field("c", "str").default("a")),
        )
        .unwrap();

    let record = registry.construct("OptionalInheritField", kwargs(json!({"b": "test"}))).unwrap();
    assert_eq!(record.get("a"), Some(&Value::from("0")));
    assert_eq!(record.get("a_typing"), Some(&Value::None));
    let dumped = dump(&record);
    assert_eq!(dumped.keys().map(String::as_str).collect::<Vec<_>>(), ["b", "c"]);

    // a supplied value equal to the sentinel also counts as unset
    let record = registry.construct("OptionalField", kwargs(json!({"a": "0", "b": "x"}))).unwrap();
    assert!(!dump(&record).contains_key("a"));
}

#[test]
fn optional_record_field_accepts_empty_mapping() {
    let mut registry = Registry::new();
    registry
        .declare_record(RecordDecl::new("BasicOptional").options(checked()).field(field("b", "Optional[int]")))
        .unwrap();
    registry
        .declare_record(
            RecordDecl::new("BasicOptionalComposite")
                .options(checked())
                .field(field("a", "BasicOptional").optional()),
        )
        .unwrap();
    let record = registry.construct("BasicOptionalComposite", kwargs(json!({"a": {}}))).unwrap();
    assert_eq!(record.get("a").and_then(Value::as_record).and_then(|r| r.get("b")), Some(&Value::None));
    assert!(registry.construct("BasicOptionalComposite", Kwargs::new()).is_ok());
}

#[test]
fn optional_list_of_records_reports_bad_elements() {
    let mut registry = Registry::new();
    registry.declare_record(RecordDecl::new("A").options(checked()).field(field("a", "int"))).unwrap();
    registry
        .declare_record(RecordDecl::new("B").options(checked()).field(field("b", "Optional[List[A]]")))
        .unwrap();
    let err = registry.construct("B", kwargs(json!({"b": [{"a": 1}, 2, {"a": "3"}]}))).unwrap_err();
    let paths: Vec<String> = err.tree().unwrap().paths().into_iter().map(|(path, _)| path).collect();
    assert_eq!(paths, ["b[2].a"]);
    assert!(registry.construct("B", kwargs(json!({"b": [{"a": 1}]}))).is_ok());
    assert!(registry.construct("B", Kwargs::new()).is_ok());
}

#[test]
fn additional_properties_policy() {
    let mut registry = Registry::new();
    registry
        .declare_record(
            RecordDecl::new("Tolerant")
                .options(RecordOptions { ignore_additional_properties: true, ..checked() })
                .field(field("a", "int")),
        )
        .unwrap();
    registry.declare_record(RecordDecl::new("Intolerant").options(checked()).field(field("a", "int"))).unwrap();

    let record = registry.construct("Tolerant", kwargs(json!({"a": 1, "b": 2, "c": 3}))).unwrap();
    assert_eq!(record.get("a"), Some(&Value::Int(1)));
    let err = registry.construct("Intolerant", kwargs(json!({"a": 1, "b": 2}))).unwrap_err();
    assert!(matches!(err, ConstructError::UnexpectedField { .. }));
    assert!(err.tree().is_none());
}

#[test]
fn union_reports_one_mismatch() {
    let mut registry = Registry::new();
    let schema = registry
        .declare_record(RecordDecl::new("UnitedPepe").options(checked()).field(field("a", "Union[int, List]")))
        .unwrap();
    for ok in [json!(1), json!([1]), json!(["1"])] {
        assert!(construct_json(&schema, json!({"a": ok})).is_ok());
    }
    let err = construct_json(&schema, json!({"a": "1"})).unwrap_err();
    let tree = err.tree().unwrap();
    assert_eq!(tree.paths().len(), 1);
    assert_eq!(tree.get("a").and_then(ErrorNode::as_message), Some("'1' is of type 'str' instead of 'Union[int, List]'"));
}

#[test]
fn union_of_records_picks_the_matching_shape() {
    let mut registry = Registry::new();
    registry.declare_record(RecordDecl::new("A").options(checked()).field(field("x", "int"))).unwrap();
    registry.declare_record(RecordDecl::new("B").options(checked()).field(field("y", "int"))).unwrap();
    registry
        .declare_record(RecordDecl::new("H").options(checked()).field(field("v", "Union[A, B]")))
        .unwrap();

    let record = registry.construct("H", kwargs(json!({"v": {"y": 1}}))).unwrap();
    let v = record.get("v").and_then(Value::as_record).unwrap();
    assert_eq!(v.type_name(), "B");
    assert_eq!(dump_json(&record), json!({"v": {"y": 1}}));

    let record = registry.construct("H", kwargs(json!({"v": {"x": 1}}))).unwrap();
    assert_eq!(record.get("v").and_then(Value::as_record).map(|r| r.type_name()), Some("A"));

    let err = registry.construct("H", kwargs(json!({"v": {"y": "1"}}))).unwrap_err();
    let paths: Vec<String> = err.tree().unwrap().paths().into_iter().map(|(path, _)| path).collect();
    assert_eq!(paths, ["v.y"]);
}

#[test]
fn missing_required_field_is_immediate() {
    let registry = nested_registry();
    let err = registry.construct("Outer", kwargs(json!({"a": 1}))).unwrap_err();
    match err {
        ConstructError::MissingFields { record, fields } => {
            assert_eq!(record, "Outer");
            assert_eq!(fields, ["b", "k"]);
        }
        other => panic!("unexpected {other}"),
    }
}

#[test]
fn faulty_validator_blocks_the_type() {
    let mut registry = Registry::with_stock_validators();
    let err = registry
        .declare_record(RecordDecl::new("Faulty").field(field("a", "int").named_validator("STRING")))
        .unwrap_err();
    assert!(matches!(err, DeclarationError::FaultyValidators { .. }));
    assert!(matches!(registry.construct("Faulty", Kwargs::new()), Err(ConstructError::UnknownRecord(_))));
}

#[test]
fn frozen_records_reject_assignment() {
    let mut registry = Registry::new();
    registry
        .declare_record(
            RecordDecl::new("Frozen")
                .options(RecordOptions { frozen: true, ..checked() })
                .field(field("a", "int")),
        )
        .unwrap();
    let mut record = registry.construct("Frozen", kwargs(json!({"a": 1}))).unwrap();
    assert!(record.set("a", 2).is_err());
    assert!(record.hash_code().is_some());
}
