//! Records back to plain data.

use indexmap::IndexMap;

use crate::record::Record;
use crate::value::{Key, Value};

/// Field name to plain value. Unset optional fields are omitted, nested
/// records are dumped recursively and enum members become their value.
pub fn dump(record: &Record) -> IndexMap<String, Value> {
    record
        .schema()
        .fields()
        .filter_map(|spec| {
            let value = record.get(&spec.name)?;
            (!spec.is_unset(value)).then(|| (spec.name.clone(), dump_value(value)))
        })
        .collect()
}

pub fn dump_value(value: &Value) -> Value {
    match value {
        Value::Record(record) => Value::Map(dump(record).into_iter().map(|(k, v)| (Key::Str(k), v)).collect()),
        Value::Enum(member) => dump_value(member.value()),
        Value::List(items) => Value::List(items.iter().map(dump_value).collect()),
        Value::Tuple(items) => Value::Tuple(items.iter().map(dump_value).collect()),
        Value::Set(items) => Value::Set(items.iter().map(dump_value).collect()),
        Value::Map(entries) => Value::Map(entries.iter().map(|(k, v)| (k.clone(), dump_value(v))).collect()),
        scalar => scalar.clone(),
    }
}

pub fn dump_json(record: &Record) -> serde_json::Value {
    serde_json::Value::Object(dump(record).into_iter().map(|(k, v)| (k, v.to_json())).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declare::{field, RecordDecl, Registry};
    use crate::enumeration::EnumDef;
    use crate::factory::construct_json;
    use crate::schema::RecordOptions;
    use serde_json::json;

    #[test]
    fn dump_drops_unset_optionals_and_unwraps_members() {
        let mut registry = Registry::new();
        registry.declare_enum(EnumDef::new("Frog", [("pepe", Value::from("frog"))])).unwrap();
        registry
            .declare_record(
                RecordDecl::new("Inner")
                    .options(RecordOptions::checked())
                    .field(field("kind", "Frog"))
                    .field(field("note", "Optional[str]")),
            )
            .unwrap();
        let schema = registry
            .declare_record(
                RecordDecl::new("Outer")
                    .options(RecordOptions::checked())
                    .field(field("items", "List[Inner]"))
                    .field(field("zero", "str").optional().default_optional_value("0"))
                    .field(field("maybe", "Optional[int]").default(Value::None)),
            )
            .unwrap();
        let record = construct_json(&schema, json!({"items": [{"kind": "frog"}, {"kind": "frog", "note": "hi"}]})).unwrap();
        assert_eq!(
            dump_json(&record),
            json!({
                "items": [{"kind": "frog"}, {"kind": "frog", "note": "hi"}]
            })
        );
        // a None default on an Optional[...] field is its sentinel too
        assert_eq!(record.get("maybe"), Some(&Value::None));
        assert_eq!(dump(&record).get("items").and_then(Value::as_list).map(<[Value]>::len), Some(2));
    }
}
