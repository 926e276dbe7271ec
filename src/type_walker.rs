//! Checking field values against their declared types.
//!
//! The walker descends through lists, mappings and sums and collects every
//! value that does not fit. Mismatches inside a list field are reported at
//! the index of the first equal element; when no element compares equal the
//! position is reported as not retrievable.

use std::borrow::Cow;

use tracing::{debug, warn};

use crate::descriptor::TypeDescriptor;
use crate::error_tree::{ErrorNode, ErrorTree};
use crate::record::Record;
use crate::value::Value;

struct Mismatch<'a> {
    value: Cow<'a, Value>,
    expected: &'a TypeDescriptor,
}

impl<'a> Mismatch<'a> {
    fn at(value: &'a Value, expected: &'a TypeDescriptor) -> Self {
        Self { value: Cow::Borrowed(value), expected }
    }

    fn message(&self) -> String {
        format!("{} is of type '{}' instead of '{}'", self.value, self.value.type_name(), self.expected)
    }
}

/// Type-check every field not already present in `errors`. Unset optional
/// fields are not checked.
pub fn validate_types(record: &Record, errors: &mut ErrorTree) {
    for spec in record.schema().fields() {
        if errors.contains(&spec.name) {
            continue;
        }
        let Some(value) = record.get(&spec.name) else { continue };
        if spec.is_unset(value) {
            continue;
        }
        let mut found = Vec::new();
        walk(value, &spec.ty, &mut found);
        for mismatch in found {
            report(&spec.name, value, mismatch, errors);
        }
    }
}

/// True when `value` fits `ty` entirely.
pub fn conforms(value: &Value, ty: &TypeDescriptor) -> bool {
    let mut found = Vec::new();
    walk(value, ty, &mut found);
    found.is_empty()
}

fn walk<'a>(value: &'a Value, ty: &'a TypeDescriptor, found: &mut Vec<Mismatch<'a>>) {
    match ty {
        TypeDescriptor::Leaf(leaf) => {
            if !leaf.admits(value) {
                found.push(Mismatch::at(value, ty));
            }
        }
        TypeDescriptor::EnumType(def) => {
            if !matches!(value, Value::Enum(member) if member.belongs_to(def)) {
                found.push(Mismatch::at(value, ty));
            }
        }
        TypeDescriptor::RecordType(schema) => {
            if !schema.options().validate {
                debug!(record = schema.name(), "nested type does not validate, checking its type only");
            }
            if !matches!(value, Value::Record(record) if record.type_name() == schema.name()) {
                found.push(Mismatch::at(value, ty));
            }
        }
        TypeDescriptor::ListOf(element) => match value {
            Value::List(items) => {
                for item in items {
                    walk(item, element, found);
                }
            }
            _ => found.push(Mismatch::at(value, ty)),
        },
        TypeDescriptor::MappingOf { key, value: value_ty } => match value {
            Value::Map(entries) => {
                for (k, v) in entries {
                    let key_value = k.to_value();
                    if !conforms(&key_value, key) {
                        found.push(Mismatch { value: Cow::Owned(key_value), expected: key });
                    }
                    walk(v, value_ty, found);
                }
            }
            _ => found.push(Mismatch::at(value, ty)),
        },
        TypeDescriptor::SumType(variants) => {
            if !variants.iter().any(|variant| conforms(value, variant)) {
                found.push(Mismatch::at(value, ty));
            }
        }
        TypeDescriptor::SetOf(_) | TypeDescriptor::Unconstrained => {}
        TypeDescriptor::Unsupported(shape) => {
            debug!(%shape, "type validation not supported for this shape");
        }
    }
}

fn report(field: &str, field_value: &Value, mismatch: Mismatch<'_>, errors: &mut ErrorTree) {
    let message = mismatch.message();
    let Value::List(items) = field_value else {
        errors.insert_message(field, message);
        return;
    };
    match items.iter().position(|item| *item == *mismatch.value) {
        Some(index) => errors.insert_indexed(field, index, ErrorNode::Message(message)),
        None => {
            warn!(field, value = %mismatch.value, "position of mismatching value is not retrievable");
            errors.insert_message(field, format!("{message} in a non retrievable position"));
        }
    }
}
