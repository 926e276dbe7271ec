//! Converting raw field values into nested records and enum members, in place.
//!
//! Nesting walks a record's fields against their descriptors. Mapping
//! literals under a record-typed position become records of that type
//! (constructed through the full pipeline, recursively); raw values under an
//! enum-typed position become the member with that value. Nested validation
//! failures are folded into the caller's error tree instead of aborting.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::descriptor::TypeDescriptor;
use crate::enumeration::{EnumDef, EnumMember};
use crate::error::ConstructError;
use crate::error_tree::{ErrorNode, ErrorTree};
use crate::factory;
use crate::record::Record;
use crate::schema::RecordSchema;
use crate::value::Value;

enum Outcome {
    Untouched,
    Converted,
    Failed(ErrorNode),
}

/// Nest every field of `record`. Returns the nesting failures keyed by
/// field; errors other than aggregated validation errors propagate.
pub fn nest(record: &mut Record) -> Result<ErrorTree, ConstructError> {
    let schema = Arc::clone(record.schema());
    let mut errors = ErrorTree::new();
    for spec in schema.fields() {
        let Some(slot) = record.slot_mut(&spec.name) else { continue };
        if let Outcome::Failed(node) = pack(slot, &spec.ty)? {
            errors.insert(spec.name.clone(), node);
        }
    }
    Ok(errors)
}

fn pack(slot: &mut Value, ty: &TypeDescriptor) -> Result<Outcome, ConstructError> {
    match ty {
        TypeDescriptor::RecordType(schema) => pack_record(slot, schema),
        TypeDescriptor::EnumType(def) => Ok(pack_enum(slot, def)),
        TypeDescriptor::ListOf(element) => pack_list(slot, element),
        TypeDescriptor::MappingOf { value, .. } => pack_mapping(slot, value),
        TypeDescriptor::SumType(variants) => pack_sum(slot, variants),
        TypeDescriptor::SetOf(_) => {
            debug!(shape = %ty, "halting nesting at set, members must stay hashable");
            Ok(Outcome::Untouched)
        }
        TypeDescriptor::Unsupported(shape) => {
            debug!(%shape, "nesting not supported for this shape");
            Ok(Outcome::Untouched)
        }
        TypeDescriptor::Leaf(_) | TypeDescriptor::Unconstrained => Ok(Outcome::Untouched),
    }
}

fn pack_record(slot: &mut Value, schema: &Arc<RecordSchema>) -> Result<Outcome, ConstructError> {
    let Value::Map(entries) = slot else {
        return Ok(Outcome::Untouched);
    };
    if !schema.options().nest {
        debug!(record = schema.name(), "target type does not nest, leaving mapping in place");
        return Ok(Outcome::Untouched);
    }
    let kwargs = factory::into_kwargs(schema.name(), entries.clone())?;
    match factory::construct(schema, kwargs) {
        Ok(nested) => {
            *slot = Value::Record(nested);
            Ok(Outcome::Converted)
        }
        Err(ConstructError::Invalid(err)) => Ok(Outcome::Failed(ErrorNode::Nested(err.into_tree()))),
        Err(other) => Err(other),
    }
}

fn pack_enum(slot: &mut Value, def: &Arc<EnumDef>) -> Outcome {
    if matches!(slot, Value::Enum(member) if member.belongs_to(def)) {
        return Outcome::Untouched;
    }
    match EnumMember::by_value(def, slot) {
        Some(member) => {
            *slot = Value::Enum(member);
            Outcome::Converted
        }
        None => {
            debug!(enumeration = def.name(), value = %slot, "no member holds this value");
            Outcome::Untouched
        }
    }
}

fn pack_list(slot: &mut Value, element: &TypeDescriptor) -> Result<Outcome, ConstructError> {
    if *element == TypeDescriptor::Unconstrained {
        return Ok(Outcome::Untouched);
    }
    let Value::List(items) = slot else {
        debug!(value = %slot, "expected a list, nothing to nest");
        return Ok(Outcome::Untouched);
    };
    let mut failures = BTreeMap::new();
    let mut converted = false;
    for (index, item) in items.iter_mut().enumerate() {
        match pack(item, element)? {
            Outcome::Converted => converted = true,
            Outcome::Failed(node) => {
                failures.insert(index, node);
            }
            Outcome::Untouched => {}
        }
    }
    Ok(if !failures.is_empty() {
        Outcome::Failed(ErrorNode::Indexed(failures))
    } else if converted {
        Outcome::Converted
    } else {
        Outcome::Untouched
    })
}

fn pack_mapping(slot: &mut Value, value_ty: &TypeDescriptor) -> Result<Outcome, ConstructError> {
    if *value_ty == TypeDescriptor::Unconstrained {
        return Ok(Outcome::Untouched);
    }
    let Value::Map(entries) = slot else {
        debug!(value = %slot, "expected a mapping, nothing to nest");
        return Ok(Outcome::Untouched);
    };
    let mut failures = ErrorTree::new();
    let mut converted = false;
    for (key, item) in entries.iter_mut() {
        match pack(item, value_ty)? {
            Outcome::Converted => converted = true,
            Outcome::Failed(node) => failures.insert(key.text(), node),
            Outcome::Untouched => {}
        }
    }
    Ok(if !failures.is_empty() {
        Outcome::Failed(ErrorNode::Nested(failures))
    } else if converted {
        Outcome::Converted
    } else {
        Outcome::Untouched
    })
}

/// Try every variant on a copy of the value; the first one that converts is
/// committed. Otherwise the last aggregated failure is reported, and a
/// structural error only surfaces when no variant produced one.
fn pack_sum(slot: &mut Value, variants: &[TypeDescriptor]) -> Result<Outcome, ConstructError> {
    let mut failure = None;
    let mut structural = None;
    for variant in variants {
        let mut candidate = slot.clone();
        match pack(&mut candidate, variant) {
            Ok(Outcome::Converted) => {
                *slot = candidate;
                return Ok(Outcome::Converted);
            }
            Ok(Outcome::Failed(node)) => failure = Some(node),
            Ok(Outcome::Untouched) => {}
            Err(error) => {
                debug!(variant = %variant, %error, "variant rejected the value");
                structural = Some(error);
            }
        }
    }
    match (failure, structural) {
        (Some(node), _) => Ok(Outcome::Failed(node)),
        (None, Some(error)) => Err(error),
        (None, None) => Ok(Outcome::Untouched),
    }
}
