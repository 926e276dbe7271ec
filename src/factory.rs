//! The construction pipeline.
//!
//! `construct` moves one keyword mapping through a fixed sequence:
//! drop additional properties (when allowed), fill optional sentinels, assign
//! fields, nest, validate types, run field validators, and finally either
//! fail with the aggregated error tree or run the post-construction hook.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::error::{AggregatedValidationError, ConstructError};
use crate::error_tree::ErrorTree;
use crate::field_validation::run_validators;
use crate::nesting::nest;
use crate::record::Record;
use crate::schema::RecordSchema;
use crate::type_walker::validate_types;
use crate::value::{Key, Kwargs, Value};

pub fn construct(schema: &Arc<RecordSchema>, kwargs: Kwargs) -> Result<Record, ConstructError> {
    let options = schema.options();
    let kwargs = prepare(schema, kwargs);
    let mut record = Record::assign(schema, kwargs)?;

    let mut errors = if options.nest { nest(&mut record)? } else { ErrorTree::new() };
    if options.validate {
        validate_types(&record, &mut errors);
        run_validators(&record, &mut errors);
    }
    if !errors.is_empty() {
        debug!(record = schema.name(), failed_fields = errors.len(), "construction rejected");
        return Err(AggregatedValidationError::new(schema.name(), errors).into());
    }

    if let Some(hook) = schema.post_construct() {
        hook(&mut record).map_err(|source| ConstructError::PostConstruct {
            record: schema.name().to_string(),
            source,
        })?;
    }
    trace!(record = %record, "constructed");
    Ok(record)
}

/// Construct from a decoded JSON object.
pub fn construct_json(schema: &Arc<RecordSchema>, json: serde_json::Value) -> Result<Record, ConstructError> {
    match Value::from(json) {
        Value::Map(entries) => construct(schema, into_kwargs(schema.name(), entries)?),
        other => Err(ConstructError::NotAMapping {
            record: schema.name().to_string(),
            found: other.type_name().to_string(),
        }),
    }
}

/// Keyword mapping from a raw mapping; every key must be a string.
pub(crate) fn into_kwargs(record: &str, entries: IndexMap<Key, Value>) -> Result<Kwargs, ConstructError> {
    entries
        .into_iter()
        .map(|(key, value)| match key {
            Key::Str(name) => Ok((name, value)),
            other => Err(ConstructError::NonStringKey { record: record.to_string(), key: other.to_string() }),
        })
        .collect()
}

/// Keyword pre-processing ahead of assignment: drop unknown keywords when the
/// type ignores additional properties, then give every omitted optional field
/// without a default its sentinel.
pub(crate) fn prepare(schema: &RecordSchema, mut kwargs: Kwargs) -> Kwargs {
    if schema.options().ignore_additional_properties {
        kwargs.retain(|key, _| {
            let known = schema.field(key).is_some();
            if !known {
                debug!(record = schema.name(), keyword = key.as_str(), "dropping additional property");
            }
            known
        });
    }
    for spec in schema.fields().filter(|spec| spec.optional && spec.default.is_none()) {
        if !kwargs.contains_key(&spec.name) {
            kwargs.insert(spec.name.clone(), spec.default_optional_value.clone());
        }
    }
    kwargs
}
