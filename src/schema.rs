//! Declared record types: per-field metadata and type-level options.
//!
//! Schemas are built once by [`crate::Registry::declare_record`] and shared
//! behind an `Arc` by every record instance of that type.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::descriptor::TypeDescriptor;
use crate::field_validation::Validator;
use crate::record::Record;
use crate::value::Value;

pub type DefaultFactory = Arc<dyn Fn() -> Value + Send + Sync>;

/// Runs once after a successful construction.
pub type PostConstructHook = Arc<dyn Fn(&mut Record) -> anyhow::Result<()> + Send + Sync>;

/// Type-level switches. Defaults: `init`, `repr` and `eq` on; everything
/// else off, so a record type neither nests nor validates unless asked to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordOptions {
    pub init: bool,
    pub repr: bool,
    pub eq: bool,
    pub order: bool,
    pub unsafe_hash: bool,
    pub frozen: bool,
    /// Convert mapping literals in record-typed fields into nested records.
    pub nest: bool,
    /// Run type validation and field validators after nesting.
    pub validate: bool,
    /// Drop unknown keywords instead of rejecting them.
    pub ignore_additional_properties: bool,
}

impl Default for RecordOptions {
    fn default() -> Self {
        Self {
            init: true,
            repr: true,
            eq: true,
            order: false,
            unsafe_hash: false,
            frozen: false,
            nest: false,
            validate: false,
            ignore_additional_properties: false,
        }
    }
}

impl RecordOptions {
    /// Defaults with nesting and validation switched on.
    pub fn checked() -> Self {
        Self { nest: true, validate: true, ..Self::default() }
    }
}

#[derive(Clone)]
pub struct FieldSpec {
    pub name: String,
    pub ty: TypeDescriptor,
    pub default: Option<Value>,
    pub default_factory: Option<DefaultFactory>,
    pub init: bool,
    pub repr: bool,
    /// `None` follows `compare`.
    pub hash: Option<bool>,
    pub compare: bool,
    pub metadata: serde_json::Value,
    pub optional: bool,
    /// Sentinel stored when an optional field is not supplied.
    pub default_optional_value: Value,
    pub validators: Vec<Validator>,
}

impl FieldSpec {
    pub fn has_default(&self) -> bool {
        self.default.is_some() || self.default_factory.is_some()
    }

    pub fn default_value(&self) -> Option<Value> {
        match (&self.default, &self.default_factory) {
            (Some(value), _) => Some(value.clone()),
            (None, Some(factory)) => Some(factory()),
            (None, None) => None,
        }
    }

    /// True when `value` is this optional field's sentinel.
    pub fn is_unset(&self, value: &Value) -> bool {
        self.optional && *value == self.default_optional_value
    }

    pub fn hashed(&self) -> bool { self.hash.unwrap_or(self.compare) }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("ty", &self.ty.to_string())
            .field("default", &self.default)
            .field("default_factory", &self.default_factory.is_some())
            .field("init", &self.init)
            .field("optional", &self.optional)
            .field("default_optional_value", &self.default_optional_value)
            .field("validators", &self.validators.len())
            .finish_non_exhaustive()
    }
}

pub struct RecordSchema {
    name: String,
    fields: IndexMap<String, FieldSpec>,
    options: RecordOptions,
    post_construct: Option<PostConstructHook>,
}

impl RecordSchema {
    pub(crate) fn new(
        name: String,
        fields: IndexMap<String, FieldSpec>,
        options: RecordOptions,
        post_construct: Option<PostConstructHook>,
    ) -> Self {
        Self { name, fields, options, post_construct }
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn options(&self) -> &RecordOptions { &self.options }

    /// Fields in declaration order, inherited fields first.
    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> { self.fields.values() }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> { self.fields.get(name) }

    pub fn len(&self) -> usize { self.fields.len() }

    pub fn is_empty(&self) -> bool { self.fields.is_empty() }

    pub fn post_construct(&self) -> Option<&PostConstructHook> { self.post_construct.as_ref() }

    /// Whether instances have a hash: explicit `unsafe_hash`, frozen value
    /// records, or identity-compared records.
    pub fn is_hashable(&self) -> bool {
        let o = &self.options;
        o.unsafe_hash || (o.eq && o.frozen) || !o.eq
    }
}

impl fmt::Debug for RecordSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordSchema")
            .field("name", &self.name)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("options", &self.options)
            .finish()
    }
}
