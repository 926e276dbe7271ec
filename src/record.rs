//! Record instances.
//!
//! A record is a schema plus one value per declared field. Equality,
//! ordering, hashing and rendering follow the schema's options the way a
//! generated data class would.

use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use indexmap::IndexMap;

use crate::error::{ConstructError, RecordAccessError};
use crate::schema::RecordSchema;
use crate::value::{Kwargs, Value};

static NEXT_IDENTITY: AtomicU64 = AtomicU64::new(0);

fn next_identity() -> u64 { NEXT_IDENTITY.fetch_add(1, AtomicOrdering::Relaxed) }

pub struct Record {
    schema: Arc<RecordSchema>,
    values: IndexMap<String, Value>,
    /// Unique per instance; a clone is a new instance. Backs equality and
    /// hashing of records declared with `eq` off.
    identity: u64,
}

impl Clone for Record {
    fn clone(&self) -> Self {
        Self { schema: Arc::clone(&self.schema), values: self.values.clone(), identity: next_identity() }
    }
}

impl Record {
    /// Plain field assignment, no nesting and no validation. Every field
    /// without a keyword and without a default is reported at once.
    pub(crate) fn assign(schema: &Arc<RecordSchema>, mut kwargs: Kwargs) -> Result<Self, ConstructError> {
        for key in kwargs.keys() {
            let accepted = schema.options().init && schema.field(key).is_some_and(|spec| spec.init);
            if !accepted {
                return Err(ConstructError::UnexpectedField {
                    record: schema.name().to_string(),
                    field: key.clone(),
                });
            }
        }
        let mut values = IndexMap::with_capacity(schema.len());
        let mut missing = Vec::new();
        for spec in schema.fields() {
            match kwargs.shift_remove(&spec.name).or_else(|| spec.default_value()) {
                Some(value) => {
                    values.insert(spec.name.clone(), value);
                }
                None => missing.push(spec.name.clone()),
            }
        }
        if !missing.is_empty() {
            return Err(ConstructError::MissingFields { record: schema.name().to_string(), fields: missing });
        }
        Ok(Self { schema: Arc::clone(schema), values, identity: next_identity() })
    }

    pub fn schema(&self) -> &Arc<RecordSchema> { &self.schema }

    pub fn type_name(&self) -> &str { self.schema.name() }

    pub fn get(&self, field: &str) -> Option<&Value> { self.values.get(field) }

    /// `(name, value)` pairs in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<(), RecordAccessError> {
        if self.schema.options().frozen {
            return Err(RecordAccessError::Frozen {
                record: self.type_name().to_string(),
                field: field.to_string(),
            });
        }
        match self.values.get_mut(field) {
            Some(slot) => {
                *slot = value.into();
                Ok(())
            }
            None => Err(RecordAccessError::UnknownField {
                record: self.type_name().to_string(),
                field: field.to_string(),
            }),
        }
    }

    pub(crate) fn slot_mut(&mut self, field: &str) -> Option<&mut Value> { self.values.get_mut(field) }

    /// Hash of the record, if instances of its type are hashable.
    /// Identity-compared records hash by their instance identity.
    pub fn hash_code(&self) -> Option<u64> {
        if !self.schema.is_hashable() {
            return None;
        }
        let mut hasher = DefaultHasher::new();
        if !self.schema.options().eq {
            self.identity.hash(&mut hasher);
            return Some(hasher.finish());
        }
        self.type_name().hash(&mut hasher);
        for spec in self.schema.fields().filter(|spec| spec.hashed()) {
            let value = self.values.get(&spec.name)?;
            if !value.hash_into(&mut hasher) {
                return None;
            }
        }
        Some(hasher.finish())
    }

    fn compared(&self) -> impl Iterator<Item = &Value> {
        self.schema
            .fields()
            .filter(|spec| spec.compare)
            .filter_map(|spec| self.values.get(&spec.name))
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        if !self.schema.options().eq {
            return self.identity == other.identity;
        }
        self.type_name() == other.type_name() && self.compared().eq(other.compared())
    }
}

impl PartialOrd for Record {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if !self.schema.options().order || self.type_name() != other.type_name() {
            return None;
        }
        self.compared().partial_cmp(other.compared())
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.schema.options().repr {
            return write!(f, "<{} record>", self.type_name());
        }
        write!(f, "{}(", self.type_name())?;
        let shown = self
            .schema
            .fields()
            .filter(|spec| spec.repr)
            .filter_map(|spec| self.values.get(&spec.name).map(|v| (&spec.name, v)));
        for (i, (name, value)) in shown.enumerate() {
            if i > 0 { f.write_str(", ")?; }
            write!(f, "{name}={value}")?;
        }
        f.write_str(")")
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct(self.type_name());
        for (name, value) in &self.values {
            out.field(name, value);
        }
        out.finish()
    }
}
