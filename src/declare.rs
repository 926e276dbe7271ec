//! Declaring enums and record types.
//!
//! ```
//! use recordutils::{field, RecordDecl, RecordOptions, Registry, Value};
//!
//! let mut registry = Registry::with_stock_validators();
//! registry
//!     .declare_record(
//!         RecordDecl::new("Item")
//!             .options(RecordOptions::checked())
//!             .field(field("count", "int").named_validator("non_negative"))
//!             .field(field("note", "Optional[str]")),
//!     )
//!     .unwrap();
//! let item = registry
//!     .construct("Item", [("count".to_string(), Value::Int(3))].into_iter().collect())
//!     .unwrap();
//! assert_eq!(item.get("note"), Some(&Value::None));
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::annotation::Annotation;
use crate::descriptor::{TypeDescriptor, TypeLookup};
use crate::enumeration::EnumDef;
use crate::error::{ConstructError, DeclarationError};
use crate::factory;
use crate::field_validation::{self, FieldInvalid, Validator};
use crate::record::Record;
use crate::schema::{DefaultFactory, FieldSpec, PostConstructHook, RecordOptions, RecordSchema};
use crate::value::{Kwargs, Value};

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is a valid regex"));

fn check_identifier(name: &str) -> Result<(), DeclarationError> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(DeclarationError::InvalidName { name: name.to_string() })
    }
}

// ————————————————————————————————————————————————————————————————————————————
// FIELD DECLARATIONS
// ————————————————————————————————————————————————————————————————————————————

/// Declared type of a field: already parsed, or text parsed at declaration.
#[derive(Debug, Clone)]
pub enum DeclaredType {
    Text(String),
    Parsed(Annotation),
}

impl From<&str> for DeclaredType {
    fn from(text: &str) -> Self { DeclaredType::Text(text.to_string()) }
}

impl From<String> for DeclaredType {
    fn from(text: String) -> Self { DeclaredType::Text(text) }
}

impl From<Annotation> for DeclaredType {
    fn from(annotation: Annotation) -> Self { DeclaredType::Parsed(annotation) }
}

impl DeclaredType {
    fn into_annotation(self) -> Result<Annotation, DeclarationError> {
        match self {
            DeclaredType::Text(text) => text.parse(),
            DeclaredType::Parsed(annotation) => Ok(annotation),
        }
    }
}

/// Validator attached to a field: a callable, or the name of one registered
/// on the [`Registry`].
#[derive(Clone)]
pub enum ValidatorRef {
    Callable(Validator),
    Named(String),
}

#[derive(Clone)]
pub struct FieldDecl {
    name: String,
    declared: DeclaredType,
    default: Option<Value>,
    default_factory: Option<DefaultFactory>,
    init: bool,
    repr: bool,
    hash: Option<bool>,
    compare: bool,
    metadata: serde_json::Value,
    optional: bool,
    default_optional_value: Value,
    validators: Vec<ValidatorRef>,
}

/// Start a field declaration.
pub fn field(name: impl Into<String>, declared: impl Into<DeclaredType>) -> FieldDecl {
    FieldDecl {
        name: name.into(),
        declared: declared.into(),
        default: None,
        default_factory: None,
        init: true,
        repr: true,
        hash: None,
        compare: true,
        metadata: serde_json::Value::Null,
        optional: false,
        default_optional_value: Value::None,
        validators: Vec::new(),
    }
}

impl FieldDecl {
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn default_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default_factory = Some(Arc::new(factory));
        self
    }

    pub fn init(mut self, init: bool) -> Self {
        self.init = init;
        self
    }

    pub fn repr(mut self, repr: bool) -> Self {
        self.repr = repr;
        self
    }

    pub fn hash(mut self, hash: bool) -> Self {
        self.hash = Some(hash);
        self
    }

    pub fn compare(mut self, compare: bool) -> Self {
        self.compare = compare;
        self
    }

    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// The field may be omitted; it then holds the sentinel.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn default_optional_value(mut self, sentinel: impl Into<Value>) -> Self {
        self.default_optional_value = sentinel.into();
        self
    }

    pub fn validator<F>(mut self, check: F) -> Self
    where
        F: Fn(&Value) -> Result<(), FieldInvalid> + Send + Sync + 'static,
    {
        self.validators.push(ValidatorRef::Callable(Arc::new(check)));
        self
    }

    pub fn validators(mut self, refs: impl IntoIterator<Item = ValidatorRef>) -> Self {
        self.validators.extend(refs);
        self
    }

    pub fn named_validator(mut self, name: impl Into<String>) -> Self {
        self.validators.push(ValidatorRef::Named(name.into()));
        self
    }
}

// ————————————————————————————————————————————————————————————————————————————
// RECORD DECLARATIONS
// ————————————————————————————————————————————————————————————————————————————

pub struct RecordDecl {
    name: String,
    base: Option<Arc<RecordSchema>>,
    fields: Vec<FieldDecl>,
    options: RecordOptions,
    post_construct: Option<PostConstructHook>,
}

impl RecordDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: None,
            fields: Vec::new(),
            options: RecordOptions::default(),
            post_construct: None,
        }
    }

    /// Inherit the fields (and hook) of `base`. Redeclared fields keep their
    /// inherited position.
    pub fn extends(mut self, base: &Arc<RecordSchema>) -> Self {
        self.base = Some(Arc::clone(base));
        self
    }

    pub fn field(mut self, decl: FieldDecl) -> Self {
        self.fields.push(decl);
        self
    }

    pub fn options(mut self, options: RecordOptions) -> Self {
        self.options = options;
        self
    }

    pub fn post_construct<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Record) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.post_construct = Some(Arc::new(hook));
        self
    }
}

// ————————————————————————————————————————————————————————————————————————————
// REGISTRY
// ————————————————————————————————————————————————————————————————————————————

/// Declared enums, record types and named validators.
#[derive(Default)]
pub struct Registry {
    enums: IndexMap<String, Arc<EnumDef>>,
    records: IndexMap<String, Arc<RecordSchema>>,
    validators: IndexMap<String, Validator>,
}

impl Registry {
    pub fn new() -> Self { Self::default() }

    /// A registry with `non_negative`, `positive`, `odd`, `even` and `non_empty`.
    pub fn with_stock_validators() -> Self {
        let mut registry = Self::new();
        for (name, check) in field_validation::stock() {
            registry.validators.insert(name.to_string(), check);
        }
        registry
    }

    pub fn register_validator<F>(&mut self, name: impl Into<String>, check: F) -> &mut Self
    where
        F: Fn(&Value) -> Result<(), FieldInvalid> + Send + Sync + 'static,
    {
        self.validators.insert(name.into(), Arc::new(check));
        self
    }

    pub fn declare_enum(&mut self, def: EnumDef) -> Result<Arc<EnumDef>, DeclarationError> {
        check_identifier(def.name())?;
        if self.is_declared(def.name()) {
            return Err(DeclarationError::DuplicateType(def.name().to_string()));
        }
        if def.is_empty() {
            return Err(DeclarationError::EmptyEnum(def.name().to_string()));
        }
        for (member, _) in def.members() {
            check_identifier(member)?;
        }
        let def = Arc::new(def);
        self.enums.insert(def.name().to_string(), Arc::clone(&def));
        Ok(def)
    }

    pub fn declare_record(&mut self, decl: RecordDecl) -> Result<Arc<RecordSchema>, DeclarationError> {
        let RecordDecl { name, base, fields, options, post_construct } = decl;
        check_identifier(&name)?;
        if self.is_declared(&name) {
            return Err(DeclarationError::DuplicateType(name));
        }
        if options.order && !options.eq {
            return Err(DeclarationError::OrderWithoutEq(name));
        }

        let mut specs: IndexMap<String, FieldSpec> = base
            .as_ref()
            .map(|base| base.fields().map(|spec| (spec.name.clone(), spec.clone())).collect())
            .unwrap_or_default();
        let mut seen = HashSet::new();
        let mut faults = Vec::new();
        for decl in fields {
            if !seen.insert(decl.name.clone()) {
                return Err(DeclarationError::DuplicateField { record: name, field: decl.name });
            }
            let spec = self.resolve_field(&name, decl, &mut faults)?;
            specs.insert(spec.name.clone(), spec);
        }
        if !faults.is_empty() {
            return Err(DeclarationError::FaultyValidators { record: name, faults });
        }

        let post_construct = post_construct.or_else(|| base.as_ref().and_then(|b| b.post_construct().cloned()));
        debug!(record = %name, fields = specs.len(), "declared record type");
        let schema = Arc::new(RecordSchema::new(name.clone(), specs, options, post_construct));
        self.records.insert(name, Arc::clone(&schema));
        Ok(schema)
    }

    fn resolve_field(
        &self,
        record: &str,
        decl: FieldDecl,
        faults: &mut Vec<(String, String)>,
    ) -> Result<FieldSpec, DeclarationError> {
        check_identifier(&decl.name)?;
        let located = |make: fn(String, String) -> DeclarationError| make(record.to_string(), decl.name.clone());
        if decl.default.is_some() && decl.default_factory.is_some() {
            return Err(located(|record, field| DeclarationError::DefaultAndFactory { record, field }));
        }
        if !decl.init && decl.default.is_none() && decl.default_factory.is_none() {
            return Err(located(|record, field| DeclarationError::InitWithoutDefault { record, field }));
        }
        let annotation = decl.declared.into_annotation()?;
        let ty = TypeDescriptor::resolve(&annotation, self).map_err(|name| DeclarationError::UnknownType {
            record: record.to_string(),
            field: decl.name.clone(),
            name,
        })?;

        let mut validators = Vec::with_capacity(decl.validators.len());
        for reference in decl.validators {
            match reference {
                ValidatorRef::Callable(check) => validators.push(check),
                ValidatorRef::Named(key) => match self.validators.get(&key) {
                    Some(check) => validators.push(Arc::clone(check)),
                    None => faults.push((decl.name.clone(), key)),
                },
            }
        }

        // an Optional[...] annotation makes the field optional with a None sentinel
        let (optional, default_optional_value) = if decl.optional {
            (true, decl.default_optional_value)
        } else if ty.is_nullable() {
            (true, Value::None)
        } else {
            (false, decl.default_optional_value)
        };

        Ok(FieldSpec {
            name: decl.name,
            ty,
            default: decl.default,
            default_factory: decl.default_factory,
            init: decl.init,
            repr: decl.repr,
            hash: decl.hash,
            compare: decl.compare,
            metadata: decl.metadata,
            optional,
            default_optional_value,
            validators,
        })
    }

    fn is_declared(&self, name: &str) -> bool {
        self.enums.contains_key(name) || self.records.contains_key(name)
    }

    pub fn record(&self, name: &str) -> Option<&Arc<RecordSchema>> { self.records.get(name) }

    pub fn enumeration(&self, name: &str) -> Option<&Arc<EnumDef>> { self.enums.get(name) }

    pub fn records(&self) -> impl Iterator<Item = &Arc<RecordSchema>> { self.records.values() }

    /// Construct a record of the named type.
    pub fn construct(&self, name: &str, kwargs: Kwargs) -> Result<Record, ConstructError> {
        let schema = self.record(name).ok_or_else(|| ConstructError::UnknownRecord(name.to_string()))?;
        factory::construct(schema, kwargs)
    }
}

impl TypeLookup for Registry {
    fn enumeration(&self, name: &str) -> Option<&Arc<EnumDef>> { self.enums.get(name) }

    fn record(&self, name: &str) -> Option<&Arc<RecordSchema>> { self.records.get(name) }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("enums", &self.enums.keys().collect::<Vec<_>>())
            .field("records", &self.records.keys().collect::<Vec<_>>())
            .field("validators", &self.validators.keys().collect::<Vec<_>>())
            .finish()
    }
}
