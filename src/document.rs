//! JSON schema documents: declarations written as data.
//!
//! ```json
//! {
//!   "enums": {"Mood": {"happy": "h", "sad": "s"}},
//!   "records": [
//!     {"name": "Entry", "nest": true, "validate": true,
//!      "fields": [
//!        {"name": "mood", "type": "Mood"},
//!        {"name": "count", "type": "int", "validators": ["non_negative", "odd"]},
//!        {"name": "note", "type": "Optional[str]"}
//!      ]}
//!   ]
//! }
//! ```

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};

use crate::annotation::Annotation;
use crate::declare::{field, FieldDecl, RecordDecl, Registry};
use crate::enumeration::EnumDef;
use crate::error::DeclarationError;
use crate::path_de;
use crate::schema::RecordOptions;
use crate::value::Value;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocument {
    #[serde(default)]
    pub enums: IndexMap<String, IndexMap<String, serde_json::Value>>,
    #[serde(default)]
    pub records: Vec<RecordDocument>,
}

#[derive(Debug, Deserialize)]
pub struct RecordDocument {
    pub name: String,
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(flatten)]
    pub options: RecordOptions,
    #[serde(default)]
    pub fields: Vec<FieldDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDocument {
    pub name: String,
    #[serde(rename = "type")]
    pub annotation: Annotation,
    /// `Some(Null)` when the document says `"default": null`.
    #[serde(default, deserialize_with = "present")]
    pub default: Option<serde_json::Value>,
    #[serde(default = "enabled")]
    pub init: bool,
    #[serde(default = "enabled")]
    pub repr: bool,
    #[serde(default)]
    pub hash: Option<bool>,
    #[serde(default = "enabled")]
    pub compare: bool,
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub default_optional_value: serde_json::Value,
    #[serde(default)]
    pub validators: ValidatorNames,
}

/// One validator name or a list of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ValidatorNames {
    One(String),
    Many(Vec<String>),
}

impl Default for ValidatorNames {
    fn default() -> Self { ValidatorNames::Many(Vec::new()) }
}

impl ValidatorNames {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            ValidatorNames::One(name) => vec![name],
            ValidatorNames::Many(names) => names,
        }
    }
}

fn enabled() -> bool { true }

fn present<'de, D: Deserializer<'de>>(de: D) -> Result<Option<serde_json::Value>, D::Error> {
    serde_json::Value::deserialize(de).map(Some)
}

impl SchemaDocument {
    pub fn from_str(src: &str, origin: &str) -> Result<Self, DeclarationError> {
        path_de::from_str_with_path(src, origin)
    }

    pub fn load(path: &Path) -> Result<Self, DeclarationError> {
        let bytes = std::fs::read(path)?;
        path_de::from_slice_with_path(&bytes, &path.to_string_lossy())
    }

    /// Declare every enum, then every record in document order. Records may
    /// only refer to types declared before them.
    pub fn declare_into(self, registry: &mut Registry) -> Result<(), DeclarationError> {
        for (name, members) in self.enums {
            let members = members.into_iter().map(|(member, value)| (member, Value::from(value)));
            registry.declare_enum(EnumDef::new(name, members))?;
        }
        for record in self.records {
            let mut decl = RecordDecl::new(record.name.clone()).options(record.options);
            if let Some(base) = &record.extends {
                let parent = registry.record(base).ok_or_else(|| DeclarationError::UnknownBase {
                    record: record.name.clone(),
                    name: base.clone(),
                })?;
                decl = decl.extends(parent);
            }
            for doc in record.fields {
                decl = decl.field(doc.into_decl());
            }
            registry.declare_record(decl)?;
        }
        Ok(())
    }
}

impl FieldDocument {
    fn into_decl(self) -> FieldDecl {
        let mut decl = field(self.name, self.annotation)
            .init(self.init)
            .repr(self.repr)
            .compare(self.compare)
            .metadata(self.metadata)
            .default_optional_value(Value::from(self.default_optional_value));
        if let Some(hash) = self.hash {
            decl = decl.hash(hash);
        }
        if let Some(default) = self.default {
            decl = decl.default(Value::from(default));
        }
        if self.optional {
            decl = decl.optional();
        }
        for name in self.validators.into_vec() {
            decl = decl.named_validator(name);
        }
        decl
    }
}
