//! Declarative records with recursive nesting, structural type validation and
//! per-field validators.
//!
//! A record type is declared once on a [`Registry`] (in code or from a JSON
//! [`SchemaDocument`]). Constructing a record from raw keyword data runs a
//! fixed pipeline: optional-field defaulting, field assignment, nesting of
//! mapping literals into nested records, type validation and custom field
//! validators. Every failure found along the way is collected into one
//! [`ErrorTree`] and returned as a single error.

pub mod annotation;
pub mod declare;
pub mod descriptor;
pub mod document;
pub mod dump;
pub mod enumeration;
pub mod error;
pub mod error_tree;
pub mod factory;
pub mod field_validation;
pub mod nesting;
pub mod path_de;
pub mod record;
pub mod schema;
pub mod type_walker;
pub mod value;

pub use annotation::Annotation;
pub use declare::{field, FieldDecl, RecordDecl, Registry, ValidatorRef};
pub use descriptor::{LeafType, TypeDescriptor};
pub use document::SchemaDocument;
pub use dump::{dump, dump_json};
pub use enumeration::{EnumDef, EnumMember};
pub use error::{AggregatedValidationError, ConstructError, DeclarationError, RecordAccessError};
pub use error_tree::{ErrorNode, ErrorTree};
pub use factory::{construct, construct_json};
pub use field_validation::{FieldInvalid, Validator};
pub use record::Record;
pub use schema::{FieldSpec, RecordOptions, RecordSchema};
pub use value::{Key, Kwargs, Value};
