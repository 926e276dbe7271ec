//! Error types for declaration, construction and record access.

use thiserror::Error;

use crate::error_tree::ErrorTree;

/// Raised while declaring enums or record types, never while constructing.
#[derive(Error, Debug)]
pub enum DeclarationError {
    #[error("type '{0}' is already declared")]
    DuplicateType(String),

    #[error("'{name}' is not a valid identifier")]
    InvalidName { name: String },

    /// A field name appears twice in the same declaration.
    #[error("{record} declares field '{field}' more than once")]
    DuplicateField { record: String, field: String },

    #[error("{record}.{field}: cannot specify both default and default_factory")]
    DefaultAndFactory { record: String, field: String },

    #[error("{record}.{field} is excluded from init but has no default")]
    InitWithoutDefault { record: String, field: String },

    #[error("{0}: eq must be true if order is true")]
    OrderWithoutEq(String),

    #[error("{record}.{field}: unknown type '{name}'")]
    UnknownType { record: String, field: String, name: String },

    #[error("{record}: unknown base record '{name}'")]
    UnknownBase { record: String, name: String },

    #[error("enum {0} declares no members")]
    EmptyEnum(String),

    #[error("malformed annotation '{text}': {reason}")]
    Annotation { text: String, reason: String },

    /// Validator references that do not name a registered validator.
    /// `faults` holds `(field, reference)` pairs.
    #[error("{}", render_faults(.record, .faults))]
    FaultyValidators { record: String, faults: Vec<(String, String)> },

    #[error("schema document: {0}")]
    Document(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn render_faults(record: &str, faults: &[(String, String)]) -> String {
    let mut out = format!("{record} contains faulty validators for fields:");
    for (field, reference) in faults {
        out.push_str(&format!("\n\t{field}: '{reference}' is not a known validator"));
    }
    out
}

#[derive(Error, Debug)]
pub enum ConstructError {
    #[error("{record}: missing required field(s) {}", quote_all(.fields))]
    MissingFields { record: String, fields: Vec<String> },

    #[error("{record}: unexpected keyword argument '{field}'")]
    UnexpectedField { record: String, field: String },

    #[error("{record}: keyword mapping has a non-string key {key}")]
    NonStringKey { record: String, key: String },

    #[error("{record}: expected a keyword mapping, found {found}")]
    NotAMapping { record: String, found: String },

    #[error("unknown record type '{0}'")]
    UnknownRecord(String),

    /// One or more fields failed nesting or validation.
    #[error(transparent)]
    Invalid(#[from] AggregatedValidationError),

    #[error("{record}: post-construction hook failed: {source}")]
    PostConstruct { record: String, source: anyhow::Error },
}

fn quote_all(fields: &[String]) -> String {
    fields.iter().map(|f| format!("'{f}'")).collect::<Vec<_>>().join(", ")
}

impl ConstructError {
    /// The error tree, when construction failed validation.
    pub fn tree(&self) -> Option<&ErrorTree> {
        match self {
            ConstructError::Invalid(err) => Some(err.tree()),
            _ => None,
        }
    }
}

/// All nesting, type and field-validator failures of one construction.
#[derive(Error, Debug, Clone)]
#[error("{record} failed validation:\n{tree}")]
pub struct AggregatedValidationError {
    record: String,
    tree: ErrorTree,
}

impl AggregatedValidationError {
    pub fn new(record: impl Into<String>, tree: ErrorTree) -> Self {
        Self { record: record.into(), tree }
    }

    pub fn record(&self) -> &str { &self.record }

    pub fn tree(&self) -> &ErrorTree { &self.tree }

    pub fn into_tree(self) -> ErrorTree { self.tree }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RecordAccessError {
    #[error("cannot assign to field '{field}' of frozen record {record}")]
    Frozen { record: String, field: String },

    #[error("{record} has no field '{field}'")]
    UnknownField { record: String, field: String },
}
