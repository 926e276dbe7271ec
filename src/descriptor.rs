//! Resolved field types.
//!
//! A [`TypeDescriptor`] is an [`Annotation`] with every name bound to a leaf
//! type, a declared enum or a declared record schema. Nesting and type
//! validation both walk descriptors, never raw annotations.

use std::fmt;
use std::sync::Arc;

use crate::annotation::Annotation;
use crate::enumeration::EnumDef;
use crate::schema::RecordSchema;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafType {
    NoneType,
    Bool,
    Int,
    Float,
    Str,
}

impl LeafType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "None" | "NoneType" => Some(LeafType::NoneType),
            "bool" => Some(LeafType::Bool),
            "int" => Some(LeafType::Int),
            "float" => Some(LeafType::Float),
            "str" => Some(LeafType::Str),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LeafType::NoneType => "NoneType",
            LeafType::Bool => "bool",
            LeafType::Int => "int",
            LeafType::Float => "float",
            LeafType::Str => "str",
        }
    }

    /// Exact match only: a `bool` is not an `int` and an `int` is not a `float`.
    /// Stricter than an `isinstance` check, which lets `True` pass as an `int`.
    pub fn admits(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (LeafType::NoneType, Value::None)
                | (LeafType::Bool, Value::Bool(_))
                | (LeafType::Int, Value::Int(_))
                | (LeafType::Float, Value::Float(_))
                | (LeafType::Str, Value::Str(_))
        )
    }
}

#[derive(Debug, Clone)]
pub enum TypeDescriptor {
    Leaf(LeafType),
    ListOf(Box<TypeDescriptor>),
    MappingOf { key: Box<TypeDescriptor>, value: Box<TypeDescriptor> },
    SetOf(Box<TypeDescriptor>),
    EnumType(Arc<EnumDef>),
    RecordType(Arc<RecordSchema>),
    SumType(Vec<TypeDescriptor>),
    /// Matches anything (bare type variables, unparameterized containers).
    Unconstrained,
    /// A shape neither nesting nor validation understands; carries its text.
    Unsupported(String),
}

/// Name lookup used while resolving annotations.
pub trait TypeLookup {
    fn enumeration(&self, name: &str) -> Option<&Arc<EnumDef>>;
    fn record(&self, name: &str) -> Option<&Arc<RecordSchema>>;
}

impl TypeDescriptor {
    /// Bind every name in `annotation`. The error carries the first name
    /// that is neither a leaf type nor declared in `types`.
    pub fn resolve(annotation: &Annotation, types: &impl TypeLookup) -> Result<Self, String> {
        let boxed = |inner: &Option<Box<Annotation>>| -> Result<Box<TypeDescriptor>, String> {
            match inner {
                Some(inner) => Ok(Box::new(Self::resolve(inner, types)?)),
                None => Ok(Box::new(TypeDescriptor::Unconstrained)),
            }
        };
        Ok(match annotation {
            Annotation::Named(name) => {
                if let Some(leaf) = LeafType::from_name(name) {
                    TypeDescriptor::Leaf(leaf)
                } else if let Some(def) = types.enumeration(name) {
                    TypeDescriptor::EnumType(Arc::clone(def))
                } else if let Some(schema) = types.record(name) {
                    TypeDescriptor::RecordType(Arc::clone(schema))
                } else {
                    return Err(name.clone());
                }
            }
            Annotation::List(inner) => TypeDescriptor::ListOf(boxed(inner)?),
            Annotation::Set(inner) | Annotation::FrozenSet(inner) => TypeDescriptor::SetOf(boxed(inner)?),
            Annotation::Dict(None) => TypeDescriptor::MappingOf {
                key: Box::new(TypeDescriptor::Unconstrained),
                value: Box::new(TypeDescriptor::Unconstrained),
            },
            Annotation::Dict(Some(pair)) => TypeDescriptor::MappingOf {
                key: Box::new(Self::resolve(&pair.0, types)?),
                value: Box::new(Self::resolve(&pair.1, types)?),
            },
            Annotation::Union(variants) => Self::sum(variants.iter(), types)?,
            Annotation::Optional(inner) => {
                let none = Annotation::named("None");
                Self::sum([&**inner, &none].into_iter(), types)?
            }
            Annotation::TypeVar(_) => TypeDescriptor::Unconstrained,
            Annotation::Any | Annotation::Tuple(_) | Annotation::Generic { .. } => {
                TypeDescriptor::Unsupported(annotation.to_string())
            }
        })
    }

    /// Flatten nested sums, drop duplicates, collapse a single variant.
    fn sum<'a>(
        variants: impl Iterator<Item = &'a Annotation>,
        types: &impl TypeLookup,
    ) -> Result<Self, String> {
        let mut flat: Vec<TypeDescriptor> = Vec::new();
        for variant in variants {
            let resolved = Self::resolve(variant, types)?;
            let members = match resolved {
                TypeDescriptor::SumType(inner) => inner,
                single => vec![single],
            };
            for member in members {
                if !flat.contains(&member) {
                    flat.push(member);
                }
            }
        }
        Ok(match flat.len() {
            1 => flat.remove(0),
            _ => TypeDescriptor::SumType(flat),
        })
    }

    /// True for sums that admit `None`.
    pub fn is_nullable(&self) -> bool {
        match self {
            TypeDescriptor::SumType(variants) => variants.contains(&TypeDescriptor::Leaf(LeafType::NoneType)),
            _ => false,
        }
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        use TypeDescriptor as T;
        match (self, other) {
            (T::Leaf(a), T::Leaf(b)) => a == b,
            (T::ListOf(a), T::ListOf(b)) | (T::SetOf(a), T::SetOf(b)) => a == b,
            (T::MappingOf { key: ka, value: va }, T::MappingOf { key: kb, value: vb }) => ka == kb && va == vb,
            (T::EnumType(a), T::EnumType(b)) => a.name() == b.name(),
            (T::RecordType(a), T::RecordType(b)) => a.name() == b.name(),
            (T::SumType(a), T::SumType(b)) => a == b,
            (T::Unconstrained, T::Unconstrained) => true,
            (T::Unsupported(a), T::Unsupported(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Leaf(leaf) => f.write_str(leaf.name()),
            TypeDescriptor::ListOf(inner) if **inner == TypeDescriptor::Unconstrained => f.write_str("List"),
            TypeDescriptor::ListOf(inner) => write!(f, "List[{inner}]"),
            TypeDescriptor::MappingOf { key, value } => write!(f, "Dict[{key}, {value}]"),
            TypeDescriptor::SetOf(inner) => write!(f, "Set[{inner}]"),
            TypeDescriptor::EnumType(def) => f.write_str(def.name()),
            TypeDescriptor::RecordType(schema) => f.write_str(schema.name()),
            TypeDescriptor::SumType(variants) => {
                let none = TypeDescriptor::Leaf(LeafType::NoneType);
                if variants.len() == 2 && variants[1] == none {
                    return write!(f, "Optional[{}]", variants[0]);
                }
                f.write_str("Union[")?;
                for (i, variant) in variants.iter().enumerate() {
                    if i > 0 { f.write_str(", ")?; }
                    write!(f, "{variant}")?;
                }
                f.write_str("]")
            }
            TypeDescriptor::Unconstrained => f.write_str("~T"),
            TypeDescriptor::Unsupported(text) => f.write_str(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    #[derive(Default)]
    struct Names {
        enums: IndexMap<String, Arc<EnumDef>>,
    }

    impl TypeLookup for Names {
        fn enumeration(&self, name: &str) -> Option<&Arc<EnumDef>> { self.enums.get(name) }
        fn record(&self, _: &str) -> Option<&Arc<RecordSchema>> { None }
    }

    fn resolve(text: &str) -> Result<TypeDescriptor, String> {
        let mut names = Names::default();
        names.enums.insert("Color".into(), Arc::new(EnumDef::new("Color", [("red", Value::from(1))])));
        TypeDescriptor::resolve(&text.parse().unwrap(), &names)
    }

    #[test]
    fn optional_appends_none_variant() {
        let ty = resolve("Optional[int]").unwrap();
        assert!(ty.is_nullable());
        assert_eq!(ty.to_string(), "Optional[int]");
        assert_eq!(resolve("Optional[Union[int, str]]").unwrap().to_string(), "Union[int, str, NoneType]");
    }

    #[test]
    fn unions_flatten_and_collapse() {
        assert_eq!(resolve("Union[int]").unwrap(), TypeDescriptor::Leaf(LeafType::Int));
        assert_eq!(
            resolve("Union[int, Union[str, int]]").unwrap(),
            TypeDescriptor::SumType(vec![TypeDescriptor::Leaf(LeafType::Int), TypeDescriptor::Leaf(LeafType::Str)])
        );
        assert!(!resolve("Union[int, str]").unwrap().is_nullable());
    }

    #[test]
    fn bare_and_unsupported_shapes() {
        assert_eq!(resolve("List").unwrap(), TypeDescriptor::ListOf(Box::new(TypeDescriptor::Unconstrained)));
        assert_eq!(resolve("~T").unwrap(), TypeDescriptor::Unconstrained);
        assert_eq!(resolve("Tuple[int, str]").unwrap(), TypeDescriptor::Unsupported("Tuple[int, str]".into()));
        assert_eq!(resolve("Any").unwrap(), TypeDescriptor::Unsupported("Any".into()));
        assert_eq!(resolve("FrozenSet[int]").unwrap().to_string(), "Set[int]");
    }

    #[test]
    fn names_resolve_to_declared_types() {
        assert!(matches!(resolve("List[Color]").unwrap(), TypeDescriptor::ListOf(inner) if matches!(*inner, TypeDescriptor::EnumType(_))));
        assert_eq!(resolve("Dict[str, Missing]").unwrap_err(), "Missing");
    }

    #[test]
    fn leaf_matching_is_exact() {
        assert!(LeafType::Int.admits(&Value::Int(1)));
        assert!(!LeafType::Int.admits(&Value::Bool(true)));
        assert!(!LeafType::Float.admits(&Value::Int(1)));
        assert!(LeafType::NoneType.admits(&Value::None));
    }
}
