//! Typing-style field annotations (`List[Dict[str, int]]`, `Optional[Inner]`, ...).
//!
//! An annotation is the declared, unresolved shape of a field. Names are
//! resolved against a registry later, see [`crate::descriptor`].

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::DeclarationError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Annotation {
    /// A leaf type (`int`, `str`, ...) or a declared enum/record name.
    Named(String),
    List(Option<Box<Annotation>>),
    Dict(Option<Box<(Annotation, Annotation)>>),
    Set(Option<Box<Annotation>>),
    FrozenSet(Option<Box<Annotation>>),
    Tuple(Vec<Annotation>),
    Union(Vec<Annotation>),
    Optional(Box<Annotation>),
    Any,
    /// A bare type variable such as `~T`.
    TypeVar(String),
    /// Any other parameterized generic; kept for messages only.
    Generic { name: String, args: Vec<Annotation> },
}

impl Annotation {
    pub fn named(name: impl Into<String>) -> Self { Annotation::Named(name.into()) }

    pub fn list_of(inner: Annotation) -> Self { Annotation::List(Some(Box::new(inner))) }

    pub fn dict_of(key: Annotation, value: Annotation) -> Self {
        Annotation::Dict(Some(Box::new((key, value))))
    }

    pub fn optional(inner: Annotation) -> Self { Annotation::Optional(Box::new(inner)) }

    pub fn union(variants: impl IntoIterator<Item = Annotation>) -> Self {
        Annotation::Union(variants.into_iter().collect())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// PARSING
// ————————————————————————————————————————————————————————————————————————————

impl FromStr for Annotation {
    type Err = DeclarationError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let fail = |reason: String| DeclarationError::Annotation { text: text.to_string(), reason };
        let mut parser = Parser { src: text, pos: 0 };
        let annotation = parser.annotation().map_err(fail)?;
        parser.skip_ws();
        if parser.pos != text.len() {
            return Err(fail(format!("trailing input at offset {}", parser.pos)));
        }
        Ok(annotation)
    }
}

impl TryFrom<String> for Annotation {
    type Error = DeclarationError;

    fn try_from(text: String) -> Result<Self, Self::Error> { text.parse() }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn skip_ws(&mut self) {
        let rest = &self.src[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.src[self.pos..].starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn ident(&mut self) -> Result<&'a str, String> {
        self.skip_ws();
        let src = self.src;
        let rest = &src[self.pos..];
        let len = rest
            .char_indices()
            .find(|&(i, c)| !(c.is_alphanumeric() || c == '_' || c == '.' || (i == 0 && c == '~')))
            .map_or(rest.len(), |(i, _)| i);
        if len == 0 {
            return Err(format!("expected a type name at offset {}", self.pos));
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    fn annotation(&mut self) -> Result<Annotation, String> {
        let name = self.ident()?;
        let args = if self.eat('[') {
            let mut args = vec![self.annotation()?];
            loop {
                if self.eat(',') {
                    args.push(self.annotation()?);
                } else if self.eat(']') {
                    break;
                } else {
                    return Err(format!("expected ',' or ']' at offset {}", self.pos));
                }
            }
            Some(args)
        } else {
            None
        };
        build(name, args)
    }
}

fn build(name: &str, args: Option<Vec<Annotation>>) -> Result<Annotation, String> {
    let arity = |expected: usize, args: Vec<Annotation>| -> Result<Vec<Annotation>, String> {
        if args.len() == expected {
            Ok(args)
        } else {
            Err(format!("{name} takes {expected} parameter(s), got {}", args.len()))
        }
    };
    let single = |args: Option<Vec<Annotation>>| -> Result<Option<Box<Annotation>>, String> {
        match args {
            None => Ok(None),
            Some(args) => Ok(arity(1, args)?.pop().map(Box::new)),
        }
    };
    match name {
        "List" | "list" => Ok(Annotation::List(single(args)?)),
        "Set" | "set" => Ok(Annotation::Set(single(args)?)),
        "FrozenSet" | "frozenset" => Ok(Annotation::FrozenSet(single(args)?)),
        "Dict" | "dict" => match args {
            None => Ok(Annotation::Dict(None)),
            Some(args) => {
                let mut pair = arity(2, args)?.into_iter();
                match (pair.next(), pair.next()) {
                    (Some(k), Some(v)) => Ok(Annotation::dict_of(k, v)),
                    _ => Err("Dict takes 2 parameter(s)".to_string()),
                }
            }
        },
        "Tuple" | "tuple" => Ok(Annotation::Tuple(args.unwrap_or_default())),
        "Union" => match args {
            Some(variants) => Ok(Annotation::Union(variants)),
            None => Err("Union requires parameters".to_string()),
        },
        "Optional" => match args {
            Some(args) => Ok(Annotation::Optional(Box::new(
                arity(1, args)?.pop().ok_or("Optional takes 1 parameter(s)")?,
            ))),
            None => Err("Optional requires a parameter".to_string()),
        },
        "Any" if args.is_none() => Ok(Annotation::Any),
        _ if name.starts_with('~') => match args {
            None => Ok(Annotation::TypeVar(name.to_string())),
            Some(_) => Err(format!("type variable {name} takes no parameters")),
        },
        _ if name.contains('~') => Err(format!("'{name}' is not a type name")),
        _ => Ok(match args {
            None => Annotation::Named(name.to_string()),
            Some(args) => Annotation::Generic { name: name.to_string(), args },
        }),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// RENDERING
// ————————————————————————————————————————————————————————————————————————————

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn params(f: &mut fmt::Formatter<'_>, name: &str, args: &[&Annotation]) -> fmt::Result {
            write!(f, "{name}[")?;
            for (i, arg) in args.iter().enumerate() {
                if i > 0 { f.write_str(", ")?; }
                write!(f, "{arg}")?;
            }
            f.write_str("]")
        }
        match self {
            Annotation::Named(name) | Annotation::TypeVar(name) => f.write_str(name),
            Annotation::List(None) => f.write_str("List"),
            Annotation::List(Some(inner)) => params(f, "List", &[&**inner]),
            Annotation::Dict(None) => f.write_str("Dict"),
            Annotation::Dict(Some(pair)) => params(f, "Dict", &[&pair.0, &pair.1]),
            Annotation::Set(None) => f.write_str("Set"),
            Annotation::Set(Some(inner)) => params(f, "Set", &[&**inner]),
            Annotation::FrozenSet(None) => f.write_str("FrozenSet"),
            Annotation::FrozenSet(Some(inner)) => params(f, "FrozenSet", &[&**inner]),
            Annotation::Tuple(args) if args.is_empty() => f.write_str("Tuple"),
            Annotation::Tuple(args) => params(f, "Tuple", &args.iter().collect::<Vec<_>>()),
            Annotation::Union(args) => params(f, "Union", &args.iter().collect::<Vec<_>>()),
            Annotation::Optional(inner) => params(f, "Optional", &[&**inner]),
            Annotation::Any => f.write_str("Any"),
            Annotation::Generic { name, args } => params(f, name, &args.iter().collect::<Vec<_>>()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_generics() {
        let parsed: Annotation = "Dict[str, List[Optional[Inner]]]".parse().unwrap();
        assert_eq!(
            parsed,
            Annotation::dict_of(
                Annotation::named("str"),
                Annotation::list_of(Annotation::optional(Annotation::named("Inner"))),
            )
        );
        assert_eq!(parsed.to_string(), "Dict[str, List[Optional[Inner]]]");
    }

    #[test]
    fn bare_containers_and_lowercase_aliases() {
        assert_eq!("List".parse::<Annotation>().unwrap(), Annotation::List(None));
        assert_eq!("list[int]".parse::<Annotation>().unwrap(), Annotation::list_of(Annotation::named("int")));
        assert_eq!("Union[int, List]".parse::<Annotation>().unwrap().to_string(), "Union[int, List]");
        assert_eq!("~T".parse::<Annotation>().unwrap(), Annotation::TypeVar("~T".into()));
        assert_eq!("Any".parse::<Annotation>().unwrap(), Annotation::Any);
    }

    #[test]
    fn rejects_malformed_text() {
        for text in ["", "List[", "List[int", "Dict[str]", "Optional", "int]", "Optional[int, str]", "a~b"] {
            let err = text.parse::<Annotation>().unwrap_err();
            assert!(matches!(err, DeclarationError::Annotation { .. }), "{text}: {err}");
        }
    }

    #[test]
    fn deserializes_from_json_string() {
        let parsed: Annotation = serde_json::from_str("\"Set[int]\"").unwrap();
        assert_eq!(parsed, Annotation::Set(Some(Box::new(Annotation::named("int")))));
        assert!(serde_json::from_str::<Annotation>("\"List[\"").is_err());
    }
}
