//! Enumerated types and their members.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::value::Value;

/// A declared enumeration: an ordered set of named members, each carrying a stored value.
#[derive(Debug)]
pub struct EnumDef {
    name: String,
    members: IndexMap<String, Value>,
}

impl EnumDef {
    pub fn new<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            members: members.into_iter().map(|(n, v)| (n.into(), v)).collect(),
        }
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn members(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.members.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize { self.members.len() }

    pub fn is_empty(&self) -> bool { self.members.is_empty() }
}

/// One member of an [`EnumDef`].
#[derive(Clone)]
pub struct EnumMember {
    def: Arc<EnumDef>,
    name: String,
}

impl EnumMember {
    /// Member by name.
    pub fn of(def: &Arc<EnumDef>, name: &str) -> Option<Self> {
        def.members.contains_key(name).then(|| Self { def: Arc::clone(def), name: name.to_string() })
    }

    /// First member whose stored value equals `raw`.
    pub fn by_value(def: &Arc<EnumDef>, raw: &Value) -> Option<Self> {
        def.members
            .iter()
            .find(|(_, stored)| *stored == raw)
            .map(|(name, _)| Self { def: Arc::clone(def), name: name.clone() })
    }

    pub fn enum_name(&self) -> &str { &self.def.name }

    pub fn name(&self) -> &str { &self.name }

    pub fn value(&self) -> &Value { &self.def.members[&self.name] }

    pub fn belongs_to(&self, def: &EnumDef) -> bool { self.def.name == def.name }
}

impl PartialEq for EnumMember {
    fn eq(&self, other: &Self) -> bool {
        self.def.name == other.def.name && self.name == other.name
    }
}

impl Eq for EnumMember {}

impl fmt::Debug for EnumMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EnumMember({}.{})", self.def.name, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frogs() -> Arc<EnumDef> {
        Arc::new(EnumDef::new("MyCoolEnum", [("pepe", Value::from("frog")), ("kermit", Value::from("muppet"))]))
    }

    #[test]
    fn lookup_by_value_and_name() {
        let def = frogs();
        let member = EnumMember::by_value(&def, &Value::from("frog")).unwrap();
        assert_eq!(member.name(), "pepe");
        assert_eq!(member.value(), &Value::from("frog"));
        assert_eq!(EnumMember::of(&def, "pepe"), Some(member));
        assert!(EnumMember::by_value(&def, &Value::from("pepe")).is_none());
        assert!(EnumMember::of(&def, "frog").is_none());
    }

    #[test]
    fn membership_is_by_enum_name() {
        let def = frogs();
        let other = Arc::new(EnumDef::new("Other", [("pepe", Value::from("frog"))]));
        let member = EnumMember::of(&def, "pepe").unwrap();
        assert!(member.belongs_to(&def));
        assert!(!member.belongs_to(&other));
        assert_ne!(Some(member), EnumMember::of(&other, "pepe"));
    }
}
