//! Aggregated, field-keyed construction failures.
//!
//! Every failure found while building one record lands in a single tree:
//! top-level keys are field names, list elements are addressed by index and
//! nested records contribute their own subtree.

use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ErrorTree {
    entries: IndexMap<String, ErrorNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ErrorNode {
    Message(String),
    /// Failures of individual list elements, keyed by position.
    Indexed(BTreeMap<usize, ErrorNode>),
    /// Failures reported by a nested record, or by a mapping's values.
    Nested(ErrorTree),
}

impl ErrorTree {
    pub fn new() -> Self { Self::default() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn contains(&self, field: &str) -> bool { self.entries.contains_key(field) }

    pub fn get(&self, field: &str) -> Option<&ErrorNode> { self.entries.get(field) }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ErrorNode)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Set the entry for `field`, replacing whatever was there.
    pub fn insert(&mut self, field: impl Into<String>, node: ErrorNode) {
        self.entries.insert(field.into(), node);
    }

    pub fn insert_message(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.insert(field, ErrorNode::Message(message.into()));
    }

    /// Add a failure at `index` under `field`. An existing index map is
    /// extended; any other existing entry is replaced.
    pub fn insert_indexed(&mut self, field: impl Into<String>, index: usize, node: ErrorNode) {
        let field = field.into();
        match self.entries.get_mut(&field) {
            Some(ErrorNode::Indexed(positions)) => {
                positions.insert(index, node);
            }
            _ => {
                self.entries.insert(field, ErrorNode::Indexed(BTreeMap::from([(index, node)])));
            }
        }
    }

    /// Flattened `(path, message)` pairs, e.g. `("b[1].c.c_value", "...")`.
    pub fn paths(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for (field, node) in &self.entries {
            node.collect_paths(field, &mut out);
        }
        out
    }
}

impl ErrorNode {
    pub fn as_message(&self) -> Option<&str> {
        match self {
            ErrorNode::Message(message) => Some(message),
            _ => None,
        }
    }

    pub fn at(&self, index: usize) -> Option<&ErrorNode> {
        match self {
            ErrorNode::Indexed(positions) => positions.get(&index),
            _ => None,
        }
    }

    pub fn as_tree(&self) -> Option<&ErrorTree> {
        match self {
            ErrorNode::Nested(tree) => Some(tree),
            _ => None,
        }
    }

    fn collect_paths(&self, prefix: &str, out: &mut Vec<(String, String)>) {
        match self {
            ErrorNode::Message(message) => out.push((prefix.to_string(), message.clone())),
            ErrorNode::Indexed(positions) => {
                for (index, node) in positions {
                    node.collect_paths(&format!("{prefix}[{index}]"), out);
                }
            }
            ErrorNode::Nested(tree) => {
                for (key, node) in &tree.entries {
                    node.collect_paths(&format!("{prefix}.{key}"), out);
                }
            }
        }
    }
}

impl fmt::Display for ErrorTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (path, message)) in self.paths().into_iter().enumerate() {
            if i > 0 { f.write_str("\n")?; }
            write!(f, "  {path}: {message}")?;
        }
        Ok(())
    }
}
