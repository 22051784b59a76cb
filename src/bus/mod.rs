//! Shared parameter bus for workflow stages.
//!
//! Every operation owns two buses: an input bus seeded with the request
//! parameters and an output bus that stages append their results to. The
//! same bus references are handed to every stage of every phase, so a value
//! appended by stage *k* is visible to stage *k+1* within the same phase and
//! across phases.
//!
//! Names are not unique. [`ParameterBus::get`] returns the FIRST match in
//! insertion order; callers that need the most recent value for a reused
//! name use [`ParameterBus::get_last`], and [`ParameterBus::get_all`]
//! returns every match.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub mod node;

/// A typed scalar carried on the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    String(String),
    Int(i64),
    Path(PathBuf),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Value::Path(p) => Some(p),
            Value::String(s) => Some(Path::new(s)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    name: String,
    value: Value,
}

/// Insertion-ordered association list of named values.
#[derive(Debug, Default)]
pub struct ParameterBus {
    nodes: Vec<Node>,
    capacity: Option<usize>,
}

impl ParameterBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bus that refuses appends beyond `limit` entries with
    /// [`Error::ResourceExhausted`].
    pub fn with_capacity_limit(limit: usize) -> Self {
        Self {
            nodes: Vec::new(),
            capacity: Some(limit),
        }
    }

    /// Append an entry at the tail. O(1) amortized. An earlier entry with
    /// the same name is kept; the bus makes no uniqueness guarantee.
    pub fn append(&mut self, name: impl Into<String>, value: Value) -> Result<()> {
        if let Some(limit) = self.capacity {
            if self.nodes.len() >= limit {
                return Err(Error::ResourceExhausted(format!(
                    "parameter bus is full ({limit} entries)"
                )));
            }
        }
        self.nodes.push(Node {
            name: name.into(),
            value,
        });
        Ok(())
    }

    /// First match in insertion order, or `None`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.nodes.iter().find(|n| n.name == name).map(|n| &n.value)
    }

    /// Most recent match, or `None`.
    pub fn get_last(&self, name: &str) -> Option<&Value> {
        self.nodes
            .iter()
            .rev()
            .find(|n| n.name == name)
            .map(|n| &n.value)
    }

    /// Every match, in insertion order.
    pub fn get_all(&self, name: &str) -> Vec<&Value> {
        self.nodes
            .iter()
            .filter(|n| n.name == name)
            .map(|n| &n.value)
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.iter().any(|n| n.name == name)
    }

    /// First string match for `name`.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// First integer match for `name`.
    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    /// First path match for `name`.
    pub fn get_path(&self, name: &str) -> Option<&Path> {
        self.get(name).and_then(Value::as_path)
    }

    /// First match for `name`, or [`Error::InvalidArgument`] naming the
    /// missing entry. Steps use this for their required inputs.
    pub fn require(&self, name: &str) -> Result<&Value> {
        self.get(name)
            .ok_or_else(|| Error::InvalidArgument(format!("missing bus entry: {name}")))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.nodes.iter().map(|n| (n.name.as_str(), &n.value))
    }

    /// Trace every entry, for phase-boundary diagnostics.
    pub fn list(&self) {
        for (name, value) in self.iter() {
            tracing::trace!("bus entry {name} = {value:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_first_match_lookup() {
        let mut bus = ParameterBus::new();
        bus.append(node::LABEL, Value::String("20250101120000".into()))
            .unwrap();
        bus.append(node::SERVER, Value::String("primary".into()))
            .unwrap();

        assert_eq!(bus.get_str(node::LABEL), Some("20250101120000"));
        assert_eq!(bus.get_str(node::SERVER), Some("primary"));
        assert!(bus.get(node::DIRECTORY).is_none());
        assert_eq!(bus.len(), 2);
    }

    #[test]
    fn duplicate_names_keep_both_entries() {
        let mut bus = ParameterBus::new();
        bus.append(node::LABEL, Value::String("first".into())).unwrap();
        bus.append(node::LABEL, Value::String("second".into())).unwrap();

        assert_eq!(bus.get_str(node::LABEL), Some("first"));
        assert_eq!(
            bus.get_last(node::LABEL).and_then(Value::as_str),
            Some("second")
        );
        assert_eq!(bus.get_all(node::LABEL).len(), 2);
        assert_eq!(bus.len(), 2);
    }

    #[test]
    fn capacity_limit_signals_resource_exhausted() {
        let mut bus = ParameterBus::with_capacity_limit(1);
        bus.append("a", Value::Int(1)).unwrap();
        let err = bus.append("b", Value::Int(2)).unwrap_err();
        assert!(matches!(err, Error::ResourceExhausted(_)));
        assert_eq!(bus.len(), 1);
    }

    #[test]
    fn require_reports_the_missing_name() {
        let bus = ParameterBus::new();
        let err = bus.require(node::IDENTIFIER).unwrap_err();
        match err {
            Error::InvalidArgument(msg) => assert!(msg.contains(node::IDENTIFIER)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn typed_accessors_reject_mismatched_variants() {
        let mut bus = ParameterBus::new();
        bus.append(node::BACKUP_SIZE, Value::Int(8192)).unwrap();

        assert_eq!(bus.get_int(node::BACKUP_SIZE), Some(8192));
        assert_eq!(bus.get_str(node::BACKUP_SIZE), None);
    }
}
