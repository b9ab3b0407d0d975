//! AST simplifier: converts a tagged-JSON value tree into a
//! closed IR with no semantic interpretation. Container objects carry
//! `kind` + `slots`; leaf objects collapse to `str`/`int`/`bool`/`none`/
//! `dict`. This module purely reshapes structure — the anchor extractor
//! (`crate::extractor`) is the first place that gives `kind` strings
//! meaning.

use serde_json::Value;
use std::collections::BTreeMap;

use pykythe_core::error::{PykytheError, Result};

/// A child slot: either a single node or a source-ordered list of nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Single(Node),
    List(Vec<Node>),
}

/// The simplified IR. `Tagged` is a container (originally `kind` + `slots`);
/// the other variants are collapsed leaves.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Tagged {
        kind: String,
        slots: BTreeMap<String, Slot>,
    },
    Str(String),
    Int(i64),
    Bool(bool),
    NoneVal,
    /// An opaque `dict`-kind leaf: structure the simplifier does not
    /// interpret further.
    Dict(Value),
}

impl Node {
    pub fn kind(&self) -> Option<&str> {
        match self {
            Node::Tagged { kind, .. } => Some(kind.as_str()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Node::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// The named slot as a single node, if present and not a list.
    pub fn slot(&self, name: &str) -> Option<&Node> {
        match self {
            Node::Tagged { slots, .. } => match slots.get(name) {
                Some(Slot::Single(n)) => Some(n),
                _ => None,
            },
            _ => None,
        }
    }

    /// The named slot as a list, in source order. Missing slots yield an
    /// empty list; a `Single` slot is treated as a one-element list so
    /// callers don't need to special-case arity.
    pub fn slot_list<'a>(&'a self, name: &str) -> Vec<&'a Node> {
        match self {
            Node::Tagged { slots, .. } => match slots.get(name) {
                Some(Slot::List(items)) => items.iter().collect(),
                Some(Slot::Single(n)) => vec![n],
                None => Vec::new(),
            },
            _ => Vec::new(),
        }
    }
}

/// Convert a raw JSON value tree into the simplified IR.
///
/// `{"kind": "str", "value": V}` -> `Node::Str(V)`, and similarly for
/// `int`/`bool`/`None`/`dict`. Anything else with a `kind` and `slots` map
/// becomes `Node::Tagged`. A JSON array as a slot's value becomes a
/// `Slot::List` (source order preserved); any other JSON value becomes a
/// `Slot::Single`.
pub fn simplify(value: &Value) -> Result<Node> {
    let obj = value.as_object().ok_or_else(|| {
        PykytheError::parser(format!("expected JSON object in cooked AST, got {value}"))
    })?;
    let kind = obj
        .get("kind")
        .and_then(Value::as_str)
        .ok_or_else(|| PykytheError::parser("AST node missing 'kind' discriminator"))?;

    match kind {
        "str" => {
            let s = obj
                .get("value")
                .and_then(Value::as_str)
                .ok_or_else(|| PykytheError::parser("str node missing string 'value'"))?;
            Ok(Node::Str(s.to_string()))
        }
        "int" => {
            let n = obj
                .get("value")
                .and_then(Value::as_i64)
                .ok_or_else(|| PykytheError::parser("int node missing integer 'value'"))?;
            Ok(Node::Int(n))
        }
        "bool" => {
            let b = obj
                .get("value")
                .and_then(Value::as_bool)
                .ok_or_else(|| PykytheError::parser("bool node missing boolean 'value'"))?;
            Ok(Node::Bool(b))
        }
        "None" => Ok(Node::NoneVal),
        "dict" => Ok(Node::Dict(obj.get("value").cloned().unwrap_or(Value::Null))),
        _ => {
            let mut slots = BTreeMap::new();
            if let Some(raw_slots) = obj.get("slots").and_then(Value::as_object) {
                for (name, child) in raw_slots {
                    let slot = if let Some(items) = child.as_array() {
                        let mut nodes = Vec::with_capacity(items.len());
                        for item in items {
                            nodes.push(simplify(item)?);
                        }
                        Slot::List(nodes)
                    } else {
                        Slot::Single(simplify(child)?)
                    };
                    slots.insert(name.clone(), slot);
                }
            }
            Ok(Node::Tagged {
                kind: kind.to_string(),
                slots,
            })
        }
    }
}
