//! Kythe wire types: `VName`, facts, edges, and the de-duplicating store.
//!
//! A [`VName`] is Kythe's node identifier tuple. Anchor VNames carry a
//! `"@start:end"` signature; declaration/reference-target VNames carry the
//! FQN as their signature and a `language` tag but omit `path`. Fields that
//! would serialize empty are omitted entirely from the wire form.

use std::collections::BTreeMap;

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::PykytheError;

/// A Kythe node identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VName {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub corpus: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub root: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl VName {
    /// The VName of the file itself: no signature, carries `path`.
    pub fn file(corpus: &str, root: &str, path: &str) -> Self {
        VName {
            corpus: corpus.to_string(),
            root: root.to_string(),
            path: Some(path.to_string()),
            language: None,
            signature: None,
        }
    }

    /// An anchor VName for the byte span `[start, end)`.
    pub fn anchor(corpus: &str, root: &str, path: &str, start: usize, end: usize) -> Self {
        VName {
            corpus: corpus.to_string(),
            root: root.to_string(),
            path: Some(path.to_string()),
            language: None,
            signature: Some(format!("@{start}:{end}")),
        }
    }

    /// A node VName addressed by FQN signature (no `path`).
    pub fn node(corpus: &str, root: &str, language: &str, fqn: &str) -> Self {
        VName {
            corpus: corpus.to_string(),
            root: root.to_string(),
            path: None,
            language: Some(language.to_string()),
            signature: Some(fqn.to_string()),
        }
    }
}

/// One NDJSON record: a fact or an edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Record {
    Fact {
        source: VName,
        fact_name: String,
        fact_value: String,
    },
    Edge {
        source: VName,
        edge_kind: String,
        target: VName,
        fact_name: String,
    },
}

pub fn base64_encode(bytes: impl AsRef<[u8]>) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

pub const NODE_KIND: &str = "/kythe/node/kind";
pub const SUBKIND: &str = "/kythe/subkind";
pub const LOC_START: &str = "/kythe/loc/start";
pub const LOC_END: &str = "/kythe/loc/end";
pub const TEXT: &str = "/kythe/text";
pub const SYMTAB: &str = "/kythe/x-symtab";

pub const EDGE_DEFINES_BINDING: &str = "/kythe/edge/defines/binding";
pub const EDGE_REF: &str = "/kythe/edge/ref";

/// A de-duplicating Kythe fact/edge store.
///
/// Facts are keyed by `(source, fact_name)`: first writer wins, later
/// writes with the same key are silently ignored (idempotent re-emission of
/// the same anchor/binding). Edges are keyed by `(source, edge_kind,
/// target)`: a duplicate edge key is an invariant violation and fails
/// loudly — a duplicate edge means something upstream walked the same site
/// twice.
#[derive(Debug, Default)]
pub struct FactStore {
    facts: BTreeMap<(VName, String), String>,
    edges: BTreeMap<(VName, String, VName), ()>,
    order: Vec<Record>,
}

impl FactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fact. Returns `Ok(true)` if newly inserted, `Ok(false)` if
    /// an identical `(source, fact_name)` key already existed (first-writer-
    /// wins, not an error).
    pub fn put_fact(
        &mut self,
        source: VName,
        fact_name: impl Into<String>,
        fact_value: String,
    ) -> bool {
        let fact_name = fact_name.into();
        let key = (source.clone(), fact_name.clone());
        if self.facts.contains_key(&key) {
            return false;
        }
        self.facts.insert(key, fact_value.clone());
        self.order.push(Record::Fact {
            source,
            fact_name,
            fact_value,
        });
        true
    }

    /// Insert an edge. Returns an invariant error if the `(source,
    /// edge_kind, target)` key was already present.
    pub fn put_edge(
        &mut self,
        source: VName,
        edge_kind: impl Into<String>,
        target: VName,
    ) -> crate::error::Result<()> {
        let edge_kind = edge_kind.into();
        let key = (source.clone(), edge_kind.clone(), target.clone());
        if self.edges.contains_key(&key) {
            return Err(PykytheError::invariant(format!(
                "duplicate edge: {:?} --{}--> {:?}",
                key.0, key.1, key.2
            )));
        }
        self.edges.insert(key, ());
        self.order.push(Record::Edge {
            source,
            edge_kind,
            target,
            fact_name: "/".to_string(),
        });
        Ok(())
    }

    pub fn has_fact(&self, source: &VName, fact_name: &str) -> bool {
        self.facts
            .contains_key(&(source.clone(), fact_name.to_string()))
    }

    /// Records in emission order (first-write order), for deterministic
    /// NDJSON output.
    pub fn records(&self) -> &[Record] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
