//! The symbol table: a total FQN -> `UnionType` mapping, mutated only by
//! merging rejects at a pass boundary. Within a pass the table is an
//! immutable snapshot; registration attempts during a pass are classified
//! and queued as [`Reject`]s rather than applied in place, which is what
//! makes the "entries only grow" invariant mechanically true.

use std::collections::BTreeMap;

use crate::types::{TypeTerm, UnionType};

/// A `(FQN, type)` pair whose registration during a pass was incompatible
/// with the table's current entry, deferred to the pass boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reject {
    pub fqn: String,
    pub term: TypeTerm,
}

/// FQN -> union-type mapping, seeded from built-ins and mutated only by
/// [`SymbolTable::merge_rejects`].
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: BTreeMap<String, UnionType>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            entries: BTreeMap::new(),
        }
    }

    /// Seeded with the built-in classes `builtin.str` and `builtin.Number`.
    pub fn with_builtins() -> Self {
        let mut table = SymbolTable::new();
        for fqn in builtins() {
            table
                .entries
                .insert(fqn.to_string(), UnionType::single(TypeTerm::Class(fqn.to_string(), Vec::new())));
        }
        table
    }

    pub fn get(&self, fqn: &str) -> Option<&UnionType> {
        self.entries.get(fqn)
    }

    pub fn contains(&self, fqn: &str) -> bool {
        self.entries.contains_key(fqn)
    }

    /// Iterate entries in canonical FQN order, so synthesized obligations
    /// built from them come out deterministic pass over pass.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &UnionType)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Classify a registration attempt made during a pass, without
    /// mutating the table. Returns `Some(Reject)` when the attempt must be
    /// deferred to the pass boundary; `None` when it is a no-op (identical
    /// or subset type) and needs no further action this pass.
    ///
    /// Note: "absent" registrations also yield a reject — the pass-boundary
    /// merge (`merge_rejects`) inserts them the same way a strictly-larger
    /// union would be merged, keeping a single code path for "table grows".
    pub fn classify_registration(&self, fqn: &str, term: &TypeTerm) -> Option<Reject> {
        match self.entries.get(fqn) {
            None => Some(Reject {
                fqn: fqn.to_string(),
                term: term.clone(),
            }),
            Some(existing) => {
                if existing.as_single() == Some(term) {
                    None
                } else if UnionType::single(term.clone()).is_subset_of(existing) {
                    None
                } else {
                    Some(Reject {
                        fqn: fqn.to_string(),
                        term: term.clone(),
                    })
                }
            }
        }
    }

    /// Merge a batch of rejects into the table by union, at a pass
    /// boundary. Strictly grows (or leaves equal) every touched entry,
    /// never removes or narrows one.
    pub fn merge_rejects(&mut self, rejects: &[Reject]) {
        for reject in rejects {
            let entry = self
                .entries
                .entry(reject.fqn.clone())
                .or_insert_with(UnionType::empty);
            entry.insert(reject.term.clone());
        }
    }
}

/// The initial built-in-names symbol table content: a minimal seed, not an
/// attempt at a full standard-library model.
pub fn builtins() -> &'static [&'static str] {
    &["builtin.str", "builtin.Number"]
}
