//! The fixpoint driver: repeats Pass 2 over the deferred obligations plus
//! freshly-synthesized symbol-table entries until the reject set is empty or
//! a bounded pass count is reached.

use std::collections::HashSet;

use pykythe_core::error::Result;
use pykythe_core::vname::FactStore;

use crate::evaluator::eval_deferred;
use crate::meta::FileContext;
use crate::symtab::{Reject, SymbolTable};
use crate::types::Deferred;

/// Safety backstop on pass count: the union lattice is finite (bounded by
/// observed FQNs and structural depth), so the fixpoint is guaranteed to
/// terminate on its own; this bound only guards pathological inputs.
pub const FIXPOINT_PASS_LIMIT: usize = 5;

/// Turn each non-empty symbol-table entry into a synthetic `Expr`
/// obligation, in canonical FQN order, so newly-learned types propagate
/// into further edge emission on the next pass.
fn synthesize(symtab: &SymbolTable) -> Vec<Deferred> {
    symtab
        .iter()
        .filter(|(_, union)| !union.is_empty())
        .map(|(_, union)| Deferred::Expr(union.clone()))
        .collect()
}

/// Concatenate `deferred` (source order) with `synthesized` (canonical FQN
/// order) and drop later duplicates, preserving first-occurrence order.
fn combine_and_dedup(deferred: &[Deferred], synthesized: Vec<Deferred>) -> Vec<Deferred> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(deferred.len() + synthesized.len());
    for item in deferred.iter().cloned().chain(synthesized) {
        if seen.insert(item.clone()) {
            out.push(item);
        }
    }
    out
}

/// Result of running the fixpoint to completion.
pub struct FixpointOutput {
    pub facts: FactStore,
    pub symtab: SymbolTable,
    pub passes_run: usize,
}

/// Run the fixpoint driver: `pass1_facts` seeds every pass's accumulator
/// (Pass 1's anchor/binding facts are never re-derived, only added to),
/// `deferred` is Pass 1's accumulated obligation list, and `symtab` starts
/// pre-seeded with built-ins plus whatever Pass 1's `ClassDecl`/`FuncDecl`/
/// `ImportFrom` declarations already forced in before the loop begins would
/// need a first pass to register — so an initially-empty table is fine; the
/// first pass's declarations flow through `deferred` like everything else.
pub fn run(
    ctx: &FileContext,
    pass1_facts: &FactStore,
    deferred: &[Deferred],
    mut symtab: SymbolTable,
) -> Result<FixpointOutput> {
    let mut last_facts = clone_facts(pass1_facts);
    let mut passes_run = 0;

    for _ in 0..FIXPOINT_PASS_LIMIT {
        passes_run += 1;
        let mut pass_facts = clone_facts(pass1_facts);
        let synthesized = synthesize(&symtab);
        let combined = combine_and_dedup(deferred, synthesized);

        let mut rejects: Vec<Reject> = Vec::new();
        for item in &combined {
            eval_deferred(item, ctx, &mut pass_facts, &mut rejects, &symtab)?;
        }

        last_facts = pass_facts;
        let done = rejects.is_empty();
        symtab.merge_rejects(&rejects);
        if done {
            break;
        }
    }

    Ok(FixpointOutput {
        facts: last_facts,
        symtab,
        passes_run,
    })
}

/// `FactStore` doesn't derive `Clone` (it isn't needed outside this loop);
/// rebuild one from another's records instead of widening the public API
/// for a single internal caller.
fn clone_facts(source: &FactStore) -> FactStore {
    let mut copy = FactStore::new();
    for record in source.records() {
        match record {
            pykythe_core::vname::Record::Fact {
                source,
                fact_name,
                fact_value,
            } => {
                copy.put_fact(source.clone(), fact_name.clone(), fact_value.clone());
            }
            pykythe_core::vname::Record::Edge {
                source,
                edge_kind,
                target,
                ..
            } => {
                // Pass 1 facts are internally consistent (no duplicate
                // edges); re-inserting them into a fresh store cannot fail.
                copy.put_edge(source.clone(), edge_kind.clone(), target.clone())
                    .expect("pass1 facts re-insert into fresh store");
            }
        }
    }
    copy
}
