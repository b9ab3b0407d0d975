//! Python semantic post-processor: consumes a cooked, FQN-annotated AST
//! from an upstream parser and emits Kythe-compatible facts and edges.
//!
//! Pipeline, leaves first:
//!
//! - [`ir`]: the AST simplifier — tagged JSON into a closed IR.
//! - [`types`]: the `TypeTerm`/`UnionType`/`Deferred` lattice both passes
//!   operate on.
//! - [`extractor`]: Pass 1, the anchor extractor.
//! - [`symtab`]: the FQN -> union-type symbol table and its reject list.
//! - [`evaluator`]: Pass 2, resolving deferred expressions against the
//!   symbol table.
//! - [`fixpoint`]: the pass loop driving Pass 2 to a fixpoint.
//! - [`imports`]: `from`/relative-import resolution rules.
//! - [`meta`]: the `Meta` record and per-file context derived from it.
//! - [`parser`]: the upstream parser subprocess adapter.
//! - [`emitter`]: final symbol-table snapshot plus NDJSON output.
//! - [`cli`]: argument parsing and pipeline orchestration.

pub mod cli;
pub mod emitter;
pub mod evaluator;
pub mod extractor;
pub mod fixpoint;
pub mod imports;
pub mod ir;
pub mod meta;
pub mod parser;
pub mod symtab;
pub mod types;
