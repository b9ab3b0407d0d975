//! Pass 2: the evaluator.
//!
//! Interprets a [`Deferred`] obligation against a symbol-table snapshot,
//! producing Kythe edges (attribute/import references) and registration
//! attempts. The evaluator never mutates the table directly — every
//! registration attempt is classified by
//! [`SymbolTable::classify_registration`] and queued into `rejects`, which
//! the fixpoint driver merges at the pass boundary. The evaluator never
//! errors on ordinary semantic ambiguity; it records rejects and lets the
//! fixpoint decide.

use pykythe_core::error::Result;
use pykythe_core::vname::{FactStore, VName};

use crate::meta::FileContext;
use crate::symtab::{Reject, SymbolTable};
use crate::types::{Deferred, DotEdgeKind, TypeTerm, UnionType};

/// Evaluate a single type term structurally, without resolving `fqn`
/// references against the symbol table: `fqn(F)` evaluates to `{fqn(F)}`
/// verbatim here, and only `eval_union_and_lookup` resolves it further.
pub fn eval_single(
    term: &TypeTerm,
    ctx: &FileContext,
    facts: &mut FactStore,
    rejects: &mut Vec<Reject>,
    symtab: &SymbolTable,
) -> Result<UnionType> {
    match term {
        TypeTerm::Fqn(f) => Ok(UnionType::single(TypeTerm::Fqn(f.clone()))),

        TypeTerm::Dot(atom, astn, edge_kind) => {
            let resolved = eval_union_and_lookup(atom, ctx, facts, rejects, symtab)?;
            let mut out = UnionType::empty();
            for t in resolved.iter() {
                match t {
                    TypeTerm::Class(class_fqn, _bases) => {
                        let attr_fqn = format!("{class_fqn}.{}", astn.value);
                        out.insert(TypeTerm::Fqn(attr_fqn.clone()));
                        emit_dot_edge(ctx, facts, astn.start, astn.end, *edge_kind, &attr_fqn)?;
                    }
                    TypeTerm::Import(_, path) => {
                        let target = format!("{path}::{}", astn.value);
                        emit_dot_edge(ctx, facts, astn.start, astn.end, *edge_kind, &target)?;
                    }
                    _ => {}
                }
            }
            Ok(out)
        }

        TypeTerm::Call(atom, args) => {
            let resolved = eval_union_and_lookup(atom, ctx, facts, rejects, symtab)?;
            let eval_args = eval_args_union(args, ctx, facts, rejects, symtab)?;
            let mut out = UnionType::empty();
            for t in resolved.iter() {
                match t {
                    TypeTerm::Class(fqn, bases) => {
                        out.insert(TypeTerm::Class(fqn.clone(), bases.clone()));
                    }
                    TypeTerm::Func(_, ret) => {
                        out = out.union(ret);
                    }
                    other => {
                        // Opaque application: `other` isn't a real FQN here,
                        // just a marker for "called something of this shape".
                        out.insert(TypeTerm::Func(
                            other.to_string(),
                            Box::new(eval_args.clone()),
                        ));
                    }
                }
            }
            Ok(out)
        }

        TypeTerm::Class(fqn, bases) => {
            let mut evaluated_bases = Vec::with_capacity(bases.len());
            for base in bases {
                evaluated_bases.push(eval_union_and_lookup(base, ctx, facts, rejects, symtab)?);
            }
            Ok(UnionType::single(TypeTerm::Class(
                fqn.clone(),
                evaluated_bases,
            )))
        }

        TypeTerm::Func(fqn, ret) => {
            let evaluated_ret = eval_union_and_lookup(ret, ctx, facts, rejects, symtab)?;
            Ok(UnionType::single(TypeTerm::Func(
                fqn.clone(),
                Box::new(evaluated_ret),
            )))
        }

        TypeTerm::Import(fqn, path) => Ok(UnionType::single(TypeTerm::Import(
            fqn.clone(),
            path.clone(),
        ))),

        TypeTerm::Var(fqn) => Ok(UnionType::single(TypeTerm::Var(fqn.clone()))),

        TypeTerm::Ellipsis
        | TypeTerm::Omitted
        | TypeTerm::Star
        | TypeTerm::TodoX(_)
        | TypeTerm::CallOp(_, _) => Ok(UnionType::empty()),
    }
}

fn emit_dot_edge(
    ctx: &FileContext,
    facts: &mut FactStore,
    start: usize,
    end: usize,
    edge_kind: DotEdgeKind,
    target_fqn: &str,
) -> Result<()> {
    let anchor = VName::anchor(&ctx.corpus, &ctx.root, &ctx.path, start, end);
    facts.put_fact(
        anchor.clone(),
        pykythe_core::vname::NODE_KIND,
        pykythe_core::vname::base64_encode("anchor"),
    );
    facts.put_fact(
        anchor.clone(),
        pykythe_core::vname::LOC_START,
        pykythe_core::vname::base64_encode(start.to_string()),
    );
    facts.put_fact(
        anchor.clone(),
        pykythe_core::vname::LOC_END,
        pykythe_core::vname::base64_encode(end.to_string()),
    );
    let target = VName::node(&ctx.corpus, &ctx.root, &ctx.language, target_fqn);
    facts.put_edge(anchor, edge_kind.kythe_edge_name(), target)
}

/// Evaluate every term of a union and flatten the results.
pub fn eval_union(
    union: &UnionType,
    ctx: &FileContext,
    facts: &mut FactStore,
    rejects: &mut Vec<Reject>,
    symtab: &SymbolTable,
) -> Result<UnionType> {
    let mut out = UnionType::empty();
    for term in union.iter() {
        let evaluated = eval_single(term, ctx, facts, rejects, symtab)?;
        out = out.union(&evaluated);
    }
    Ok(out)
}

/// `eval_union` followed by resolving any resulting `fqn(F)` terms against
/// the symbol table.
pub fn eval_union_and_lookup(
    union: &UnionType,
    ctx: &FileContext,
    facts: &mut FactStore,
    rejects: &mut Vec<Reject>,
    symtab: &SymbolTable,
) -> Result<UnionType> {
    let evaluated = eval_union(union, ctx, facts, rejects, symtab)?;
    let mut out = UnionType::empty();
    for term in evaluated.iter() {
        if let TypeTerm::Fqn(f) = term {
            out = out.union(&eval_lookup(f, symtab, rejects));
        } else {
            out.insert(term.clone());
        }
    }
    Ok(out)
}

fn eval_args_union(
    args: &[UnionType],
    ctx: &FileContext,
    facts: &mut FactStore,
    rejects: &mut Vec<Reject>,
    symtab: &SymbolTable,
) -> Result<UnionType> {
    let mut out = UnionType::empty();
    for arg in args {
        out = out.union(&eval_union_and_lookup(arg, ctx, facts, rejects, symtab)?);
    }
    Ok(out)
}

/// Look up `fqn` in the symbol table. If absent, register it with a
/// provisional `{fqn(F)}` union via the reject channel and return that
/// provisional union.
pub fn eval_lookup(fqn: &str, symtab: &SymbolTable, rejects: &mut Vec<Reject>) -> UnionType {
    if let Some(existing) = symtab.get(fqn) {
        return existing.clone();
    }
    let term = TypeTerm::Fqn(fqn.to_string());
    if let Some(reject) = symtab.classify_registration(fqn, &term) {
        rejects.push(reject);
    }
    UnionType::single(term)
}

/// Evaluate one deferred expression obligation, mutating `facts` and
/// `rejects` in place.
pub fn eval_deferred(
    item: &Deferred,
    ctx: &FileContext,
    facts: &mut FactStore,
    rejects: &mut Vec<Reject>,
    symtab: &SymbolTable,
) -> Result<()> {
    match item {
        Deferred::Assign { lhs, rhs } => {
            let rhs_eval = eval_union_and_lookup(rhs, ctx, facts, rejects, symtab)?;
            let lhs_eval = eval_union(lhs, ctx, facts, rejects, symtab)?;
            if let Some(TypeTerm::Fqn(f)) = lhs_eval.as_single() {
                register_union(f, &rhs_eval, symtab, rejects);
            }
        }
        Deferred::Expr(expr) => {
            eval_union_and_lookup(expr, ctx, facts, rejects, symtab)?;
        }
        Deferred::ClassDecl { fqn, bases } => {
            let term = TypeTerm::Class(fqn.clone(), bases.clone());
            register_term(fqn, term, symtab, rejects);
        }
        Deferred::FuncDecl { fqn, ret } => {
            let term = TypeTerm::Func(fqn.clone(), Box::new(ret.clone()));
            register_term(fqn, term, symtab, rejects);
        }
        Deferred::ImportFrom { path, fqn } => {
            let term = TypeTerm::Import(fqn.clone(), path.clone());
            register_term(fqn, term, symtab, rejects);
        }
    }
    Ok(())
}

fn register_term(fqn: &str, term: TypeTerm, symtab: &SymbolTable, rejects: &mut Vec<Reject>) {
    if let Some(reject) = symtab.classify_registration(fqn, &term) {
        rejects.push(reject);
    }
}

fn register_union(fqn: &str, union: &UnionType, symtab: &SymbolTable, rejects: &mut Vec<Reject>) {
    for term in union.iter() {
        register_term(fqn, term.clone(), symtab, rejects);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Astn;

    fn test_ctx() -> FileContext {
        FileContext {
            corpus: "c".to_string(),
            root: "r".to_string(),
            path: "mod.py".to_string(),
            language: "python".to_string(),
            contents: String::new(),
        }
    }

    #[test]
    fn fqn_eval_single_is_identity() {
        let ctx = test_ctx();
        let mut facts = FactStore::new();
        let mut rejects = Vec::new();
        let symtab = SymbolTable::with_builtins();
        let result = eval_single(
            &TypeTerm::Fqn("mod.x".to_string()),
            &ctx,
            &mut facts,
            &mut rejects,
            &symtab,
        )
        .unwrap();
        assert_eq!(result, UnionType::single(TypeTerm::Fqn("mod.x".to_string())));
    }

    #[test]
    fn dot_on_class_emits_anchor_and_edge_and_yields_attr_fqn() {
        let ctx = test_ctx();
        let mut facts = FactStore::new();
        let mut rejects = Vec::new();
        let symtab = SymbolTable::with_builtins();
        let atom = UnionType::single(TypeTerm::Class("mod.C".to_string(), Vec::new()));
        let dot = TypeTerm::Dot(
            Box::new(atom),
            Astn::new(10, 11, "x"),
            DotEdgeKind::Ref,
        );
        let result = eval_single(&dot, &ctx, &mut facts, &mut rejects, &symtab).unwrap();
        assert_eq!(
            result,
            UnionType::single(TypeTerm::Fqn("mod.C.x".to_string()))
        );
        assert_eq!(facts.records().len(), 4); // node/kind + loc/start + loc/end facts + 1 edge
    }

    #[test]
    fn lookup_of_absent_fqn_registers_a_reject() {
        let symtab = SymbolTable::new();
        let mut rejects = Vec::new();
        let union = eval_lookup("mod.y", &symtab, &mut rejects);
        assert_eq!(rejects.len(), 1);
        assert_eq!(union, UnionType::single(TypeTerm::Fqn("mod.y".to_string())));
    }

    #[test]
    fn call_on_func_yields_return_union() {
        let ctx = test_ctx();
        let mut facts = FactStore::new();
        let mut rejects = Vec::new();
        let mut symtab = SymbolTable::new();
        symtab.merge_rejects(&[Reject {
            fqn: "mod.f".to_string(),
            term: TypeTerm::Func(
                "mod.f".to_string(),
                Box::new(UnionType::single(TypeTerm::Class(
                    "builtin.str".to_string(),
                    Vec::new(),
                ))),
            ),
        }]);
        let call = TypeTerm::Call(
            Box::new(UnionType::single(TypeTerm::Fqn("mod.f".to_string()))),
            Vec::new(),
        );
        let result = eval_single(&call, &ctx, &mut facts, &mut rejects, &symtab).unwrap();
        assert_eq!(
            result,
            UnionType::single(TypeTerm::Class("builtin.str".to_string(), Vec::new()))
        );
    }
}
