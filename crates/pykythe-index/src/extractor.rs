//! Pass 1: the anchor extractor.
//!
//! A structural recursion over [`Node`] values: every case returns a type
//! term describing the node's value, and accumulates Kythe anchor/binding
//! facts plus [`Deferred`] expression obligations along the way. This is
//! purely the "fast" half of the engine — attribute/call resolution is left
//! to the deferred obligations Pass 2 (`crate::evaluator`) resolves.

use pykythe_core::error::{PykytheError, Result};
use pykythe_core::vname::{FactStore, VName};

use crate::imports::{resolve_from_import, ImportTarget};
use crate::ir::Node;
use crate::meta::FileContext;
use crate::types::{Astn, Deferred, DotEdgeKind, TypeTerm, UnionType};

/// What kind of declared symbol a binding site introduces, for the
/// `/kythe/node/kind` fact stamped on the target.
#[derive(Debug, Clone, Copy)]
enum DeclKind {
    Variable,
    Function,
    Record,
}

impl DeclKind {
    fn kythe_value(self) -> &'static str {
        match self {
            DeclKind::Variable => "variable",
            DeclKind::Function => "function",
            DeclKind::Record => "record",
        }
    }
}

/// Output of running Pass 1 over a whole module.
pub struct ExtractOutput {
    pub facts: FactStore,
    pub deferred: Vec<Deferred>,
}

/// Extract anchor/binding facts and deferred obligations for the whole
/// cooked AST rooted at `root`. Also stamps the file's own Kythe facts:
/// `/kythe/node/kind = file` and `/kythe/text`.
pub fn extract_module(root: &Node, ctx: &FileContext) -> Result<ExtractOutput> {
    let mut facts = FactStore::new();
    let file_vname = VName::file(&ctx.corpus, &ctx.root, &ctx.path);
    facts.put_fact(
        file_vname.clone(),
        pykythe_core::vname::NODE_KIND,
        pykythe_core::vname::base64_encode("file"),
    );
    facts.put_fact(
        file_vname,
        pykythe_core::vname::TEXT,
        pykythe_core::vname::base64_encode(&ctx.contents),
    );

    let mut deferred = Vec::new();
    extract_node(root, ctx, &mut facts, &mut deferred)?;
    Ok(ExtractOutput { facts, deferred })
}

fn read_astn(node: &Node) -> Result<Astn> {
    let start = node
        .slot("start")
        .and_then(Node::as_int)
        .ok_or_else(|| PykytheError::parser("Astn node missing integer 'start'"))? as usize;
    let end = node
        .slot("end")
        .and_then(Node::as_int)
        .ok_or_else(|| PykytheError::parser("Astn node missing integer 'end'"))? as usize;
    let value = node.slot("value").and_then(Node::as_str).unwrap_or("");
    Ok(Astn::new(start, end, value))
}

fn required_str<'a>(node: &'a Node, slot: &str) -> Result<&'a str> {
    node.slot(slot)
        .and_then(Node::as_str)
        .ok_or_else(|| PykytheError::parser(format!("node missing string slot '{slot}'")))
}

fn emit_anchor_facts(ctx: &FileContext, facts: &mut FactStore, astn: &Astn) -> VName {
    let anchor = VName::anchor(&ctx.corpus, &ctx.root, &ctx.path, astn.start, astn.end);
    facts.put_fact(
        anchor.clone(),
        pykythe_core::vname::NODE_KIND,
        pykythe_core::vname::base64_encode("anchor"),
    );
    facts.put_fact(
        anchor.clone(),
        pykythe_core::vname::LOC_START,
        pykythe_core::vname::base64_encode(astn.start.to_string()),
    );
    facts.put_fact(
        anchor.clone(),
        pykythe_core::vname::LOC_END,
        pykythe_core::vname::base64_encode(astn.end.to_string()),
    );
    anchor
}

/// Emit an anchor at `astn`, a `defines/binding` edge to `target_fqn`, and
/// the target's own `/kythe/node/kind` (and `/kythe/subkind = class` when
/// `decl == Record` and `is_class`).
fn emit_binding(
    ctx: &FileContext,
    facts: &mut FactStore,
    astn: &Astn,
    target_fqn: &str,
    decl: DeclKind,
    is_class: bool,
) -> Result<()> {
    let anchor = emit_anchor_facts(ctx, facts, astn);
    let target = VName::node(&ctx.corpus, &ctx.root, &ctx.language, target_fqn);
    facts.put_fact(
        target.clone(),
        pykythe_core::vname::NODE_KIND,
        pykythe_core::vname::base64_encode(decl.kythe_value()),
    );
    if is_class {
        facts.put_fact(
            target.clone(),
            pykythe_core::vname::SUBKIND,
            pykythe_core::vname::base64_encode("class"),
        );
    }
    facts.put_edge(
        anchor,
        pykythe_core::vname::EDGE_DEFINES_BINDING,
        target,
    )
}

/// Emit an anchor at `astn` and a `ref` edge to `target_fqn`.
fn emit_ref(ctx: &FileContext, facts: &mut FactStore, astn: &Astn, target_fqn: &str) -> Result<()> {
    let anchor = emit_anchor_facts(ctx, facts, astn);
    let target = VName::node(&ctx.corpus, &ctx.root, &ctx.language, target_fqn);
    facts.put_edge(anchor, pykythe_core::vname::EDGE_REF, target)
}

fn parent_dir(path: &str) -> String {
    std::path::Path::new(path)
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn stmt_tag(name: &str) -> UnionType {
    UnionType::single(TypeTerm::TodoX(format!("stmt_{name}")))
}

/// Every recognized `kind` implements its own node rule; anything else falls
/// through to the `TodoX` catch-all, so adding a new node kind upstream
/// never forces a change here or in the evaluator.
pub fn extract_node(
    node: &Node,
    ctx: &FileContext,
    facts: &mut FactStore,
    deferred: &mut Vec<Deferred>,
) -> Result<UnionType> {
    let kind = match node.kind() {
        Some(k) => k,
        None => return Ok(UnionType::single(TypeTerm::TodoX("leaf".to_string()))),
    };

    match kind {
        "NameBindsFqn" => {
            let fqn = required_str(node, "fqn")?.to_string();
            let astn = read_astn(node.slot("astn").ok_or_else(|| {
                PykytheError::parser("NameBindsFqn missing 'astn' slot")
            })?)?;
            emit_binding(ctx, facts, &astn, &fqn, DeclKind::Variable, false)?;
            Ok(UnionType::single(TypeTerm::Fqn(fqn)))
        }

        "NameRefFqn" => {
            let fqn = required_str(node, "fqn")?.to_string();
            let astn = read_astn(node.slot("astn").ok_or_else(|| {
                PykytheError::parser("NameRefFqn missing 'astn' slot")
            })?)?;
            emit_ref(ctx, facts, &astn, &fqn)?;
            Ok(UnionType::single(TypeTerm::Fqn(fqn)))
        }

        "Class" => {
            let fqn = required_str(node, "fqn")?.to_string();
            let astn = read_astn(
                node.slot("astn")
                    .ok_or_else(|| PykytheError::parser("Class missing 'astn' slot"))?,
            )?;
            emit_binding(ctx, facts, &astn, &fqn, DeclKind::Record, true)?;

            let mut bases = Vec::new();
            for base_node in node.slot_list("bases") {
                bases.push(extract_node(base_node, ctx, facts, deferred)?);
            }
            for body_stmt in node.slot_list("body") {
                extract_node(body_stmt, ctx, facts, deferred)?;
            }
            deferred.push(Deferred::ClassDecl {
                fqn: fqn.clone(),
                bases: bases.clone(),
            });
            Ok(UnionType::single(TypeTerm::Class(fqn, bases)))
        }

        "Func" => {
            let fqn = required_str(node, "fqn")?.to_string();
            let astn = read_astn(
                node.slot("astn")
                    .ok_or_else(|| PykytheError::parser("Func missing 'astn' slot"))?,
            )?;
            emit_binding(ctx, facts, &astn, &fqn, DeclKind::Function, false)?;

            let ret = match node.slot("return") {
                Some(ret_node) => extract_node(ret_node, ctx, facts, deferred)?,
                None => UnionType::single(TypeTerm::Omitted),
            };
            for param in node.slot_list("params") {
                extract_node(param, ctx, facts, deferred)?;
            }
            for body_stmt in node.slot_list("body") {
                extract_node(body_stmt, ctx, facts, deferred)?;
            }
            deferred.push(Deferred::FuncDecl {
                fqn: fqn.clone(),
                ret: ret.clone(),
            });
            Ok(UnionType::single(TypeTerm::Func(fqn, Box::new(ret))))
        }

        "AtomDotNode" => {
            let atom_node = node
                .slot("atom")
                .ok_or_else(|| PykytheError::parser("AtomDotNode missing 'atom' slot"))?;
            let atom = extract_node(atom_node, ctx, facts, deferred)?;
            let attr = read_astn(
                node.slot("attr")
                    .ok_or_else(|| PykytheError::parser("AtomDotNode missing 'attr' slot"))?,
            )?;
            let binds = node.slot("binds").and_then(Node::as_bool).unwrap_or(false);
            Ok(UnionType::single(TypeTerm::Dot(
                Box::new(atom),
                attr,
                DotEdgeKind::from_binds(binds),
            )))
        }

        "AtomCallNode" => {
            let atom_node = node
                .slot("atom")
                .ok_or_else(|| PykytheError::parser("AtomCallNode missing 'atom' slot"))?;
            let atom = extract_node(atom_node, ctx, facts, deferred)?;
            let mut args = Vec::new();
            for arg_node in node.slot_list("args") {
                args.push(extract_node(arg_node, ctx, facts, deferred)?);
            }
            Ok(UnionType::single(TypeTerm::Call(Box::new(atom), args)))
        }

        "NumberNode" => Ok(UnionType::single(TypeTerm::Class(
            "builtin.Number".to_string(),
            Vec::new(),
        ))),

        "StringNode" => Ok(UnionType::single(TypeTerm::Class(
            "builtin.str".to_string(),
            Vec::new(),
        ))),

        "AssignExprStmt" => {
            let lhs_node = node
                .slot("lhs")
                .ok_or_else(|| PykytheError::parser("AssignExprStmt missing 'lhs' slot"))?;
            let rhs_node = node
                .slot("rhs")
                .ok_or_else(|| PykytheError::parser("AssignExprStmt missing 'rhs' slot"))?;
            let lhs = extract_node(lhs_node, ctx, facts, deferred)?;
            let rhs = extract_node(rhs_node, ctx, facts, deferred)?;

            if lhs.as_single() == Some(&TypeTerm::Omitted) {
                // Discarded: the assignment target carries no information.
            } else if matches!(
                rhs.as_single(),
                Some(&TypeTerm::Omitted) | Some(&TypeTerm::Ellipsis)
            ) {
                deferred.push(Deferred::Assign {
                    lhs,
                    rhs: UnionType::empty(),
                });
            } else {
                deferred.push(Deferred::Assign { lhs, rhs });
            }
            Ok(stmt_tag("assign"))
        }

        "ExprStmt" => {
            let expr_node = node
                .slot("expr")
                .ok_or_else(|| PykytheError::parser("ExprStmt missing 'expr' slot"))?;
            let expr = extract_node(expr_node, ctx, facts, deferred)?;
            deferred.push(Deferred::Expr(expr));
            Ok(stmt_tag("expr"))
        }

        "EllipsisNode" => Ok(UnionType::single(TypeTerm::Ellipsis)),
        "OmittedNode" => Ok(UnionType::single(TypeTerm::Omitted)),
        "StarNode" => Ok(UnionType::single(TypeTerm::Star)),

        "ImportFromStmt" => {
            extract_import_from(node, ctx, facts, deferred)?;
            Ok(stmt_tag("import_from"))
        }

        "PassStmt" => Ok(stmt_tag("pass")),
        "BreakStmt" => Ok(stmt_tag("break")),

        "Module" => {
            for stmt in node.slot_list("body") {
                extract_node(stmt, ctx, facts, deferred)?;
            }
            Ok(stmt_tag("module"))
        }

        other => Ok(UnionType::single(TypeTerm::TodoX(other.to_string()))),
    }
}

fn extract_import_from(
    node: &Node,
    ctx: &FileContext,
    facts: &mut FactStore,
    deferred: &mut Vec<Deferred>,
) -> Result<()> {
    let dots = node.slot("dots").and_then(Node::as_int).unwrap_or(0) as usize;
    let module = node.slot("module").and_then(Node::as_str).unwrap_or("");
    let is_star = node
        .slot("is_star")
        .and_then(Node::as_bool)
        .unwrap_or(false);
    let file_dir = parent_dir(&ctx.path);

    if is_star {
        // `from M import *`: anchor and `ref` edge to the star's own
        // `Path/*` target, but no symbol-table entry is seeded and no
        // `Deferred::ImportFrom` is pushed, since `*` is not a real FQN and
        // is never expanded into individual bindings.
        if let Some(ImportTarget::Star { path }) =
            resolve_from_import(dots, module, &file_dir, &[], true).into_iter().next()
        {
            let astn_node = node.slot("astn").ok_or_else(|| {
                PykytheError::parser("ImportFromStmt with is_star missing 'astn' slot")
            })?;
            let astn = read_astn(astn_node)?;
            emit_ref(ctx, facts, &astn, &path)?;
        }
        return Ok(());
    }

    let mut pairs = Vec::new();
    for alias in node.slot_list("names") {
        let name = required_str(alias, "name")?.to_string();
        let fqn = required_str(alias, "fqn")?.to_string();
        if let Some(astn_node) = alias.slot("astn") {
            let astn = read_astn(astn_node)?;
            emit_binding(ctx, facts, &astn, &fqn, DeclKind::Variable, false)?;
        }
        pairs.push((name, fqn));
    }

    let targets = resolve_from_import(dots, module, &file_dir, &pairs, false);
    for target in targets {
        if let ImportTarget::Named { path, bound_fqn } = target {
            deferred.push(Deferred::ImportFrom {
                path,
                fqn: bound_fqn,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::simplify;
    use serde_json::json;

    fn test_ctx() -> FileContext {
        FileContext {
            corpus: "c".to_string(),
            root: "r".to_string(),
            path: "mod.py".to_string(),
            language: "python".to_string(),
            contents: "self.x = 'a'\n".to_string(),
        }
    }

    fn astn_json(start: usize, end: usize, value: &str) -> serde_json::Value {
        json!({"kind": "Astn", "slots": {
            "start": {"kind": "int", "value": start},
            "end": {"kind": "int", "value": end},
            "value": {"kind": "str", "value": value}
        }})
    }

    #[test]
    fn name_binds_fqn_emits_binding_anchor() {
        let ctx = test_ctx();
        let raw = json!({
            "kind": "NameBindsFqn",
            "slots": {
                "fqn": {"kind": "str", "value": "mod.C.x"},
                "astn": astn_json(5, 13, "self.x")
            }
        });
        let node = simplify(&raw).unwrap();
        let mut facts = FactStore::new();
        let mut deferred = Vec::new();
        let result = extract_node(&node, &ctx, &mut facts, &mut deferred).unwrap();
        assert_eq!(result, UnionType::single(TypeTerm::Fqn("mod.C.x".to_string())));
        // anchor facts (node/kind, loc/start, loc/end) + target node/kind + defines/binding edge
        assert_eq!(facts.len(), 5);
    }

    #[test]
    fn assign_with_omitted_lhs_is_discarded() {
        let ctx = test_ctx();
        let raw = json!({
            "kind": "AssignExprStmt",
            "slots": {
                "lhs": {"kind": "OmittedNode", "slots": {}},
                "rhs": {"kind": "StringNode", "slots": {}}
            }
        });
        let node = simplify(&raw).unwrap();
        let mut facts = FactStore::new();
        let mut deferred = Vec::new();
        extract_node(&node, &ctx, &mut facts, &mut deferred).unwrap();
        assert!(deferred.is_empty());
    }

    #[test]
    fn assign_with_ellipsis_rhs_yields_empty_union() {
        let ctx = test_ctx();
        let raw = json!({
            "kind": "AssignExprStmt",
            "slots": {
                "lhs": {
                    "kind": "NameBindsFqn",
                    "slots": {"fqn": {"kind": "str", "value": "mod.x"}, "astn": astn_json(0, 1, "x")}
                },
                "rhs": {"kind": "EllipsisNode", "slots": {}}
            }
        });
        let node = simplify(&raw).unwrap();
        let mut facts = FactStore::new();
        let mut deferred = Vec::new();
        extract_node(&node, &ctx, &mut facts, &mut deferred).unwrap();
        assert_eq!(deferred.len(), 1);
        match &deferred[0] {
            Deferred::Assign { rhs, .. } => assert!(rhs.is_empty()),
            other => panic!("expected Assign, got {other:?}"),
        }
    }

    #[test]
    fn pass_and_break_use_distinct_tags() {
        let ctx = test_ctx();
        let mut facts = FactStore::new();
        let mut deferred = Vec::new();

        let pass_node = simplify(&json!({"kind": "PassStmt", "slots": {}})).unwrap();
        let break_node = simplify(&json!({"kind": "BreakStmt", "slots": {}})).unwrap();
        let pass_result = extract_node(&pass_node, &ctx, &mut facts, &mut deferred).unwrap();
        let break_result = extract_node(&break_node, &ctx, &mut facts, &mut deferred).unwrap();
        assert_ne!(pass_result, break_result);
    }

    #[test]
    fn unknown_kind_falls_through_to_todo() {
        let ctx = test_ctx();
        let raw = json!({"kind": "SomeFutureNode", "slots": {}});
        let node = simplify(&raw).unwrap();
        let mut facts = FactStore::new();
        let mut deferred = Vec::new();
        let result = extract_node(&node, &ctx, &mut facts, &mut deferred).unwrap();
        assert_eq!(result, UnionType::single(TypeTerm::TodoX("SomeFutureNode".to_string())));
    }

    #[test]
    fn star_import_emits_anchor_and_ref_but_no_deferred_obligation() {
        let ctx = test_ctx();
        let raw = json!({
            "kind": "ImportFromStmt",
            "slots": {
                "dots": {"kind": "int", "value": 0},
                "module": {"kind": "str", "value": "a.b"},
                "is_star": {"kind": "bool", "value": true},
                "names": [],
                "astn": astn_json(0, 1, "*")
            }
        });
        let node = simplify(&raw).unwrap();
        let mut facts = FactStore::new();
        let mut deferred = Vec::new();
        extract_node(&node, &ctx, &mut facts, &mut deferred).unwrap();

        assert!(deferred.is_empty());
        let has_star_ref = facts.records().iter().any(|r| match r {
            pykythe_core::vname::Record::Edge {
                edge_kind, target, ..
            } => {
                edge_kind == pykythe_core::vname::EDGE_REF
                    && target.signature.as_deref() == Some("$PYTHONPATH/a.b/*")
            }
            _ => false,
        });
        assert!(has_star_ref);
    }
}
