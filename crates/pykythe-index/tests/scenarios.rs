//! Scenario tests covering the canonical end-to-end cases: binding and
//! reading attributes, aliasing and relative imports, call-returns-class
//! propagation, and duplicate anchor/edge handling.
//!
//! Each test hand-constructs a small cooked-AST fragment as a
//! `serde_json::Value` (no subprocess parser involved — that boundary is
//! out of scope here) and runs it through the simplifier, Pass 1 extractor,
//! and the fixpoint driver, asserting on the resulting fact/edge set.

use serde_json::{json, Value};

use pykythe_core::vname::{base64_encode, Record, VName};
use pykythe_index::extractor::extract_module;
use pykythe_index::fixpoint;
use pykythe_index::ir::simplify;
use pykythe_index::meta::FileContext;
use pykythe_index::symtab::SymbolTable;

fn ctx() -> FileContext {
    FileContext {
        corpus: "test-corpus".to_string(),
        root: "".to_string(),
        path: "mod.py".to_string(),
        language: "python".to_string(),
        contents: String::new(),
    }
}

fn astn(start: usize, end: usize, value: &str) -> Value {
    json!({"kind": "Astn", "slots": {
        "start": {"kind": "int", "value": start},
        "end": {"kind": "int", "value": end},
        "value": {"kind": "str", "value": value}
    }})
}

fn name_binds(fqn: &str, start: usize, end: usize, value: &str) -> Value {
    json!({"kind": "NameBindsFqn", "slots": {
        "fqn": {"kind": "str", "value": fqn},
        "astn": astn(start, end, value)
    }})
}

fn name_ref(fqn: &str, start: usize, end: usize, value: &str) -> Value {
    json!({"kind": "NameRefFqn", "slots": {
        "fqn": {"kind": "str", "value": fqn},
        "astn": astn(start, end, value)
    }})
}

fn module(body: Vec<Value>) -> Value {
    json!({"kind": "Module", "slots": {"body": body}})
}

/// Run the full Pass-1 + fixpoint pipeline over a hand-built AST.
fn index(ast: &Value) -> fixpoint::FixpointOutput {
    let ctx = ctx();
    let ir = simplify(ast).unwrap();
    let extracted = extract_module(&ir, &ctx).unwrap();
    fixpoint::run(&ctx, &extracted.facts, &extracted.deferred, SymbolTable::with_builtins()).unwrap()
}

fn has_binding_edge(records: &[Record], anchor_sig: &str, target_fqn: &str) -> bool {
    records.iter().any(|r| match r {
        Record::Edge {
            source,
            edge_kind,
            target,
            ..
        } => {
            source.signature.as_deref() == Some(anchor_sig)
                && edge_kind == pykythe_core::vname::EDGE_DEFINES_BINDING
                && target.signature.as_deref() == Some(target_fqn)
        }
        _ => false,
    })
}

fn has_ref_edge(records: &[Record], anchor_sig: &str, target_fqn: &str) -> bool {
    records.iter().any(|r| match r {
        Record::Edge {
            source,
            edge_kind,
            target,
            ..
        } => {
            source.signature.as_deref() == Some(anchor_sig)
                && edge_kind == pykythe_core::vname::EDGE_REF
                && target.signature.as_deref() == Some(target_fqn)
        }
        _ => false,
    })
}

/// Scenario 1: self-attribute binding.
///
/// `class C:\n  def __init__(self):\n    self.x = 'a'`
/// Expect: a binding anchor over `self.x` pointing to `mod.C.x`, and
/// `mod.C.x -> {class('builtin.str', [])}` in the final symbol table.
#[test]
fn self_attribute_binding() {
    let ast = module(vec![json!({
        "kind": "Class",
        "slots": {
            "fqn": {"kind": "str", "value": "mod.C"},
            "astn": astn(6, 7, "C"),
            "bases": [],
            "body": [json!({
                "kind": "Func",
                "slots": {
                    "fqn": {"kind": "str", "value": "mod.C.__init__"},
                    "astn": astn(15, 23, "__init__"),
                    "params": [],
                    "body": [json!({
                        "kind": "AssignExprStmt",
                        "slots": {
                            "lhs": name_binds("mod.C.x", 45, 53, "self.x"),
                            "rhs": {"kind": "StringNode", "slots": {}}
                        }
                    })]
                }
            })]
        }
    })]);

    let out = index(&ast);
    assert!(has_binding_edge(out.facts.records(), "@45:53", "mod.C.x"));

    let union = out.symtab.get("mod.C.x").expect("mod.C.x must be in symtab");
    assert_eq!(union.len(), 1);
    assert_eq!(
        union.as_slice()[0],
        pykythe_index::types::TypeTerm::Class("builtin.str".to_string(), Vec::new())
    );
}

/// Scenario 2: attribute read across class.
///
/// `c = C(); y = c.x` (with `C`/`C.x` declared as in scenario 1).
/// Expect: a `ref` edge to `mod.C.x` at the `x` span, and
/// `mod.y -> {class('builtin.str', [])}` after fixpoint.
#[test]
fn attribute_read_across_class() {
    let class_decl = json!({
        "kind": "Class",
        "slots": {
            "fqn": {"kind": "str", "value": "mod.C"},
            "astn": astn(6, 7, "C"),
            "bases": [],
            "body": [json!({
                "kind": "AssignExprStmt",
                "slots": {
                    "lhs": name_binds("mod.C.x", 20, 28, "self.x"),
                    "rhs": {"kind": "StringNode", "slots": {}}
                }
            })]
        }
    });
    let c_assign = json!({
        "kind": "AssignExprStmt",
        "slots": {
            "lhs": name_binds("mod.c", 40, 41, "c"),
            "rhs": {
                "kind": "AtomCallNode",
                "slots": {
                    "atom": name_ref("mod.C", 44, 45, "C"),
                    "args": []
                }
            }
        }
    });
    let y_assign = json!({
        "kind": "AssignExprStmt",
        "slots": {
            "lhs": name_binds("mod.y", 50, 51, "y"),
            "rhs": {
                "kind": "AtomDotNode",
                "slots": {
                    "atom": name_ref("mod.c", 54, 55, "c"),
                    "attr": astn(57, 58, "x"),
                    "binds": {"kind": "bool", "value": false}
                }
            }
        }
    });

    let ast = module(vec![class_decl, c_assign, y_assign]);
    let out = index(&ast);

    assert!(has_ref_edge(out.facts.records(), "@57:58", "mod.C.x"));
    let union = out.symtab.get("mod.y").expect("mod.y must be in symtab");
    assert!(union
        .iter()
        .any(|t| *t == pykythe_index::types::TypeTerm::Class("builtin.str".to_string(), Vec::new())));
}

/// Scenario 3: from-import alias.
///
/// `from a.b import f as g` resolves to `$PYTHONPATH/a.b/f`, binds `mod.g`,
/// and registers `mod.g -> {import(mod.g, "$PYTHONPATH/a.b/f")}`.
#[test]
fn from_import_alias() {
    let ast = module(vec![json!({
        "kind": "ImportFromStmt",
        "slots": {
            "dots": {"kind": "int", "value": 0},
            "module": {"kind": "str", "value": "a.b"},
            "is_star": {"kind": "bool", "value": false},
            "names": [json!({
                "kind": "ImportAlias",
                "slots": {
                    "name": {"kind": "str", "value": "f"},
                    "fqn": {"kind": "str", "value": "mod.g"},
                    "astn": astn(20, 21, "g")
                }
            })]
        }
    })]);

    let out = index(&ast);
    assert!(has_binding_edge(out.facts.records(), "@20:21", "mod.g"));

    let union = out.symtab.get("mod.g").expect("mod.g must be in symtab");
    assert!(union.iter().any(|t| matches!(
        t,
        pykythe_index::types::TypeTerm::Import(fqn, path)
            if fqn == "mod.g" && path == "$PYTHONPATH/a.b/f"
    )));
}

/// Scenario 4: relative import.
///
/// In file `pkg/sub/mod.py`, `from .. import x` resolves to `pkg/x`, not
/// `pkg/sub/x`.
#[test]
fn relative_import_climbs_directories() {
    let file_ctx = FileContext {
        corpus: "test-corpus".to_string(),
        root: "".to_string(),
        path: "pkg/sub/mod.py".to_string(),
        language: "python".to_string(),
        contents: String::new(),
    };
    let ast = module(vec![json!({
        "kind": "ImportFromStmt",
        "slots": {
            "dots": {"kind": "int", "value": 2},
            "module": {"kind": "str", "value": ""},
            "is_star": {"kind": "bool", "value": false},
            "names": [json!({
                "kind": "ImportAlias",
                "slots": {
                    "name": {"kind": "str", "value": "x"},
                    "fqn": {"kind": "str", "value": "pkg.sub.mod.x"},
                    "astn": astn(20, 21, "x")
                }
            })]
        }
    })]);

    let ir = simplify(&ast).unwrap();
    let extracted = extract_module(&ir, &file_ctx).unwrap();
    let out = fixpoint::run(
        &file_ctx,
        &extracted.facts,
        &extracted.deferred,
        SymbolTable::with_builtins(),
    )
    .unwrap();

    let union = out.symtab.get("pkg.sub.mod.x").expect("bound name must be in symtab");
    assert!(union.iter().any(|t| matches!(
        t,
        pykythe_index::types::TypeTerm::Import(_, path) if path == "pkg/x"
    )));
}

/// Scenario 5: call returning class-str.
///
/// `def f() -> str: ...; z = f()` yields
/// `mod.z -> {class('builtin.str', [])}` via return-union propagation.
#[test]
fn call_returning_class_str_propagates() {
    let func_decl = json!({
        "kind": "Func",
        "slots": {
            "fqn": {"kind": "str", "value": "mod.f"},
            "astn": astn(4, 5, "f"),
            "params": [],
            "return": {"kind": "StringNode", "slots": {}},
            "body": [json!({"kind": "EllipsisNode", "slots": {}})]
        }
    });
    let z_assign = json!({
        "kind": "AssignExprStmt",
        "slots": {
            "lhs": name_binds("mod.z", 30, 31, "z"),
            "rhs": {
                "kind": "AtomCallNode",
                "slots": {
                    "atom": name_ref("mod.f", 34, 35, "f"),
                    "args": []
                }
            }
        }
    });

    let ast = module(vec![func_decl, z_assign]);
    let out = index(&ast);
    let union = out.symtab.get("mod.z").expect("mod.z must be in symtab");
    assert!(union
        .iter()
        .any(|t| *t == pykythe_index::types::TypeTerm::Class("builtin.str".to_string(), Vec::new())));
}

/// Scenario 6: duplicate anchor.
///
/// Two references to the same FQN at *different* spans (`y = x; z = x`) each
/// get their own anchor and their own `ref` edge to the shared target —
/// distinct anchors never collide under the fact store's duplicate-edge
/// guard, even though both edges target the same FQN.
#[test]
fn duplicate_anchor_is_deduplicated() {
    let ast = module(vec![
        json!({"kind": "ExprStmt", "slots": {"expr": name_ref("mod.x", 10, 11, "x")}}),
        json!({"kind": "ExprStmt", "slots": {"expr": name_ref("mod.x", 20, 21, "x")}}),
    ]);

    let out = index(&ast);
    let anchor_a = VName::anchor(&ctx().corpus, &ctx().root, &ctx().path, 10, 11);
    let anchor_b = VName::anchor(&ctx().corpus, &ctx().root, &ctx().path, 20, 21);
    assert!(has_ref_edge(
        out.facts.records(),
        anchor_a.signature.as_deref().unwrap(),
        "mod.x"
    ));
    assert!(has_ref_edge(
        out.facts.records(),
        anchor_b.signature.as_deref().unwrap(),
        "mod.x"
    ));

    let ref_edges_to_x = out.facts.records().iter().filter(|r| match r {
        Record::Edge {
            edge_kind, target, ..
        } => edge_kind == pykythe_core::vname::EDGE_REF && target.signature.as_deref() == Some("mod.x"),
        _ => false,
    });
    assert_eq!(ref_edges_to_x.count(), 2);
}

/// A genuine double-walk of the identical anchor (same span, same target)
/// must fail loudly rather than silently collapse — the fact store treats a
/// repeated `(source, edge_kind, target)` edge key as an invariant violation.
#[test]
fn literal_duplicate_edge_is_rejected() {
    let ast = module(vec![
        json!({"kind": "ExprStmt", "slots": {"expr": name_ref("mod.x", 10, 11, "x")}}),
        json!({"kind": "ExprStmt", "slots": {"expr": name_ref("mod.x", 10, 11, "x")}}),
    ]);
    let ctx = ctx();
    let ir = simplify(&ast).unwrap();
    assert!(extract_module(&ir, &ctx).is_err());
}

#[test]
fn file_vname_carries_node_kind_and_text() {
    let ast = module(vec![]);
    let file_ctx = FileContext {
        contents: "x = 1\n".to_string(),
        ..ctx()
    };
    let ir = simplify(&ast).unwrap();
    let extracted = extract_module(&ir, &file_ctx).unwrap();
    let file_vname = VName::file(&file_ctx.corpus, &file_ctx.root, &file_ctx.path);
    let kind_fact = extracted.facts.records().iter().any(|r| match r {
        Record::Fact {
            source,
            fact_name,
            fact_value,
        } => {
            *source == file_vname
                && fact_name == pykythe_core::vname::NODE_KIND
                && *fact_value == base64_encode("file")
        }
        _ => false,
    });
    assert!(kind_fact);
}
