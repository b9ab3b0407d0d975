//! CLI surface (SPEC_FULL §6) and pipeline orchestration: wires the parser
//! subprocess adapter, AST simplifier, anchor extractor, fixpoint driver,
//! and emitter together into the single entry point `bin/pykythe.rs` calls.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use pykythe_core::error::{PykytheError, Result};

use crate::emitter;
use crate::extractor::extract_module;
use crate::fixpoint;
use crate::imports::resolve_module_path;
use crate::ir::simplify;
use crate::meta::{FileContext, Meta};
use crate::parser::{run_parser, ParseRequest, PythonVersion};
use crate::symtab::SymbolTable;

/// `pykythe <SRC>`: index one Python source file into Kythe facts/edges.
#[derive(Parser, Debug)]
#[command(name = "pykythe", version, about = "Python semantic post-processor: cooked-AST -> Kythe facts/edges")]
pub struct Cli {
    /// Source file to index.
    pub src: PathBuf,

    /// Command to invoke the upstream parser.
    #[arg(long)]
    pub parsecmd: String,

    /// Corpus field in emitted VNames.
    #[arg(long, default_value = "")]
    pub kythe_corpus: String,

    /// Root field in emitted VNames.
    #[arg(long, default_value = "")]
    pub kythe_root: String,

    /// Colon-separated import search roots.
    #[arg(long, default_value = "")]
    pub pythonpath: String,

    /// Colon-separated path-canonicalization prefixes.
    #[arg(long, default_value = "")]
    pub rootpath: String,

    /// Python version passed to the upstream parser.
    #[arg(long, value_enum, default_value_t = PythonVersionArg::Three)]
    pub python_version: PythonVersionArg,

    /// Increase log verbosity (stacks: `-v`, `-vv`).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PythonVersionArg {
    #[value(name = "2")]
    Two,
    #[value(name = "3")]
    Three,
}

impl std::fmt::Display for PythonVersionArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PythonVersionArg::Two => write!(f, "2"),
            PythonVersionArg::Three => write!(f, "3"),
        }
    }
}

impl From<PythonVersionArg> for PythonVersion {
    fn from(arg: PythonVersionArg) -> Self {
        match arg {
            PythonVersionArg::Two => PythonVersion::Two,
            PythonVersionArg::Three => PythonVersion::Three,
        }
    }
}

fn split_colon_paths(s: &str) -> Vec<String> {
    s.split(':').filter(|p| !p.is_empty()).map(str::to_string).collect()
}

/// Derive the `--module` flag value the parser protocol expects, from the
/// source path and the configured `--rootpath` roots. `--pythonpath` plays
/// no part in this derivation and is not forwarded to the parser subprocess
/// either — it names import search roots for resolving *other* modules'
/// `from`/`import` targets on disk, a filesystem lookup this crate
/// deliberately doesn't perform. It is accepted for CLI-surface completeness
/// and reserved for a future module-resolution pass
/// (`crate::imports::resolve_module_path` already implements the pure rules
/// such a pass would call).
fn module_for_src(src: &std::path::Path, rootpaths: &[PathBuf]) -> Result<String> {
    let exists = |p: &std::path::Path| p.exists();
    let absolute = std::fs::canonicalize(src)
        .map_err(|e| PykytheError::argument(format!("cannot resolve source path '{}': {e}", src.display())))?;
    for root in rootpaths {
        if let Some(module) = crate::imports::path_to_module(root, &absolute) {
            // Round-trip check: resolving the module back to a file under
            // this same root must find exactly the file we started from.
            if resolve_module_path(std::slice::from_ref(root), &module, &exists).is_some() {
                return Ok(module);
            }
        }
    }
    Err(PykytheError::argument(format!(
        "source path '{}' is not reachable under any --rootpath as a module",
        src.display()
    )))
}

/// Run the full pipeline end to end and write NDJSON to `writer`.
pub fn run(cli: &Cli, writer: &mut impl std::io::Write) -> Result<()> {
    let rootpaths = split_colon_paths(&cli.rootpath);
    if rootpaths.is_empty() {
        return Err(PykytheError::argument("--rootpath must name at least one path"));
    }
    let rootpath_bufs: Vec<PathBuf> = rootpaths.iter().map(PathBuf::from).collect();
    let module = module_for_src(&cli.src, &rootpath_bufs)?;

    tracing::debug!(module = %module, src = %cli.src.display(), "invoking upstream parser");
    let parsed = run_parser(&ParseRequest {
        parsecmd: &cli.parsecmd,
        kythe_corpus: &cli.kythe_corpus,
        kythe_root: &cli.kythe_root,
        python_version: cli.python_version.into(),
        src: &cli.src.to_string_lossy(),
        module: &module,
    })?;

    let meta: Meta = serde_json::from_value(parsed.meta)
        .map_err(|e| PykytheError::parser(format!("malformed Meta record: {e}")))?;
    let ctx = FileContext::from_meta(&meta, &rootpaths)?;

    let ir_root = simplify(&parsed.ast)?;
    tracing::debug!(path = %ctx.path, "running anchor extractor (pass 1)");
    let extracted = extract_module(&ir_root, &ctx)?;

    tracing::debug!(deferred = extracted.deferred.len(), "running fixpoint (pass 2+)");
    let fixpoint_out = fixpoint::run(&ctx, &extracted.facts, &extracted.deferred, SymbolTable::with_builtins())?;
    tracing::debug!(passes = fixpoint_out.passes_run, symbols = fixpoint_out.symtab.len(), "fixpoint converged");

    let mut facts = fixpoint_out.facts;
    emitter::emit(&ctx, &mut facts, &fixpoint_out.symtab, writer)
}
