//! Import resolution rules: dotted-path normalization and relative-import
//! handling.
//!
//! These are pure functions over strings and an injected `exists`
//! predicate — no direct filesystem access — so the resolution *rules* stay
//! unit-testable without touching disk; actual filesystem plumbing is the
//! caller's job.

use std::path::{Path, PathBuf};

/// One resolved target of a `from ... import ...` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportTarget {
    /// A named import: `Path/name` is the resolved logical path, `bound_fqn`
    /// is the FQN the alias binds to.
    Named { path: String, bound_fqn: String },
    /// `from M import *`: recorded but never expanded — a known limitation,
    /// preserved deliberately rather than guessed at.
    Star { path: String },
}

/// Normalize a slash-joined path, collapsing `..` against the preceding
/// component (`"pkg/sub/.."` -> `"pkg"`).
fn normalize_slashes(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            parts.pop();
        } else {
            parts.push(part);
        }
    }
    parts.join("/")
}

/// Compute the base module path for a `from` clause.
///
/// - Non-relative (`dots == 0`): `$PYTHONPATH/<dotted>` (dots in the module
///   name are kept verbatim — only the *leading relative dots* are turned
///   into path segments, not inner module separators).
/// - Relative (`dots >= 1`): the first dot is replaced by the current
///   file's directory segment; each additional dot appends `/..`, and any
///   remaining dotted module name is appended as slash-joined segments since
///   the base is now path-rooted.
pub fn from_import_base(dots: usize, dotted: &str, file_dir: &str) -> String {
    if dots == 0 {
        if dotted.is_empty() {
            "$PYTHONPATH".to_string()
        } else {
            format!("$PYTHONPATH/{dotted}")
        }
    } else {
        let mut base = file_dir.to_string();
        for _ in 1..dots {
            base.push_str("/..");
        }
        let base = normalize_slashes(&base);
        if dotted.is_empty() {
            base
        } else {
            let suffix = dotted.replace('.', "/");
            normalize_slashes(&format!("{base}/{suffix}"))
        }
    }
}

/// Resolve a `from <dots><dotted> import <names>` statement into one
/// [`ImportTarget`] per imported name, or a single `Star` target for
/// `import *`.
pub fn resolve_from_import(
    dots: usize,
    dotted: &str,
    file_dir: &str,
    names: &[(String, String)],
    is_star: bool,
) -> Vec<ImportTarget> {
    let base = from_import_base(dots, dotted, file_dir);
    if is_star {
        return vec![ImportTarget::Star {
            path: format!("{base}/*"),
        }];
    }
    names
        .iter()
        .map(|(name, bound_fqn)| ImportTarget::Named {
            path: format!("{base}/{name}"),
            bound_fqn: bound_fqn.clone(),
        })
        .collect()
}

/// Candidate filesystem paths for a dotted module name under one root,
/// in resolution-attempt order: `X.py`, `X.pyi`, `X/__init__.py`,
/// `X/__init__.pyi`.
pub fn candidate_files(root: &Path, dotted: &str) -> [PathBuf; 4] {
    let segments = dotted.replace('.', "/");
    let module = root.join(&segments);
    let pkg = root.join(&segments);
    [
        module.with_extension("py"),
        module.with_extension("pyi"),
        pkg.join("__init__.py"),
        pkg.join("__init__.pyi"),
    ]
}

/// Resolve a dotted module name to its file, searching `roots` in order and
/// preferring `.pyi` over `.py` at whichever level (module file vs package
/// `__init__`) is found first.
pub fn resolve_module_path(
    roots: &[PathBuf],
    dotted: &str,
    exists: &dyn Fn(&Path) -> bool,
) -> Option<PathBuf> {
    for root in roots {
        let [py, pyi, init_py, init_pyi] = candidate_files(root, dotted);
        if exists(&pyi) {
            return Some(pyi);
        }
        if exists(&py) {
            return Some(py);
        }
        if exists(&init_pyi) {
            return Some(init_pyi);
        }
        if exists(&init_py) {
            return Some(init_py);
        }
    }
    None
}

/// Inverse of [`resolve_module_path`]'s naming scheme: strip a known suffix
/// and a root prefix, turning slashes back into dots. Resolving a module
/// name to a path and back through this function must yield the original
/// name.
pub fn path_to_module(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let rel_str = rel.to_string_lossy();
    let without_ext = rel_str
        .strip_suffix(".pyi")
        .or_else(|| rel_str.strip_suffix(".py"))?;
    let without_init = without_ext
        .strip_suffix("/__init__")
        .unwrap_or(without_ext);
    Some(without_init.replace('/', "."))
}
