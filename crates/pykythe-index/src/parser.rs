//! The upstream parser subprocess adapter.
//!
//! This module only builds the invocation, runs it, and reads back the two
//! concatenated JSON values the parser writes to its `--out_fqn_expr` file.
//! It does not interpret the AST itself — that's `crate::ir`/`crate::meta`.

use std::io::Read;
use std::process::Command;

use serde_json::Value;
use tempfile::NamedTempFile;

use pykythe_core::error::{PykytheError, Result};

/// Python major version passed to the upstream parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PythonVersion {
    Two,
    Three,
}

impl PythonVersion {
    pub fn as_arg(self) -> &'static str {
        match self {
            PythonVersion::Two => "2",
            PythonVersion::Three => "3",
        }
    }
}

/// The arguments needed to build a parser invocation, grouped so callers
/// don't have to remember the flag names.
pub struct ParseRequest<'a> {
    pub parsecmd: &'a str,
    pub kythe_corpus: &'a str,
    pub kythe_root: &'a str,
    pub python_version: PythonVersion,
    pub src: &'a str,
    pub module: &'a str,
}

/// The two JSON values the parser writes: `Meta` followed by the AST root.
pub struct ParsedOutput {
    pub meta: Value,
    pub ast: Value,
}

/// Resolve `parsecmd` to an executable path via `which`, invoke it with the
/// protocol's flags, and read back its two concatenated JSON values from a
/// scoped temp file.
///
/// The temp file is a `tempfile::NamedTempFile`: it is created before the
/// subprocess runs (so the parser can write into it) and is removed on
/// every exit path, success or failure, once this function returns.
pub fn run_parser(req: &ParseRequest<'_>) -> Result<ParsedOutput> {
    let program = which::which(req.parsecmd)
        .map_err(|e| PykytheError::parser(format!("cannot resolve --parsecmd '{}': {e}", req.parsecmd)))?;

    let out_file = NamedTempFile::new()
        .map_err(|e| PykytheError::internal(format!("cannot create parser output tempfile: {e}")))?;
    let out_path = out_file.path().to_string_lossy().into_owned();

    let status = Command::new(program)
        .arg(format!("--kythe-corpus={}", req.kythe_corpus))
        .arg(format!("--kythe-root={}", req.kythe_root))
        .arg(format!("--python_version={}", req.python_version.as_arg()))
        .arg(format!("--src={}", req.src))
        .arg(format!("--module={}", req.module))
        .arg(format!("--out_fqn_expr={out_path}"))
        .status()
        .map_err(|e| PykytheError::parser(format!("failed to spawn '{}': {e}", req.parsecmd)))?;

    if !status.success() {
        return Err(PykytheError::parser(format!(
            "parser '{}' exited with {status}",
            req.parsecmd
        )));
    }

    let mut contents = String::new();
    {
        let mut file = out_file
            .reopen()
            .map_err(|e| PykytheError::parser(format!("cannot reopen parser output: {e}")))?;
        file.read_to_string(&mut contents)
            .map_err(|e| PykytheError::parser(format!("cannot read parser output: {e}")))?;
    }
    // `out_file` is dropped (and its temp file removed) here regardless of
    // what happens below, since parse_two_values only borrows `contents`.

    parse_two_values(&contents)
}

/// Split a buffer containing two concatenated JSON values (`Meta` then the
/// AST root) using `serde_json::Deserializer::from_str`'s streaming
/// support, rather than naive text splitting — the parser output has no
/// separator between the two values.
fn parse_two_values(contents: &str) -> Result<ParsedOutput> {
    let mut stream = serde_json::Deserializer::from_str(contents).into_iter::<Value>();

    let meta = stream
        .next()
        .ok_or_else(|| PykytheError::parser("parser output missing Meta value"))?
        .map_err(|e| PykytheError::parser(format!("malformed Meta JSON: {e}")))?;
    let ast = stream
        .next()
        .ok_or_else(|| PykytheError::parser("parser output missing AST value"))?
        .map_err(|e| PykytheError::parser(format!("malformed AST JSON: {e}")))?;
    if stream.next().is_some() {
        return Err(PykytheError::parser(
            "parser output contains more than two JSON values",
        ));
    }

    Ok(ParsedOutput { meta, ast })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_two_concatenated_json_values() {
        let meta = json!({"kythe_corpus": "c"});
        let ast = json!({"kind": "Module", "slots": {}});
        let combined = format!("{meta}{ast}");
        let parsed = parse_two_values(&combined).unwrap();
        assert_eq!(parsed.meta, meta);
        assert_eq!(parsed.ast, ast);
    }

    #[test]
    fn rejects_a_third_trailing_value() {
        let combined = format!("{}{}{}", json!({"a": 1}), json!({"b": 2}), json!({"c": 3}));
        assert!(parse_two_values(&combined).is_err());
    }

    #[test]
    fn rejects_missing_ast_value() {
        let combined = format!("{}", json!({"only": "meta"}));
        assert!(parse_two_values(&combined).is_err());
    }

    #[test]
    fn python_version_renders_expected_flag_value() {
        assert_eq!(PythonVersion::Two.as_arg(), "2");
        assert_eq!(PythonVersion::Three.as_arg(), "3");
    }
}
