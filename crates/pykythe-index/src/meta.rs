//! The `Meta` record and the process-scoped [`FileContext`] derived from it
//! that stamps every emitted `Source`/`VName`.

use serde::{Deserialize, Serialize};

use pykythe_core::error::{PykytheError, Result};
use pykythe_core::text::strip_root_prefix;

/// The first JSON value the upstream parser emits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    pub kythe_corpus: String,
    pub kythe_root: String,
    pub path: String,
    pub language: String,
    pub contents_b64: String,
}

/// Process-scoped state derived from `Meta`, threaded by reference through
/// extraction and evaluation rather than held in globals.
#[derive(Debug, Clone)]
pub struct FileContext {
    pub corpus: String,
    pub root: String,
    /// The canonicalized path: `Meta.path` with a matching `rootpath`
    /// prefix stripped.
    pub path: String,
    pub language: String,
    pub contents: String,
}

impl FileContext {
    /// Build a `FileContext` from `Meta`, canonicalizing the path against
    /// `rootpaths`. Fails (invariant error) if no `rootpath` prefix matches.
    pub fn from_meta(meta: &Meta, rootpaths: &[String]) -> Result<Self> {
        let canonical = strip_root_prefix(std::path::Path::new(&meta.path), rootpaths)
            .ok_or_else(|| {
                PykytheError::invariant(format!(
                    "Meta.path '{}' is not reachable under any --rootpath",
                    meta.path
                ))
            })?;

        let contents_bytes = base64::Engine::decode(
            &base64::engine::general_purpose::STANDARD,
            &meta.contents_b64,
        )
        .map_err(|e| PykytheError::parser(format!("invalid contents_b64: {e}")))?;
        let contents = String::from_utf8_lossy(&contents_bytes).into_owned();

        Ok(FileContext {
            corpus: meta.kythe_corpus.clone(),
            root: meta.kythe_root.clone(),
            path: canonical,
            language: meta.language.clone(),
            contents,
        })
    }
}
