//! Byte-span text slicing and path-prefix canonicalization.
//!
//! `Astn` spans are byte offsets only — there is no line/column coordinate
//! system here to convert between.

use std::path::Path;

/// Extract the substring covering byte range `[start, end)`, clamped to the
/// content's bounds. Used for debugging/diagnostics only — the anchor facts
/// themselves carry the byte offsets verbatim; this is not on the hot path.
pub fn slice_utf8_lossy(content: &str, start: usize, end: usize) -> String {
    let start = start.min(content.len());
    let end = end.clamp(start, content.len());
    // Byte ranges may land mid-codepoint on malformed input; fall back to
    // the nearest valid boundary rather than panicking.
    let mut s = start;
    while s < content.len() && !content.is_char_boundary(s) {
        s -= 1;
    }
    let mut e = end;
    while e < content.len() && !content.is_char_boundary(e) {
        e += 1;
    }
    content[s..e].to_string()
}

/// Strip the first matching prefix from `rootpaths` off of `path`, making
/// the result relative. Returns `None` if no prefix matches — callers treat
/// that as a rejection.
///
/// The match is rejected unless it lands on a path-component boundary, so
/// `root = "/repo"` does not match `path = "/repository/foo.py"`.
pub fn strip_root_prefix(path: &Path, rootpaths: &[String]) -> Option<String> {
    let path_str = path.to_string_lossy();
    for root in rootpaths {
        let root = root.trim_end_matches('/');
        if let Some(stripped) = path_str.strip_prefix(root) {
            if stripped.is_empty() || stripped.starts_with('/') {
                return Some(stripped.trim_start_matches('/').to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_extracts_exact_range() {
        assert_eq!(slice_utf8_lossy("hello world", 6, 11), "world");
    }

    #[test]
    fn slice_clamps_out_of_range_end() {
        assert_eq!(slice_utf8_lossy("hi", 0, 100), "hi");
    }

    #[test]
    fn strip_prefix_finds_matching_root() {
        let roots = vec!["/repo".to_string(), "/other".to_string()];
        assert_eq!(
            strip_root_prefix(Path::new("/repo/pkg/mod.py"), &roots),
            Some("pkg/mod.py".to_string())
        );
    }

    #[test]
    fn strip_prefix_rejects_unmatched_path() {
        let roots = vec!["/repo".to_string()];
        assert_eq!(strip_root_prefix(Path::new("/elsewhere/mod.py"), &roots), None);
    }

    #[test]
    fn strip_prefix_rejects_partial_segment_collision() {
        let roots = vec!["/repo".to_string()];
        assert_eq!(
            strip_root_prefix(Path::new("/repository/foo.py"), &roots),
            None
        );
    }
}
