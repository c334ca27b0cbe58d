//! Shared directory-walk helpers for the Rewriter and Test Discovery.
//!
//! Both components walk a source tree looking for `.rs` files while
//! skipping the same conventional build-output subtrees and generated-file
//! suffixes (spec.md §4.2, §4.3); this module is the single place that
//! applies those exclusion rules so the two walks can never drift apart.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Whether `path` falls under a path segment that should be skipped
/// (matched case-insensitively), or carries an excluded generated-file
/// suffix.
pub fn is_excluded(path: &Path, excluded_segments: &[String], excluded_suffixes: &[String]) -> bool {
    let segment_excluded = path.components().any(|c| {
        let s = c.as_os_str().to_string_lossy();
        excluded_segments.iter().any(|seg| s.eq_ignore_ascii_case(seg))
    });
    if segment_excluded {
        return true;
    }

    let file_name = path.file_name().map(|n| n.to_string_lossy().to_lowercase());
    if let Some(name) = file_name {
        return excluded_suffixes
            .iter()
            .any(|suffix| name.ends_with(&suffix.to_lowercase()));
    }
    false
}

/// Walk `root` collecting every `.rs` file not excluded by
/// [`is_excluded`], following symlinks like the teacher's `collect_files`.
pub fn walk_rust_files(root: &Path, excluded_segments: &[String], excluded_suffixes: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "rs")
            && !is_excluded(path, excluded_segments, excluded_suffixes)
        {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    files
}
