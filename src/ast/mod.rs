//! Parsing and span utilities shared by the rewriter
//!
//! Wraps `syn` to parse Rust source files, with `proc-macro2`'s
//! span-locations feature enabled (see `Cargo.toml`) so every AST node's
//! span carries real line/column information even though we never run
//! inside an actual proc-macro.

use std::path::PathBuf;
use syn::File;

pub mod sites;

/// A parsed Rust source file plus the metadata the rewriter needs to
/// decide whether (and how) to touch it.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path to the source file
    pub path: PathBuf,

    /// The parsed AST
    pub syntax_tree: File,

    /// Original source code
    pub source: String,
}

impl SourceFile {
    /// Parse a Rust source file from disk
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or fails to parse as
    /// a Rust source file.
    pub fn parse(path: impl Into<PathBuf>) -> crate::Result<Self> {
        let path = path.into();
        let source = std::fs::read_to_string(&path)?;
        let syntax_tree = syn::parse_file(&source).map_err(|e| {
            crate::Error::Parse(format!("{}: {e}", path.display()))
        })?;

        Ok(Self { path, syntax_tree, source })
    }
}

/// Resolve a span to its 1-indexed start line.
pub fn start_line(span: proc_macro2::Span) -> usize {
    span.start().line
}
