//! Discovers probe insertion sites inside a parsed source file
//!
//! This is read-only analysis: a `syn::visit::Visit` walk that records
//! line numbers, never a `VisitMut` that edits the tree. The actual file
//! mutation happens textually in [`crate::rewriter`], which is what lets
//! an Instrument-then-Strip round trip reproduce the original file
//! byte-for-byte.

use syn::spanned::Spanned;
use syn::visit::{self, Visit};
use syn::{Block, ExprMatch, File, Stmt};

use super::start_line;

/// A single line at which the rewriter should add or rewrite a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeSite {
    /// 1-indexed source line the site refers to
    pub line: usize,
    /// How the rewriter should treat this site
    pub kind: SiteKind,
}

/// Treatment a [`ProbeSite`] requires from the rewriter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteKind {
    /// Insert one new line directly above `line`, matching its indentation.
    BeforeLine,
    /// `line` is a match arm's opening brace; insert one new line directly
    /// below it, indented one level deeper.
    ArmBlockHead,
    /// `line` holds a match arm whose body is a single-line bare
    /// expression; rewrite that line in place, wrapping the expression in
    /// a block with the probe as its first statement.
    ArmInlineRewrite,
    /// `line` holds a match arm whose body is a bare expression spanning
    /// multiple lines; left un-probed (see [`crate::rewriter`]'s
    /// handling), recorded here only so callers can log what was skipped.
    ArmSkippedMultiline,
}

/// Collect every [`ProbeSite`] in a parsed file.
pub fn collect_sites(file: &File) -> Vec<ProbeSite> {
    let mut collector = SiteCollector { sites: Vec::new() };
    collector.visit_file(file);
    collector.sites
}

struct SiteCollector {
    sites: Vec<ProbeSite>,
}

impl<'ast> Visit<'ast> for SiteCollector {
    fn visit_block(&mut self, block: &'ast Block) {
        for stmt in &block.stmts {
            if let Some(line) = statement_site_line(stmt) {
                self.sites.push(ProbeSite {
                    line,
                    kind: SiteKind::BeforeLine,
                });
            }
        }
        visit::visit_block(self, block);
    }

    fn visit_expr_match(&mut self, node: &'ast ExprMatch) {
        for arm in &node.arms {
            match &arm.body {
                syn::Expr::Block(block_expr) if block_expr.label.is_none() => {
                    let open_line = start_line(block_expr.block.brace_token.span.open());
                    let close_line = block_expr.block.brace_token.span.close().end().line;
                    // A block arm that opens and closes on the same physical
                    // line (`pat => { expr }`) has no room for a line
                    // inserted "below the opening brace" that would still
                    // land inside the block, so it is rewritten in place
                    // like a bare single-line arm instead.
                    let kind = if open_line == close_line {
                        SiteKind::ArmInlineRewrite
                    } else {
                        SiteKind::ArmBlockHead
                    };
                    self.sites.push(ProbeSite { line: open_line, kind });
                }
                other => {
                    let start = start_line(other.span());
                    let end = other.span().end().line;
                    let kind = if start == end {
                        SiteKind::ArmInlineRewrite
                    } else {
                        SiteKind::ArmSkippedMultiline
                    };
                    self.sites.push(ProbeSite { line: start, kind });
                }
            }
        }
        visit::visit_expr_match(self, node);
    }
}

fn statement_site_line(stmt: &Stmt) -> Option<usize> {
    match stmt {
        Stmt::Local(local) => local.init.as_ref().map(|_| start_line(local.span())),
        Stmt::Expr(expr, _) => Some(start_line(expr.span())),
        Stmt::Macro(mac) => Some(start_line(mac.span())),
        Stmt::Item(_) => None,
    }
}
