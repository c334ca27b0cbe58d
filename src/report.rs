//! Reporter (spec.md §4.7): CSV and Markdown emission with stable
//! ordering, `F6` float formatting, and atomic write-and-rename.

use crate::ranker::{RankedStatement, METRICS};
use crate::rewriter::IdentifierEntry;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Output format the Reporter can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// `sid,file,line,snippet,Tarantula,Ochiai,DStar,Op2,Jaccard`
    Csv,
    /// Pipe-table with the same columns
    #[value(alias = "md")]
    Markdown,
}

impl ReportFormat {
    /// Default file extension for this format.
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Markdown => "md",
        }
    }
}

/// Format a score for display: six fixed fractional digits, the literal
/// `Infinity`, or a format-specific placeholder for undefined (spec
/// §4.7).
fn format_score(score: Option<f64>, undefined_placeholder: &str) -> String {
    match score {
        None => undefined_placeholder.to_string(),
        Some(v) if v.is_infinite() => "Infinity".to_string(),
        Some(v) => format!("{v:.6}"),
    }
}

/// Quote a CSV field per RFC4180 when it contains a comma, quote, or
/// newline.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn display_for(sid: &str, identifiers: &HashMap<String, IdentifierEntry>) -> (String, String, String) {
    match identifiers.get(sid) {
        Some(entry) => (
            entry.file.display().to_string(),
            entry.line.to_string(),
            entry.snippet.clone(),
        ),
        None => (String::new(), String::new(), String::new()),
    }
}

/// Render a CSV report, truncated to `top_n` rows (if given).
pub fn render_csv(rows: &[RankedStatement], identifiers: &HashMap<String, IdentifierEntry>, top_n: Option<usize>) -> String {
    let mut out = String::from("sid,file,line,snippet,Tarantula,Ochiai,DStar,Op2,Jaccard\n");
    let rows = truncated(rows, top_n);
    for row in rows {
        let (file, line, snippet) = display_for(&row.sid, identifiers);
        let mut fields = vec![csv_field(&row.sid), csv_field(&file), csv_field(&line), csv_field(&snippet)];
        for &metric in METRICS {
            let score = row.scores.iter().find(|(n, _)| *n == metric).and_then(|(_, v)| *v);
            fields.push(format_score(score, ""));
        }
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

/// Render a Markdown pipe-table report, truncated to `top_n` rows (if
/// given).
pub fn render_markdown(rows: &[RankedStatement], identifiers: &HashMap<String, IdentifierEntry>, top_n: Option<usize>) -> String {
    let mut out = String::from("| sid | file | line | snippet | Tarantula | Ochiai | DStar | Op2 | Jaccard |\n");
    out.push_str("|---|---|---|---|---|---|---|---|---|\n");
    let rows = truncated(rows, top_n);
    for row in rows {
        let (file, line, snippet) = display_for(&row.sid, identifiers);
        let mut cells = vec![row.sid.clone(), file, line, snippet];
        for &metric in METRICS {
            let score = row.scores.iter().find(|(n, _)| *n == metric).and_then(|(_, v)| *v);
            cells.push(format_score(score, "-"));
        }
        out.push_str("| ");
        out.push_str(&cells.join(" | "));
        out.push_str(" |\n");
    }
    out
}

fn truncated<'a>(rows: &'a [RankedStatement], top_n: Option<usize>) -> &'a [RankedStatement] {
    match top_n {
        Some(n) if n < rows.len() => &rows[..n],
        _ => rows,
    }
}

/// Render in the given format.
pub fn render(format: ReportFormat, rows: &[RankedStatement], identifiers: &HashMap<String, IdentifierEntry>, top_n: Option<usize>) -> String {
    match format {
        ReportFormat::Csv => render_csv(rows, identifiers, top_n),
        ReportFormat::Markdown => render_markdown(rows, identifiers, top_n),
    }
}

/// Resolve the default report path (`suspiciousness_report.{csv,md}` in
/// the current working directory) when none is given, or an explicit
/// path resolved against the current working directory if relative
/// (spec §4.7, §6.3).
pub fn resolve_path(explicit: Option<&Path>, format: ReportFormat, cwd: &Path) -> PathBuf {
    match explicit {
        Some(p) if p.is_absolute() => p.to_path_buf(),
        Some(p) => cwd.join(p),
        None => cwd.join(format!("suspiciousness_report.{}", format.extension())),
    }
}

/// Write `content` to `path` atomically (write to a sibling temp file,
/// then rename; spec §4.7, §7's "never leave a half-written file").
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    let tmp = dir.join(format!(
        ".{}.sbfl-tmp",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("report")
    ));
    std::fs::write(&tmp, content)
        .map_err(|e| Error::ReportWrite(path.to_path_buf(), e.to_string()))?;
    std::fs::rename(&tmp, path).map_err(|e| Error::ReportWrite(path.to_path_buf(), e.to_string()))?;
    Ok(())
}

/// Render and print the console summary: the first `n` rows, every
/// metric, colorized hot-to-cold by the primary metric's value (spec
/// §4.7; grounded on the teacher's `output/utils.rs` coverage-color
/// helpers).
pub fn print_summary(rows: &[RankedStatement], identifiers: &HashMap<String, IdentifierEntry>, n: usize, primary_metric: &str) {
    use colored::Colorize;

    println!(
        "{}",
        format!("Top {} suspicious statements (by {primary_metric})", n.min(rows.len())).bold()
    );
    for row in rows.iter().take(n) {
        let (file, line, snippet) = display_for(&row.sid, identifiers);
        let primary = row.scores.iter().find(|(n, _)| *n == primary_metric).and_then(|(_, v)| *v);
        let label = format_score(primary, "-");
        let colored_label = match primary {
            Some(v) if v >= 0.7 => label.red(),
            Some(v) if v >= 0.3 => label.yellow(),
            Some(_) => label.green(),
            None => label.dimmed(),
        };
        println!("  {colored_label}  {file}:{line}  {snippet}");
    }
}
