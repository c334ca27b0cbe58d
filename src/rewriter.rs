//! AST Rewriter (spec.md §4.2): instrument, retarget, and strip probes
//! across a production source tree.
//!
//! Site *discovery* is the read-only `syn::visit::Visit` walk in
//! [`crate::ast::sites`]; everything here operates on the file's raw text,
//! line by line, which is what lets Strip reproduce Instrument's input
//! byte-for-byte (modulo whitespace) and keeps a half-written file from
//! ever being observable (spec §7).

use crate::ast::sites::{self, SiteKind};
use crate::ast::SourceFile;
use crate::probe;
use crate::{Error, Result};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One entry of the identifier map (spec §3): where a surviving probe's
/// `sid` points, recovered by re-scanning the instrumented file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierEntry {
    /// File the probe lives in
    pub file: PathBuf,
    /// 1-based line number of the probed statement (not the probe itself)
    pub line: usize,
    /// Trimmed source text of the probed statement, for display
    pub snippet: String,
}

/// Outcome of rewriting a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileOutcome {
    /// Whether the file's content changed on disk
    pub modified: bool,
    /// Number of probes inserted (Instrument only; 0 otherwise)
    pub probes_inserted: usize,
}

/// Instrument every instrumentable statement in `path`, writing probes
/// that append to `sink` when they fire. Idempotent: a file already
/// containing a recognised probe is left untouched (spec §4.2 mode 1).
pub fn instrument_file(path: &Path, sink: &Path) -> Result<FileOutcome> {
    let original = std::fs::read_to_string(path)?;
    if original.lines().any(probe::looks_like_probe) {
        return Ok(FileOutcome { modified: false, probes_inserted: 0 });
    }

    let source = SourceFile::parse(path.to_path_buf())?;
    let mut sites = sites::collect_sites(&source.syntax_tree);
    // Bottom-up: inserting/rewriting from the highest line down keeps the
    // line numbers of not-yet-processed sites valid.
    sites.sort_by(|a, b| b.line.cmp(&a.line));

    let mut lines: Vec<String> = original.lines().map(str::to_string).collect();
    let had_trailing_newline = original.ends_with('\n');
    let mut probes_inserted = 0usize;

    for site in &sites {
        let idx = site.line.saturating_sub(1);
        if idx >= lines.len() {
            continue;
        }
        let sid = new_sid();
        match site.kind {
            SiteKind::BeforeLine => {
                let indent = leading_whitespace(&lines[idx]);
                let probe_line = format!("{indent}{}", probe::encode(&sid, sink));
                lines.insert(idx, probe_line);
                probes_inserted += 1;
            }
            SiteKind::ArmBlockHead => {
                let indent = format!("{}    ", leading_whitespace(&lines[idx]));
                let probe_line = format!("{indent}{}", probe::encode(&sid, sink));
                lines.insert(idx + 1, probe_line);
                probes_inserted += 1;
            }
            SiteKind::ArmInlineRewrite => {
                let original_line = &lines[idx];
                let indent = leading_whitespace(original_line);
                let Some((head, body, trailing)) = split_arm_line(original_line) else {
                    continue;
                };
                lines[idx] = format!(
                    "{indent}{}",
                    probe::encode_inline_arm(head.trim_start(), &sid, sink, body, trailing)
                );
                probes_inserted += 1;
            }
            SiteKind::ArmSkippedMultiline => {
                log::debug!(
                    "{}:{}: match arm body spans multiple lines without a block; skipping probe",
                    path.display(),
                    site.line
                );
            }
        }
    }

    let mut rendered = lines.join("\n");
    if had_trailing_newline {
        rendered.push('\n');
    }

    if probes_inserted == 0 {
        return Ok(FileOutcome { modified: false, probes_inserted: 0 });
    }

    atomic_write(path, &rendered)?;
    Ok(FileOutcome { modified: true, probes_inserted })
}

/// Rewrite every probe's sink in `path` to `new_sink`, leaving all other
/// lines byte-identical (spec §4.2 mode 2).
pub fn retarget_file(path: &Path, new_sink: &Path) -> Result<FileOutcome> {
    let original = std::fs::read_to_string(path)?;
    let mut changed = false;
    let new_lines: Vec<String> = original
        .lines()
        .map(|line| match probe::retarget(line, new_sink) {
            Some(retargeted) if retargeted != line => {
                changed = true;
                retargeted
            }
            Some(retargeted) => retargeted,
            None => line.to_string(),
        })
        .collect();

    if !changed {
        return Ok(FileOutcome { modified: false, probes_inserted: 0 });
    }

    let mut rendered = new_lines.join("\n");
    if original.ends_with('\n') {
        rendered.push('\n');
    }
    atomic_write(path, &rendered)?;
    Ok(FileOutcome { modified: true, probes_inserted: 0 })
}

/// Remove every probe from `path`, restoring an inline match-arm body to
/// its pre-Instrument text (spec §4.2 mode 3).
pub fn strip_file(path: &Path) -> Result<FileOutcome> {
    let original = std::fs::read_to_string(path)?;
    if !original.lines().any(probe::looks_like_probe) {
        return Ok(FileOutcome { modified: false, probes_inserted: 0 });
    }

    let mut out_lines = Vec::new();
    for line in original.lines() {
        if probe::is_inline_arm(line) {
            let indent = leading_whitespace(line);
            if let Some((head, body, trailing)) = probe::split_inline_arm(line) {
                out_lines.push(format!("{indent}{head} {body}{trailing}"));
            }
        } else if probe::looks_like_probe(line) {
            // whole-line probe: drop it entirely
            continue;
        } else {
            out_lines.push(line.to_string());
        }
    }

    let mut rendered = out_lines.join("\n");
    if original.ends_with('\n') {
        rendered.push('\n');
    }
    atomic_write(path, &rendered)?;
    Ok(FileOutcome { modified: true, probes_inserted: 0 })
}

/// Re-derive the identifier map for one already-instrumented file by
/// scanning its surviving probe lines (spec §3: the map is "persisted
/// implicitly as the surviving probe text").
pub fn identifier_map_for_file(path: &Path) -> Result<HashMap<String, IdentifierEntry>> {
    let content = std::fs::read_to_string(path)?;
    let lines: Vec<&str> = content.lines().collect();
    let mut map = HashMap::new();

    for (idx, line) in lines.iter().enumerate() {
        if probe::is_inline_arm(line) {
            let Some(sid) = probe::extract_sid(line) else { continue };
            let snippet = probe::split_inline_arm(line)
                .map(|(_, body, _)| body.trim().to_string())
                .unwrap_or_default();
            insert_unique(&mut map, sid, IdentifierEntry { file: path.to_path_buf(), line: idx + 1, snippet })?;
        } else if probe::looks_like_probe(line) {
            let Some(sid) = probe::extract_sid(line) else { continue };
            let snippet = lines.get(idx + 1).map(|s| s.trim().to_string()).unwrap_or_default();
            insert_unique(
                &mut map,
                sid,
                IdentifierEntry { file: path.to_path_buf(), line: idx + 2, snippet },
            )?;
        }
    }

    Ok(map)
}

fn insert_unique(
    map: &mut HashMap<String, IdentifierEntry>,
    sid: String,
    entry: IdentifierEntry,
) -> Result<()> {
    if map.insert(sid.clone(), entry).is_some() {
        // Process-global uniqueness is a hard invariant (spec §3): a
        // collision here means two probes share a sid within one file.
        return Err(Error::Generic(format!("duplicate statement identifier {sid}")));
    }
    Ok(())
}

/// Instrument every `.rs` file under `root`, skipping excluded segments
/// and suffixes, in parallel (file rewrites are independent of one
/// another; spec §9's extensibility note on `rayon` use). Returns the
/// merged identifier map across all touched files.
pub fn instrument_tree(
    root: &Path,
    sink: &Path,
    excluded_segments: &[String],
    excluded_suffixes: &[String],
) -> Result<HashMap<String, IdentifierEntry>> {
    let files = crate::fsutil::walk_rust_files(root, excluded_segments, excluded_suffixes);

    let per_file: Vec<Result<HashMap<String, IdentifierEntry>>> = files
        .par_iter()
        .map(|file| {
            match instrument_file(file, sink) {
                Ok(_) => identifier_map_for_file(file),
                Err(e) => {
                    log::warn!("{}: {e}", file.display());
                    Ok(HashMap::new())
                }
            }
        })
        .collect();

    let mut merged = HashMap::new();
    for result in per_file {
        for (sid, entry) in result? {
            if merged.insert(sid.clone(), entry).is_some() {
                return Err(Error::Generic(format!("duplicate statement identifier {sid} across project")));
            }
        }
    }
    Ok(merged)
}

/// Strip every probe from every `.rs` file under `root`.
pub fn strip_tree(root: &Path, excluded_segments: &[String], excluded_suffixes: &[String]) -> Vec<PathBuf> {
    let files = crate::fsutil::walk_rust_files(root, excluded_segments, excluded_suffixes);
    files
        .into_par_iter()
        .filter_map(|file| match strip_file(&file) {
            Ok(outcome) if outcome.modified => Some(file),
            Ok(_) => None,
            Err(e) => {
                log::warn!("{}: {e}", file.display());
                None
            }
        })
        .collect()
}

/// Re-point every probe under `root` at `new_sink`.
pub fn retarget_tree(
    root: &Path,
    new_sink: &Path,
    excluded_segments: &[String],
    excluded_suffixes: &[String],
) -> Vec<PathBuf> {
    let files = crate::fsutil::walk_rust_files(root, excluded_segments, excluded_suffixes);
    files
        .into_par_iter()
        .filter_map(|file| match retarget_file(&file, new_sink) {
            Ok(outcome) if outcome.modified => Some(file),
            Ok(_) => None,
            Err(e) => {
                log::warn!("{}: {e}", file.display());
                None
            }
        })
        .collect()
}

fn new_sid() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn leading_whitespace(line: &str) -> String {
    line.chars().take_while(|c| c.is_whitespace()).collect()
}

/// Split an `ArmInlineRewrite` site's original line into `(head_arrow,
/// body, trailing)`, mirroring [`probe::split_inline_arm`]'s contract but
/// over plain (not-yet-probed) source text: `pat => body,` or
/// `pat => body` with no trailing comma.
fn split_arm_line(line: &str) -> Option<(&str, &str, &str)> {
    let arrow = line.find("=>")?;
    let head = &line[..arrow + 2];
    let rest = line[arrow + 2..].trim_start();
    let rest_start = line[arrow + 2..].len() - rest.len();
    let body_start = arrow + 2 + rest_start;
    let body_region = line[body_start..].trim_end();
    let (body, trailing) = if let Some(stripped) = body_region.strip_suffix(',') {
        (stripped, ",")
    } else {
        (body_region, "")
    };
    Some((head, body, trailing))
}

fn atomic_write(path: &Path, content: &str) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let tmp = dir.join(format!(
        ".{}.sbfl-tmp",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("rewrite")
    ));
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sink() -> PathBuf {
        PathBuf::from("/tmp/Coverage/__current.coverage.tmp")
    }

    fn write_temp(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lib.rs");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn instrument_is_idempotent() {
        let (_dir, path) = write_temp("fn f(x: i32) -> i32 {\n    let y = x + 1;\n    y\n}\n");
        let first = instrument_file(&path, &sink()).unwrap();
        assert!(first.modified);
        let after_first = std::fs::read_to_string(&path).unwrap();

        let second = instrument_file(&path, &sink()).unwrap();
        assert!(!second.modified);
        let after_second = std::fs::read_to_string(&path).unwrap();
        assert_eq!(after_first, after_second);
    }

    #[test]
    fn strip_round_trips_modulo_whitespace() {
        let original = "fn f(x: i32) -> i32 {\n    let y = x + 1;\n    y\n}\n";
        let (_dir, path) = write_temp(original);
        instrument_file(&path, &sink()).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().lines().any(probe::looks_like_probe));

        strip_file(&path).unwrap();
        let stripped = std::fs::read_to_string(&path).unwrap();
        assert_eq!(stripped, original);
    }

    #[test]
    fn does_not_probe_bare_let_without_initializer() {
        let (_dir, path) = write_temp("fn f() {\n    let x: i32;\n    x;\n}\n");
        instrument_file(&path, &sink()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        // exactly one probe: the `x;` statement, not the bare `let`
        assert_eq!(content.lines().filter(|l| probe::looks_like_probe(l)).count(), 1);
    }

    #[test]
    fn instrument_grows_by_one_line_per_site() {
        let original = "fn f(x: i32) -> i32 {\n    let y = x + 1;\n    let z = y * 2;\n    z\n}\n";
        let (_dir, path) = write_temp(original);
        let before_lines = original.lines().count();
        let outcome = instrument_file(&path, &sink()).unwrap();
        let after_lines = std::fs::read_to_string(&path).unwrap().lines().count();
        assert_eq!(after_lines, before_lines + outcome.probes_inserted);
        assert_eq!(outcome.probes_inserted, 3);
    }

    #[test]
    fn inline_match_arm_preserves_body_through_round_trip() {
        let original =
            "fn f(x: Option<i32>) -> i32 {\n    match x {\n        Some(v) => v,\n        None => 0,\n    }\n}\n";
        let (_dir, path) = write_temp(original);
        instrument_file(&path, &sink()).unwrap();
        let instrumented = std::fs::read_to_string(&path).unwrap();
        assert!(instrumented.contains("Some(v) =>"));
        assert!(instrumented.contains("None =>"));

        strip_file(&path).unwrap();
        let stripped = std::fs::read_to_string(&path).unwrap();
        assert_eq!(stripped, original);
    }

    #[test]
    fn retarget_is_idempotent_on_second_pass() {
        let original = "fn f(x: i32) -> i32 {\n    x\n}\n";
        let (_dir, path) = write_temp(original);
        instrument_file(&path, &sink()).unwrap();

        let new_sink = PathBuf::from("/tmp/Coverage2/__current.coverage.tmp");
        let first = retarget_file(&path, &new_sink).unwrap();
        assert!(first.modified);
        let after_first = std::fs::read_to_string(&path).unwrap();

        let second = retarget_file(&path, &new_sink).unwrap();
        assert!(!second.modified);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), after_first);
    }

    #[test]
    fn identifier_map_has_no_duplicate_sids_within_a_file() {
        let original = "fn f(x: i32) -> i32 {\n    let y = x + 1;\n    let z = y * 2;\n    z\n}\n";
        let (_dir, path) = write_temp(original);
        instrument_file(&path, &sink()).unwrap();
        let map = identifier_map_for_file(&path).unwrap();
        assert_eq!(map.len(), 3);
        let mut sids: Vec<&String> = map.keys().collect();
        sids.sort();
        sids.dedup();
        assert_eq!(sids.len(), 3);
    }
}
