//! Probe codec: encodes, recognises, and retargets the single-line probe
//! statements the rewriter inserts.
//!
//! A probe is always exactly one physical line so the rewriter can treat
//! insertion and removal as whole-line operations. The leading
//! `/*@sbfl ...@*/` block comment carries the `sid` and sink path as plain
//! key=value text for cheap recognition; the executable statement after
//! it carries the same two values as Rust literals, generated by the same
//! `encode` call, so comment and code can never drift apart.

use std::path::{Path, PathBuf};

const SENTINEL_OPEN: &str = "/*@sbfl";
const SENTINEL_CLOSE: &str = "@*/";

/// Marks where a match arm's original body begins inside an
/// [`encode_inline_arm`] line, so [`split_inline_arm`] can recover it
/// exactly on Strip.
pub const ARM_BODY_MARKER: &str = "/*@sbfl:body*/";

/// Build the single-line probe statement for `sid`, appending its sid to
/// `sink` when the probe fires.
pub fn encode(sid: &str, sink: &Path) -> String {
    let sink_escaped = escape(&sink.display().to_string());
    let sid_escaped = escape(sid);
    format!(
        "{SENTINEL_OPEN} sid={sid} sink={sink_escaped}{SENTINEL_CLOSE}{{let _=(||->::std::io::Result<()>{{use ::std::io::Write;let mut __f=::std::fs::OpenOptions::new().create(true).append(true).open(\"{sink_escaped}\")?;__f.write_all(concat!(\"{sid_escaped}\",\"\\n\").as_bytes())}})();}}",
    )
}

/// Wrap a match arm whose body is a single-line bare expression so the
/// probe fires before the body runs, keeping the original head (pattern
/// plus `=>`) and body text byte-identical to what [`split_inline_arm`]
/// will later recover.
pub fn encode_inline_arm(head_arrow: &str, sid: &str, sink: &Path, body: &str, trailing: &str) -> String {
    let probe = encode(sid, sink);
    format!("{head_arrow} {{ {probe}{ARM_BODY_MARKER}{body} }}{trailing}")
}

/// Reverse [`encode_inline_arm`]: given a previously wrapped line, recover
/// `(head_arrow, body, trailing)`.
pub fn split_inline_arm(line: &str) -> Option<(&str, &str, &str)> {
    let marker_idx = line.find(ARM_BODY_MARKER)?;
    let sentinel_idx = line.find(SENTINEL_OPEN)?;
    if sentinel_idx > marker_idx {
        return None;
    }
    let after_marker = &line[marker_idx + ARM_BODY_MARKER.len()..];
    let close_idx = after_marker.rfind('}')?;
    let body = after_marker[..close_idx].trim();
    let trailing = &after_marker[close_idx + 1..];

    let head_part = &line[..sentinel_idx];
    let head_arrow = head_part.trim_end().trim_end_matches('{').trim_end();
    Some((head_arrow, body, trailing))
}

/// Whether the line contains a probe emitted by [`encode`] or
/// [`encode_inline_arm`].
pub fn looks_like_probe(line: &str) -> bool {
    line.contains(SENTINEL_OPEN) && line.contains(SENTINEL_CLOSE)
}

/// Whether the line is a dedicated probe line (the whole line is the
/// probe, as opposed to an [`encode_inline_arm`] line that also carries
/// the arm's original body).
pub fn is_inline_arm(line: &str) -> bool {
    looks_like_probe(line) && line.contains(ARM_BODY_MARKER)
}

/// Extract the `sid` recorded in a probe's sentinel comment.
pub fn extract_sid(line: &str) -> Option<String> {
    extract_field(line, "sid=")
}

/// Extract the sink path recorded in a probe's sentinel comment.
pub fn extract_sink(line: &str) -> Option<PathBuf> {
    extract_field(line, "sink=").map(PathBuf::from)
}

/// Re-encode a probe line with the same `sid` but a new sink path,
/// preserving an inline arm's wrapped body if present.
pub fn retarget(line: &str, new_sink: &Path) -> Option<String> {
    let sid = extract_sid(line)?;
    if let Some((head, body, trailing)) = split_inline_arm(line) {
        Some(encode_inline_arm(head, &sid, new_sink, body, trailing))
    } else {
        Some(encode(&sid, new_sink))
    }
}

fn extract_field(line: &str, key: &str) -> Option<String> {
    let open = line.find(SENTINEL_OPEN)?;
    let rest = &line[open + SENTINEL_OPEN.len()..];
    let close = rest.find(SENTINEL_CLOSE)?;
    let header = &rest[..close];
    for token in header.split_whitespace() {
        if let Some(value) = token.strip_prefix(key) {
            return Some(value.to_string());
        }
    }
    None
}

/// Escape a value for embedding in both the sentinel comment header and a
/// Rust string literal: backslashes and double quotes only, since sids
/// are hex/hyphen strings and paths on the platforms we target never
/// contain control characters in practice.
fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
