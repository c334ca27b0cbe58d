//! Ranker (spec.md §4.6): computes five SBFL suspiciousness scores per
//! statement identifier from the coverage-by-test matrix and the
//! pass/fail vector.
//!
//! Exposed as a small formula table (spec §9) keyed by metric name, so a
//! sixth metric is one more entry rather than a change to the ranking
//! loop.

use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

/// The four counts a formula needs: failed/passed tests that did/didn't
/// cover a given `sid` (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spectrum {
    /// Failed tests covering the statement
    pub e_f: f64,
    /// Passed tests covering the statement
    pub e_p: f64,
    /// Failed tests not covering the statement
    pub n_f: f64,
    /// Passed tests not covering the statement
    pub n_p: f64,
}

/// The five metrics spec.md §4.6 mandates, in the order the Reporter
/// emits columns.
pub const METRICS: &[&str] = &["Tarantula", "Ochiai", "DStar", "Op2", "Jaccard"];

/// Apply the "zero-numerator" undefined/infinity rule (spec §4.6) to one
/// division: `None` when both numerator and denominator are zero,
/// `Some(f64::INFINITY)` when the numerator is positive and the
/// denominator is zero, `Some(numerator / denominator)` otherwise.
fn safe_div(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        if numerator > 0.0 {
            Some(f64::INFINITY)
        } else {
            None
        }
    } else {
        Some(numerator / denominator)
    }
}

/// Tarantula: `(e_f/(e_f+n_f)) / ((e_f/(e_f+n_f)) + (e_p/(e_p+n_p)))`.
/// Undefined whenever `e_f + n_f == 0`, regardless of the passed branch
/// (spec §4.6's "apply the zero-numerator rule to the *overall* metric").
pub fn tarantula(s: Spectrum) -> Option<f64> {
    let failed_ratio = safe_div(s.e_f, s.e_f + s.n_f)?;
    let passed_ratio = safe_div(s.e_p, s.e_p + s.n_p).unwrap_or(0.0);
    let denom = failed_ratio + passed_ratio;
    safe_div(failed_ratio, denom)
}

/// Ochiai: `e_f / sqrt((e_f+n_f) * (e_f+e_p))`.
pub fn ochiai(s: Spectrum) -> Option<f64> {
    let denom = ((s.e_f + s.n_f) * (s.e_f + s.e_p)).sqrt();
    safe_div(s.e_f, denom)
}

/// D* with `star = 2`: `e_f^2 / (e_p + n_f)`.
pub fn dstar(s: Spectrum) -> Option<f64> {
    safe_div(s.e_f.powi(2), s.e_p + s.n_f)
}

/// Op2: `e_f - (e_p / (e_p + n_p + 1))`. Always defined (denominator is
/// never zero).
pub fn op2(s: Spectrum) -> Option<f64> {
    Some(s.e_f - (s.e_p / (s.e_p + s.n_p + 1.0)))
}

/// Jaccard: `e_f / (e_f + n_f + e_p)`.
pub fn jaccard(s: Spectrum) -> Option<f64> {
    safe_div(s.e_f, s.e_f + s.n_f + s.e_p)
}

/// Compute one metric by name (case-sensitive, matching [`METRICS`]).
pub fn compute_metric(name: &str, s: Spectrum) -> Option<f64> {
    match name {
        "Tarantula" => tarantula(s),
        "Ochiai" => ochiai(s),
        "DStar" => dstar(s),
        "Op2" => op2(s),
        "Jaccard" => jaccard(s),
        _ => None,
    }
}

/// One ranked statement.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedStatement {
    /// The statement identifier
    pub sid: String,
    /// Number of failed tests covering this statement (used for
    /// tie-breaking)
    pub e_f: f64,
    /// Score per metric name, in [`METRICS`] order
    pub scores: Vec<(&'static str, Option<f64>)>,
}

/// Compute the spectrum `(e_f, e_p, n_f, n_p)` for one `sid` given the
/// coverage matrix and pass/fail vector.
pub fn spectrum_for(sid: &str, coverage: &HashMap<String, HashSet<String>>, pass: &HashMap<String, bool>) -> Spectrum {
    let mut s = Spectrum { e_f: 0.0, e_p: 0.0, n_f: 0.0, n_p: 0.0 };
    for (stem, passed) in pass {
        let covers = coverage.get(stem).is_some_and(|set| set.contains(sid));
        match (*passed, covers) {
            (false, true) => s.e_f += 1.0,
            (true, true) => s.e_p += 1.0,
            (false, false) => s.n_f += 1.0,
            (true, false) => s.n_p += 1.0,
        }
    }
    s
}

/// Rank every `sid` that appears in any test's coverage set, ordered
/// descending by `primary_metric`, ties broken by higher `e_f` then
/// ascending lexicographic `sid` (spec §4.6).
pub fn rank(
    coverage: &HashMap<String, HashSet<String>>,
    pass: &HashMap<String, bool>,
    primary_metric: &str,
) -> Vec<RankedStatement> {
    let mut sids: Vec<&String> = coverage.values().flatten().collect::<HashSet<_>>().into_iter().collect();
    sids.sort();

    let mut rows: Vec<RankedStatement> = sids
        .par_iter()
        .map(|sid| {
            let spectrum = spectrum_for(sid, coverage, pass);
            let scores = METRICS
                .iter()
                .map(|&name| (name, compute_metric(name, spectrum)))
                .collect();
            RankedStatement { sid: (*sid).clone(), e_f: spectrum.e_f, scores }
        })
        .collect();

    rows.sort_by(|a, b| {
        let a_primary = a.scores.iter().find(|(n, _)| *n == primary_metric).and_then(|(_, v)| *v);
        let b_primary = b.scores.iter().find(|(n, _)| *n == primary_metric).and_then(|(_, v)| *v);
        // Descending by primary metric, undefined (`None`) sorts last.
        cmp_desc_undefined_last(a_primary, b_primary)
            .then_with(|| b.e_f.partial_cmp(&a.e_f).unwrap_or(std::cmp::Ordering::Equal))
            .then_with(|| a.sid.cmp(&b.sid))
    });

    rows
}

fn cmp_desc_undefined_last(a: Option<f64>, b: Option<f64>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
