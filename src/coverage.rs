//! Coverage Loader (spec.md §4.5): reads each test's `.coverage` file into
//! a set of `sid`s.

use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Load the coverage set for one test stem. A missing file is not an
/// error: it means the test covered nothing we can attribute (spec §3),
/// and is logged at `warn` rather than propagated.
pub fn load_one(coverage_dir: &Path, stem: &str) -> HashSet<String> {
    let path = coverage_dir.join(format!("{stem}.coverage"));
    let Ok(content) = std::fs::read_to_string(&path) else {
        log::warn!("{}: no coverage file for test '{stem}'", path.display());
        return HashSet::new();
    };

    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Load coverage sets for every given stem (spec §4.5: "returns mapping
/// `stem -> set<sid>`").
pub fn load_all<'a>(coverage_dir: &Path, stems: impl IntoIterator<Item = &'a str>) -> HashMap<String, HashSet<String>> {
    stems
        .into_iter()
        .map(|stem| (stem.to_string(), load_one(coverage_dir, stem)))
        .collect()
}
