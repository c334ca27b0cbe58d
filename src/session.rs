//! Orchestration (spec.md §6.1, §6.3): resolve → instrument → discover →
//! run → load coverage → rank → report, in one call.

use crate::config::Config;
use crate::rewriter::IdentifierEntry;
use crate::runner::{CommandRunner, Runner};
use crate::{discovery, manifest, ranker, report, rewriter, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Everything the CLI layer gathers before a run (spec §6.1's flag
/// surface, minus logging verbosity which `main` handles directly).
pub struct SessionOptions<'a> {
    /// Directory containing the project-under-test and test project
    pub solution_dir: PathBuf,
    /// Package name of the project holding the test methods
    pub test_project_name: String,
    /// Package name of the project being instrumented
    pub project_under_test_name: String,
    /// Strip every probe before instrumenting, forcing a clean slate
    pub reset: bool,
    /// Strip every probe after the run completes
    pub cleanup: bool,
    /// Print the top suspicious statements to the console
    pub print_summary: bool,
    /// Number of rows to show in the console summary
    pub summary_rows: usize,
    /// Truncate both the report and the summary to the first `N` rows
    /// after ordering (spec §4.7)
    pub top_n: Option<usize>,
    /// Suspiciousness metric the ranking and report are ordered by
    pub primary_metric: &'static str,
    /// Report format override, falling back to configuration when absent
    pub report_format: Option<crate::report::ReportFormat>,
    /// Report path override, falling back to configuration when absent
    pub report_path: Option<PathBuf>,
    /// Current working directory, against which relative paths resolve
    pub cwd: PathBuf,
    /// Subprocess backend (real `cargo`, or a fake in tests)
    pub command_runner: &'a dyn CommandRunner,
}

/// What a completed session produced.
pub struct SessionOutcome {
    /// Every ranked statement, highest suspiciousness first
    pub ranked: Vec<ranker::RankedStatement>,
    /// Where each ranked statement's `sid` points, for display
    pub identifiers: HashMap<String, IdentifierEntry>,
    /// Path the report was written to
    pub report_path: PathBuf,
    /// Number of tests discovered and run
    pub tests_run: usize,
}

/// Run one full SBFL session end to end.
pub fn run(config: &Config, options: &SessionOptions) -> Result<SessionOutcome> {
    let test_project = manifest::resolve(&options.solution_dir, &options.test_project_name)?;
    let project_under_test = manifest::resolve(&options.solution_dir, &options.project_under_test_name)?;

    let coverage_dir = resolve_against(&options.cwd, &config.probe.coverage_dir);
    let sink = coverage_dir.join(&config.probe.temp_coverage_file);

    if options.reset {
        rewriter::strip_tree(&project_under_test.root_dir, &config.probe.excluded_segments, &config.probe.excluded_suffixes);
    }
    rewriter::retarget_tree(&project_under_test.root_dir, &sink, &config.probe.excluded_segments, &config.probe.excluded_suffixes);
    rewriter::instrument_tree(&project_under_test.root_dir, &sink, &config.probe.excluded_segments, &config.probe.excluded_suffixes)?;

    let identifiers = collect_identifier_map(&project_under_test.root_dir, &config.probe.excluded_segments, &config.probe.excluded_suffixes)?;

    let tests = discovery::discover_tests(&test_project.root_dir, &config.probe.excluded_segments, &config.probe.excluded_suffixes);

    let runner = Runner::new(coverage_dir.clone(), config.probe.temp_coverage_file.clone(), Duration::from_secs(config.runner.timeout_seconds), options.command_runner);
    let pass = runner.run(&test_project.manifest_path, &tests)?;

    let stems: Vec<String> = tests.iter().map(discovery::DiscoveredTest::stem).collect();
    let coverage = crate::coverage::load_all(&coverage_dir, stems.iter().map(String::as_str));

    let ranked = ranker::rank(&coverage, &pass, options.primary_metric);

    if options.cleanup {
        rewriter::strip_tree(&project_under_test.root_dir, &config.probe.excluded_segments, &config.probe.excluded_suffixes);
    }

    let format = options.report_format.unwrap_or(config.reporting.format);
    let report_path = report::resolve_path(
        options.report_path.as_deref().or(Some(config.reporting.path.as_path())),
        format,
        &options.cwd,
    );
    let rendered = report::render(format, &ranked, &identifiers, options.top_n);
    report::write_atomic(&report_path, &rendered)?;
    if options.print_summary {
        report::print_summary(&ranked, &identifiers, options.summary_rows, options.primary_metric);
    }

    Ok(SessionOutcome { ranked, identifiers, report_path, tests_run: tests.len() })
}

fn resolve_against(cwd: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        cwd.join(p)
    }
}

fn collect_identifier_map(
    root: &Path,
    excluded_segments: &[String],
    excluded_suffixes: &[String],
) -> Result<HashMap<String, IdentifierEntry>> {
    let files = crate::fsutil::walk_rust_files(root, excluded_segments, excluded_suffixes);
    let mut merged = HashMap::new();
    for file in files {
        for (sid, entry) in rewriter::identifier_map_for_file(&file)? {
            merged.insert(sid, entry);
        }
    }
    Ok(merged)
}
