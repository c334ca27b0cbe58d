//! End-to-end seed scenarios from spec.md §8, driven through the public
//! session API with a scripted fake command runner instead of a real
//! `cargo` toolchain.

mod common;

use common::{scaffold, FakeCommandRunner, Scripted};
use sbfl_rs::report::ReportFormat;
use sbfl_rs::runner::{CommandRunner, Runner, TestOutcome};
use sbfl_rs::session::{self, SessionOptions};
use sbfl_rs::Config;
use std::path::Path;
use std::time::Duration;

const UNDER_TEST: &str = "pub fn add(a: i32, b: i32) -> i32 {\n    let sum = a + b;\n    sum\n}\n";
const ONE_PASSING_TEST: &str = "#[test]\nfn adds_two_numbers() {\n    assert_eq!(1 + 1, 2);\n}\n";

fn base_options<'a>(
    sol: &common::Scaffold,
    cwd: &Path,
    command_runner: &'a dyn CommandRunner,
) -> SessionOptions<'a> {
    SessionOptions {
        solution_dir: sol.solution_dir(),
        test_project_name: sol.test_project_name.clone(),
        project_under_test_name: sol.project_under_test_name.clone(),
        reset: false,
        cleanup: false,
        print_summary: false,
        summary_rows: 10,
        top_n: None,
        primary_metric: "Ochiai",
        report_format: None,
        report_path: None,
        cwd: cwd.to_path_buf(),
        command_runner,
    }
}

#[test]
fn end_to_end_run_instruments_executes_and_ranks() {
    let sol = scaffold(UNDER_TEST, ONE_PASSING_TEST);
    let cwd = tempfile::tempdir().unwrap();
    let config = Config::default();
    let coverage_dir = cwd.path().join(&config.probe.coverage_dir);

    let fake = FakeCommandRunner::new(coverage_dir, config.probe.temp_coverage_file.clone())
        .script("adds_two_numbers", Scripted::Write(vec!["will-be-overwritten"], TestOutcome::Passed));

    let options = base_options(&sol, cwd.path(), &fake);
    let outcome = session::run(&config, &options).unwrap();

    assert_eq!(outcome.tests_run, 1);
    assert!(sol.under_test_src().exists());
    let instrumented = std::fs::read_to_string(sol.under_test_src()).unwrap();
    assert!(instrumented.lines().any(sbfl_rs::probe::looks_like_probe));
    assert!(outcome.report_path.exists());
}

/// S4 — a hanging test is killed at the configured timeout, is recorded
/// as failed, and the run continues to completion.
#[test]
fn s4_timeout_kills_hanging_test_and_continues() {
    let under_test = "pub fn f(x: i32) -> i32 {\n    let y = x + 1;\n    y\n}\n";
    let two_tests = "#[test]\nfn slow() {}\n\n#[test]\nfn fast() {\n    assert!(true);\n}\n";
    let sol = scaffold(under_test, two_tests);
    let cwd = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.runner.timeout_seconds = 1;
    let coverage_dir = cwd.path().join(&config.probe.coverage_dir);

    let fake = FakeCommandRunner::new(coverage_dir.clone(), config.probe.temp_coverage_file.clone())
        .script("slow", Scripted::HangForever)
        .script("fast", Scripted::Write(vec!["sid-fast"], TestOutcome::Passed));

    let options = base_options(&sol, cwd.path(), &fake);
    let outcome = session::run(&config, &options).unwrap();

    assert_eq!(outcome.tests_run, 2);
    // The fast test's promotion must have happened too: both coverage
    // files exist, no leftover temp file.
    let entries: Vec<_> = std::fs::read_dir(&coverage_dir).unwrap().filter_map(|e| e.ok()).collect();
    assert_eq!(entries.len(), 2);
    assert!(!coverage_dir.join(&config.probe.temp_coverage_file).exists());
}

/// S4's timeout contract in isolation: the Runner's own timeout fires
/// even when the fake backend never returns control within it.
#[test]
fn runner_times_out_a_hanging_test_in_under_two_seconds() {
    let dir = tempfile::tempdir().unwrap();
    let coverage_dir = dir.path().join("Coverage");
    let fake = FakeCommandRunner::new(coverage_dir.clone(), "__current.coverage.tmp".to_string())
        .script("hang", Scripted::HangForever);

    let tests = vec![sbfl_rs::discovery::DiscoveredTest {
        file: dir.path().join("lib.rs"),
        type_name: "crate".to_string(),
        method_name: "hang".to_string(),
        fully_qualified_name: "crate.hang".to_string(),
    }];

    let runner = Runner::new(coverage_dir, "__current.coverage.tmp".to_string(), Duration::from_millis(200), &fake);
    let start = std::time::Instant::now();
    let pass = runner.run(Path::new("Cargo.toml"), &tests).unwrap();
    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(pass.get("crate.hang"), Some(&false));
}

/// S5 — reset tears every probe out of the production tree and leaves
/// the coverage directory empty.
#[test]
fn s5_reset_leaves_no_probes_and_an_empty_coverage_dir() {
    let sol = scaffold(UNDER_TEST, ONE_PASSING_TEST);
    let config = Config::default();

    // Instrument once by hand, as a prior run would have left it.
    let sink = Path::new("/tmp/whatever/__current.coverage.tmp");
    sbfl_rs::rewriter::instrument_file(&sol.under_test_src(), sink).unwrap();
    assert!(std::fs::read_to_string(sol.under_test_src()).unwrap().lines().any(sbfl_rs::probe::looks_like_probe));

    let root = sol.solution_dir().join(&sol.project_under_test_name);
    sbfl_rs::rewriter::strip_tree(&root, &config.probe.excluded_segments, &config.probe.excluded_suffixes);
    assert!(!std::fs::read_to_string(sol.under_test_src()).unwrap().lines().any(sbfl_rs::probe::looks_like_probe));

    let coverage_dir = sol.solution_dir().join("Coverage");
    std::fs::create_dir_all(&coverage_dir).unwrap();
    std::fs::write(coverage_dir.join("stale.coverage"), "abc\n").unwrap();
    let fake = FakeCommandRunner::new(coverage_dir.clone(), config.probe.temp_coverage_file.clone());
    let runner = Runner::new(coverage_dir.clone(), config.probe.temp_coverage_file.clone(), Duration::from_secs(1), &fake);
    runner.reset_coverage_dir().unwrap();

    let entries: Vec<_> = std::fs::read_dir(&coverage_dir).unwrap().filter_map(|e| e.ok()).collect();
    assert!(entries.is_empty());
}

/// S6 — `--top 2` with a markdown report yields exactly header +
/// separator + two data rows, ordered by descending Ochiai.
#[test]
fn s6_top_n_markdown_report_has_exactly_four_lines() {
    let under_test = "pub fn f(x: i32) -> i32 {\n    let a = x + 1;\n    let b = x + 2;\n    let c = x + 3;\n    a + b + c\n}\n";
    let one_failing_test = "#[test]\nfn fails() {\n    panic!(\"boom\");\n}\n";
    let sol = scaffold(under_test, one_failing_test);
    let cwd = tempfile::tempdir().unwrap();
    let config = Config::default();
    let coverage_dir = cwd.path().join(&config.probe.coverage_dir);

    // Instrument first, ourselves, so we know exactly which sids exist,
    // then script the fake runner to report all of them as covered by
    // the one failing test.
    let root = sol.solution_dir().join(&sol.project_under_test_name);
    let sink = coverage_dir.join(&config.probe.temp_coverage_file);
    let identifiers =
        sbfl_rs::rewriter::instrument_tree(&root, &sink, &config.probe.excluded_segments, &config.probe.excluded_suffixes).unwrap();
    let mut sids: Vec<String> = identifiers.keys().cloned().collect();
    sids.sort();
    assert!(sids.len() >= 3, "expected at least 3 probed statements, got {}", sids.len());

    let sids_static: Vec<&'static str> = sids.iter().map(|s| Box::leak(s.clone().into_boxed_str()) as &str).collect();
    let fake = FakeCommandRunner::new(coverage_dir, config.probe.temp_coverage_file.clone())
        .script("fails", Scripted::Write(sids_static, TestOutcome::Failed));

    let mut options = base_options(&sol, cwd.path(), &fake);
    options.report_format = Some(ReportFormat::Markdown);
    options.top_n = Some(2);

    let outcome = session::run(&config, &options).unwrap();
    let content = std::fs::read_to_string(&outcome.report_path).unwrap();
    assert_eq!(content.lines().count(), 4, "header + separator + 2 data rows, got:\n{content}");
}
