//! Shared scaffolding for sbfl-rs integration tests: builds a tiny
//! two-crate solution (project under test + test project) on disk and a
//! fake [`sbfl_rs::runner::CommandRunner`] that never shells out to a
//! real `cargo`.
#![allow(dead_code)]

use sbfl_rs::runner::{CommandRunner, TestOutcome};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// A solution directory with one project under test and one test
/// project, both minimal valid Cargo packages.
pub struct Scaffold {
    pub dir: tempfile::TempDir,
    pub project_under_test_name: String,
    pub test_project_name: String,
}

impl Scaffold {
    pub fn solution_dir(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    pub fn under_test_src(&self) -> PathBuf {
        self.dir.path().join(&self.project_under_test_name).join("src/lib.rs")
    }
}

/// Create a solution with `under_test_source` as the project-under-test's
/// `src/lib.rs` and `test_source` as the test project's `src/lib.rs`.
pub fn scaffold(under_test_source: &str, test_source: &str) -> Scaffold {
    let dir = tempfile::tempdir().unwrap();
    let project_under_test_name = "under_test".to_string();
    let test_project_name = "under_test_tests".to_string();

    let proj_dir = dir.path().join(&project_under_test_name);
    std::fs::create_dir_all(proj_dir.join("src")).unwrap();
    std::fs::write(
        proj_dir.join("Cargo.toml"),
        format!("[package]\nname = \"{project_under_test_name}\"\nversion = \"0.1.0\"\n"),
    )
    .unwrap();
    std::fs::write(proj_dir.join("src/lib.rs"), under_test_source).unwrap();

    let tests_dir = dir.path().join(&test_project_name);
    std::fs::create_dir_all(tests_dir.join("src")).unwrap();
    std::fs::write(
        tests_dir.join("Cargo.toml"),
        format!("[package]\nname = \"{test_project_name}\"\nversion = \"0.1.0\"\n"),
    )
    .unwrap();
    std::fs::write(tests_dir.join("src/lib.rs"), test_source).unwrap();

    Scaffold { dir, project_under_test_name, test_project_name }
}

/// Per-test scripted behavior for [`FakeCommandRunner`].
pub enum Scripted {
    /// Append these sids to the coverage file, then report this outcome.
    Write(Vec<&'static str>, TestOutcome),
    /// Never return (the runner's own timeout must kill it).
    HangForever,
}

/// A [`CommandRunner`] driven entirely by a per-test script, so
/// integration tests can exercise the Runner's promotion/timeout logic
/// without a real `cargo` toolchain.
pub struct FakeCommandRunner {
    pub coverage_dir: PathBuf,
    pub temp_coverage_file: String,
    pub build_succeeds: bool,
    pub script: Mutex<HashMap<String, Scripted>>,
}

impl FakeCommandRunner {
    pub fn new(coverage_dir: PathBuf, temp_coverage_file: String) -> Self {
        Self { coverage_dir, temp_coverage_file, build_succeeds: true, script: Mutex::new(HashMap::new()) }
    }

    pub fn script(mut self, fqn_suffix: &str, script: Scripted) -> Self {
        // Matched by suffix since the fully-qualified name includes a
        // discovery-derived module path prefix the test doesn't predict.
        self.script.get_mut().unwrap().insert(fqn_suffix.to_string(), script);
        self
    }
}

impl CommandRunner for FakeCommandRunner {
    fn build(&self, _manifest_path: &Path) -> sbfl_rs::Result<bool> {
        Ok(self.build_succeeds)
    }

    fn run_test(&self, _manifest_path: &Path, fqn: &str, timeout: Duration) -> TestOutcome {
        let script = self.script.lock().unwrap();
        let entry = script.iter().find(|(suffix, _)| fqn.ends_with(suffix.as_str()));
        match entry {
            Some((_, Scripted::Write(sids, outcome))) => {
                let content = sids.iter().map(|s| format!("{s}\n")).collect::<String>();
                std::fs::write(self.coverage_dir.join(&self.temp_coverage_file), content).unwrap();
                *outcome
            }
            Some((_, Scripted::HangForever)) => {
                // Simulate the real `CargoCommandRunner`'s contract (spec
                // §4.4.b): a test that never finishes is killed at the
                // timeout and recorded as failed.
                std::thread::sleep(timeout);
                TestOutcome::TimedOut
            }
            None => TestOutcome::Failed,
        }
    }
}
