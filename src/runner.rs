//! Runner (spec.md §4.4): build once, then run each test in a fresh
//! subprocess, promoting its coverage file before the next test starts.
//!
//! The subprocess boundary is a small trait (grounded on the teacher's
//! `framework::TestRunner` / `InstrumentationStrategy` trait-per-strategy
//! pattern) so integration tests can exercise the promotion/timeout logic
//! against a fake runner instead of shelling out to a real `cargo`
//! (spec §9's test-tooling note).

use crate::discovery::DiscoveredTest;
use crate::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Outcome of running a single test subprocess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestOutcome {
    /// Exited with status 0
    Passed,
    /// Exited with a non-zero status
    Failed,
    /// Killed after exceeding the wall-clock timeout
    TimedOut,
}

/// The two subprocess contracts the Runner depends on (spec §6.4): build
/// once, then run one test filtered by fully-qualified name.
pub trait CommandRunner: Send + Sync {
    /// Build the project under test. `true` on success.
    fn build(&self, manifest_path: &Path) -> Result<bool>;

    /// Run exactly one test, identified by its fully-qualified name.
    fn run_test(&self, manifest_path: &Path, fully_qualified_name: &str, timeout: Duration) -> TestOutcome;
}

/// Real subprocess-backed implementation: `cargo build --tests` and
/// `cargo test -- --exact <fqn>` (spec §6.4, realized via Cargo per
/// SPEC_FULL §4.4).
pub struct CargoCommandRunner {
    /// Whether to surface child stdout/stderr (spec §6.4: "surfaced only
    /// in verbose mode").
    pub verbose: bool,
}

impl CommandRunner for CargoCommandRunner {
    fn build(&self, manifest_path: &Path) -> Result<bool> {
        let output = Command::new("cargo")
            .args(["build", "--tests", "--manifest-path"])
            .arg(manifest_path)
            .output()?;

        if !output.status.success() || self.verbose {
            log::info!("{}", String::from_utf8_lossy(&output.stdout));
            log::info!("{}", String::from_utf8_lossy(&output.stderr));
        }
        Ok(output.status.success())
    }

    fn run_test(&self, manifest_path: &Path, fully_qualified_name: &str, timeout: Duration) -> TestOutcome {
        let stdio = |verbose: bool| if verbose { Stdio::inherit() } else { Stdio::null() };
        let mut child = match Command::new("cargo")
            .args(["test", "--manifest-path"])
            .arg(manifest_path)
            .arg("--")
            .arg("--exact")
            .arg(fully_qualified_name)
            .stdout(stdio(self.verbose))
            .stderr(stdio(self.verbose))
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                log::error!("failed to spawn test process for '{fully_qualified_name}': {e}");
                return TestOutcome::Failed;
            }
        };

        let start = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    return if status.success() { TestOutcome::Passed } else { TestOutcome::Failed };
                }
                Ok(None) => {
                    if start.elapsed() >= timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        return TestOutcome::TimedOut;
                    }
                    std::thread::sleep(Duration::from_millis(50));
                }
                Err(e) => {
                    log::error!("error waiting on test process for '{fully_qualified_name}': {e}");
                    return TestOutcome::Failed;
                }
            }
        }
    }
}

/// Orchestrates the build-once-then-run-each-test loop and coverage
/// promotion (spec §4.4, §5).
pub struct Runner<'a> {
    /// Directory holding per-test coverage files and the temp rendezvous
    /// file
    pub coverage_dir: PathBuf,
    /// Name of the singleton temp coverage file within `coverage_dir`
    pub temp_coverage_file: String,
    /// Wall-clock timeout for a single test
    pub timeout: Duration,
    command_runner: &'a dyn CommandRunner,
}

impl<'a> Runner<'a> {
    /// Build a runner around the given coverage directory and command
    /// backend.
    pub fn new(coverage_dir: PathBuf, temp_coverage_file: String, timeout: Duration, command_runner: &'a dyn CommandRunner) -> Self {
        Self { coverage_dir, temp_coverage_file, timeout, command_runner }
    }

    /// Absolute path probes should append to — the sink baked into every
    /// probe for this run (spec §3, §9).
    pub fn temp_coverage_path(&self) -> PathBuf {
        self.coverage_dir.join(&self.temp_coverage_file)
    }

    /// Delete everything under the coverage directory and recreate it
    /// (spec §4.4 step 1).
    pub fn reset_coverage_dir(&self) -> Result<()> {
        if self.coverage_dir.exists() {
            if let Err(e) = std::fs::remove_dir_all(&self.coverage_dir) {
                log::warn!("{}: failed to clear coverage directory: {e}", self.coverage_dir.display());
            }
        }
        std::fs::create_dir_all(&self.coverage_dir)?;
        Ok(())
    }

    /// Build once, then run every test in discovery order, returning the
    /// pass/fail vector keyed by coverage stem.
    pub fn run(&self, manifest_path: &Path, tests: &[DiscoveredTest]) -> Result<HashMap<String, bool>> {
        self.reset_coverage_dir()?;

        if !self.command_runner.build(manifest_path)? {
            return Err(Error::BuildFailure(format!("cargo build failed for {}", manifest_path.display())));
        }

        let mut pass = HashMap::new();
        for test in tests {
            let outcome = self
                .command_runner
                .run_test(manifest_path, &test.fully_qualified_name, self.timeout);
            let passed = matches!(outcome, TestOutcome::Passed);
            if matches!(outcome, TestOutcome::TimedOut) {
                log::warn!("test '{}' timed out after {:?}", test.fully_qualified_name, self.timeout);
            }
            pass.insert(test.stem(), passed);
            self.promote(&test.stem());
        }
        Ok(pass)
    }

    /// Promote the singleton temp coverage file to `<stem>.coverage`
    /// (spec §4.4 step d–e, §5's central ordering invariant: this
    /// returns before the next test in `run`'s loop is spawned).
    fn promote(&self, stem: &str) {
        let temp = self.temp_coverage_path();
        let target = self.coverage_dir.join(format!("{stem}.coverage"));

        if target.exists() {
            if let Err(e) = std::fs::remove_file(&target) {
                log::warn!("{}: failed to remove stale coverage file: {e}", target.display());
            }
        }

        if temp.exists() {
            if let Err(e) = std::fs::rename(&temp, &target) {
                log::warn!("{}: failed to promote coverage file: {e}", target.display());
            }
        } else {
            log::warn!("no coverage produced for test '{stem}'");
        }

        let _ = std::fs::remove_file(&temp);
    }
}
