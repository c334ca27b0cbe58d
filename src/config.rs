//! Configuration structures for sbfl-rs

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration, loadable from a TOML file via `--config` and
/// overridable by CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Probe codec and instrumentation settings
    pub probe: ProbeConfig,

    /// Runner (build/test subprocess) settings
    pub runner: RunnerConfig,

    /// Report emission settings
    pub reporting: ReportingConfig,
}

/// Probe codec / AST rewriter / coverage directory settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Directory name (relative to the current working directory) where
    /// per-test coverage files and the rendezvous temp file live
    pub coverage_dir: PathBuf,

    /// Name of the singleton temp coverage file within `coverage_dir`
    pub temp_coverage_file: String,

    /// Path segments excluded from the production-source walk, compared
    /// case-insensitively
    pub excluded_segments: Vec<String>,

    /// Filename suffixes excluded from the production-source walk
    pub excluded_suffixes: Vec<String>,
}

/// Runner settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Wall-clock timeout, in seconds, for a single test process
    pub timeout_seconds: u64,
}

/// Reporting settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportingConfig {
    /// Default report format when `--report-format` is not given
    pub format: crate::report::ReportFormat,

    /// Default report file path (relative paths resolve against the
    /// current working directory)
    pub path: PathBuf,

    /// Number of rows shown in the console summary by default
    pub default_summary_rows: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            probe: ProbeConfig {
                coverage_dir: PathBuf::from("Coverage"),
                temp_coverage_file: "__current.coverage.tmp".to_string(),
                excluded_segments: vec![
                    "bin".to_string(),
                    "obj".to_string(),
                    "coverage".to_string(),
                    ".coverage".to_string(),
                    "target".to_string(),
                ],
                excluded_suffixes: vec![".g.rs".to_string(), ".designer.rs".to_string()],
            },
            runner: RunnerConfig { timeout_seconds: 30 },
            reporting: ReportingConfig {
                format: crate::report::ReportFormat::Csv,
                path: PathBuf::from("suspiciousness_report.csv"),
                default_summary_rows: 10,
            },
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> crate::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
