//! Error types for sbfl-rs

use thiserror::Error;
use std::path::PathBuf;

/// The main error type for sbfl-rs operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO-related errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A required argument was missing or malformed
    #[error("argument error: {0}")]
    Argument(String),

    /// A path named on the command line does not exist
    #[error("path not found: {0}")]
    PathNotFound(PathBuf),

    /// Parsing errors when analyzing Rust code
    #[error("parse error: {0}")]
    Parse(String),

    /// The project-under-test or test-project manifest could not be resolved
    #[error("could not locate project '{0}' under {1}")]
    ManifestNotFound(String, PathBuf),

    /// `cargo build` failed
    #[error("build failed: {0}")]
    BuildFailure(String),

    /// A test process exceeded its wall-clock timeout
    #[error("test timed out: {0}")]
    TestTimeout(String),

    /// The temporary coverage file could not be promoted to its final name
    #[error("coverage promotion failed for {0}: {1}")]
    PromotionFailure(String, String),

    /// Report serialization or writing failed
    #[error("failed to write report to {0}: {1}")]
    ReportWrite(PathBuf, String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Generic errors, used sparingly for conditions with no dedicated variant
    #[error("{0}")]
    Generic(String),
}

/// Type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;
