//! sbfl-rs: a spectrum-based fault localization tool for Rust projects.
//!
//! Given a solution directory holding a project under test and the test
//! project that exercises it, sbfl-rs instruments every statement it can
//! safely probe, runs each test in isolation, and ranks statements by how
//! suspicious their pass/fail coverage pattern looks under five SBFL
//! formulas (Tarantula, Ochiai, D*, Op2, Jaccard).
//!
//! # Architecture
//!
//! - [`probe`]: the sentinel-comment codec a single probe encodes to and
//!   decodes from
//! - [`ast`]: parses a source file and finds every instrumentable
//!   statement and match arm
//! - [`rewriter`]: applies the codec across a file's text — instrument,
//!   retarget, strip — and recovers the identifier map from surviving
//!   probes
//! - [`discovery`]: enumerates test methods by attribute marker
//! - [`runner`]: builds once, then runs each test in its own subprocess,
//!   promoting its coverage file between runs
//! - [`coverage`]: loads each test's `.coverage` file into a set of `sid`s
//! - [`ranker`]: computes suspiciousness scores from the coverage matrix
//!   and pass/fail vector
//! - [`report`]: renders the ranked statements as CSV or Markdown
//! - [`manifest`]: resolves a package name to its `Cargo.toml`
//! - [`session`]: wires the above into one end-to-end run
//! - [`config`]: on-disk configuration, loadable via `--config`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::similar_names)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod ast;
pub mod config;
pub mod coverage;
pub mod discovery;
pub mod error;
pub mod fsutil;
pub mod manifest;
pub mod probe;
pub mod ranker;
pub mod report;
pub mod rewriter;
pub mod runner;
pub mod session;

pub use config::Config;
pub use error::{Error, Result};
pub use session::{SessionOptions, SessionOutcome};
