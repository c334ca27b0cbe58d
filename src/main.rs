//! Command-line interface for sbfl-rs
//!
//! Locates a project under test and its test project inside a solution
//! directory, instruments, runs every test, ranks statements by
//! suspiciousness, and writes a report.

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use console::style;
use env_logger::Builder;
use indicatif::{ProgressBar, ProgressStyle};
use sbfl_rs::report::ReportFormat;
use sbfl_rs::runner::CargoCommandRunner;
use sbfl_rs::session::{self, SessionOptions};
use sbfl_rs::Config;
use std::path::PathBuf;
use std::time::Instant;

/// Spectrum-based fault localization for Rust projects
#[derive(Parser, Debug)]
#[command(
    name = "sbfl-rs",
    version,
    author,
    about = "Instrument, run, and rank a Rust project's statements by suspiciousness",
    long_about = None
)]
struct Cli {
    /// Directory containing the project under test and its test project
    #[arg(value_name = "SOLUTION_DIR")]
    solution_dir: PathBuf,

    /// Package name of the project holding the test methods
    #[arg(value_name = "TEST_PROJECT")]
    test_project_name: String,

    /// Package name of the project being instrumented
    #[arg(value_name = "PROJECT_UNDER_TEST")]
    project_under_test_name: String,

    /// Path to a configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Strip every probe before instrumenting, forcing a clean slate
    #[arg(short, long)]
    reset: bool,

    /// Strip every probe after the run completes
    #[arg(short, long)]
    cleanup: bool,

    /// Print the top suspicious statements to the console
    #[arg(short, long)]
    summary: bool,

    /// Number of rows shown in the console summary
    #[arg(short = 't', long, value_name = "N")]
    top: Option<usize>,

    /// Report format to emit
    #[arg(long, value_enum)]
    report_format: Option<ReportFormat>,

    /// Report output path
    #[arg(long, value_name = "PATH")]
    report_path: Option<PathBuf>,

    /// Set verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::from_file(path).with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Config::default(),
    };

    let cwd = std::env::current_dir().context("reading current directory")?;

    println!("{}", style("sbfl-rs").bold());
    println!("Solution: {}", cli.solution_dir.display());
    println!("Test project: {}", cli.test_project_name);
    println!("Project under test: {}", cli.project_under_test_name);
    println!();

    let start = Instant::now();
    let command_runner = CargoCommandRunner { verbose: cli.verbose > 0 };

    let options = SessionOptions {
        solution_dir: cli.solution_dir,
        test_project_name: cli.test_project_name,
        project_under_test_name: cli.project_under_test_name,
        reset: cli.reset,
        cleanup: cli.cleanup,
        print_summary: cli.summary,
        summary_rows: cli.top.unwrap_or(config.reporting.default_summary_rows),
        top_n: cli.top,
        primary_metric: "Ochiai",
        report_format: cli.report_format,
        report_path: cli.report_path,
        cwd,
        command_runner: &command_runner,
    };

    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid spinner template"),
    );
    progress.set_message("Instrumenting and running tests...");
    progress.enable_steady_tick(std::time::Duration::from_millis(100));

    let outcome = session::run(&config, &options).context("running SBFL session")?;

    progress.finish_with_message(format!("{}", "Run complete".green()));

    println!();
    println!(
        "Ran {} tests, ranked {} statements in {:.2?}",
        outcome.tests_run,
        outcome.ranked.len(),
        start.elapsed()
    );
    println!("Report written to {}", outcome.report_path.display());

    Ok(())
}

/// Initialize the logger based on verbosity settings
fn init_logger(verbosity: u8) {
    let mut builder = Builder::from_default_env();
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(level).format_timestamp(None).format_module_path(false).init();
}
