//! Golden Runner - golden-fixture test harness for external evaluators
//!
//! Each fixture pairs a source expression with an expected-result expression.
//! Both are evaluated by an external command and their values are compared
//! after canonicalization.
//!
//! ## Features
//!
//! - Parallel evaluation on a fixed worker pool, shortest fixtures first
//! - Deterministic, fail-fast reporting of the first failure in that order
//! - Per-evaluation timeouts; crashes and hangs are reported like mismatches
//! - Text or JSON output
//!
//! ## Usage
//!
//! ```bash
//! # Run the whole suite
//! golden-runner
//!
//! # Run one fixture and print its report
//! golden-runner test/golden/00042.golden
//!
//! # Custom fixture directory and timeout
//! golden-runner --dir fixtures --timeout-ms 5000
//! ```

use anyhow::Result;
use clap::{CommandFactory, Parser};
use std::io::{self, IsTerminal, Write};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};

mod cli;
mod compare;
mod config;
mod error;
mod evaluator;
mod executor;
mod models;
mod output;
mod utils;

use cli::{Args, Mode};
use config::{AppConfig, EnvConfig};
use error::HarnessError;
use evaluator::{Evaluator, ProcessEvaluator};
use executor::{CaseRunner, Scheduler};
use models::{load_all_fixtures, load_fixture};
use output::{OutputFormat, Reporter};
use utils::logger::{init_logger, LogLevel};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logger(LogLevel::from_verbosity(args.verbose));

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            if let Some(HarnessError::Usage(message)) = err.downcast_ref::<HarnessError>() {
                eprintln!("error: {message}");
                eprintln!("{}", Args::command().render_usage());
                return ExitCode::from(2);
            }
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every case passed
async fn run(args: Args) -> Result<bool> {
    let mode = args.mode()?;
    let format = OutputFormat::from_str(&args.format)
        .ok_or_else(|| HarnessError::Usage(format!("unknown output format '{}'", args.format)))?;

    let mut config = config::resolve(args.config.as_deref(), &EnvConfig::load())?;
    args.apply(&mut config);
    config.validate()?;

    let mut reporter = Reporter::new(format);
    if args.no_color || !io::stdout().is_terminal() {
        reporter = reporter.no_color();
    }

    let evaluator = Arc::new(ProcessEvaluator::from_config(&config.evaluator));
    let runner =
        CaseRunner::new(evaluator, config.timeout()).with_expected_mode(config.expected_mode);

    match mode {
        Mode::Single(path) => run_single(&runner, &path, &reporter).await,
        Mode::Suite => run_suite(runner, &config, &reporter).await,
    }
}

async fn run_single<E: Evaluator>(
    runner: &CaseRunner<E>,
    path: &Path,
    reporter: &Reporter,
) -> Result<bool> {
    let case = load_fixture(path).map_err(HarnessError::from)?;
    info!("Running {}", case.identity);

    let result = runner.run_case(&case).await;
    print!("{}", reporter.render_result(&result));
    Ok(result.success)
}

async fn run_suite<E: Evaluator>(
    runner: CaseRunner<E>,
    config: &AppConfig,
    reporter: &Reporter,
) -> Result<bool> {
    let fixtures = load_all_fixtures(&config.fixtures_dir, &config.extension)?;
    if fixtures.is_empty() {
        warn!(
            "No .{} fixtures found in {}",
            config.extension,
            config.fixtures_dir.display()
        );
    }

    let scheduler = Scheduler::new(runner, config.worker_count());
    let mut stdout = io::stdout();
    let summary = scheduler
        .run_all(fixtures, |progress| {
            if reporter.shows_progress() {
                let _ = write!(stdout, "{}", reporter.render_progress(progress));
                let _ = stdout.flush();
            }
        })
        .await;

    if reporter.shows_progress() {
        println!();
    }
    print!("{}", reporter.render_summary(&summary));
    Ok(summary.is_success())
}
