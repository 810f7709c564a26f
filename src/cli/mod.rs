//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::config::{AppConfig, ExpectedMode};
use crate::error::HarnessError;

/// Golden-fixture test harness for an external expression evaluator
#[derive(Parser, Debug)]
#[command(name = "golden-runner")]
#[command(version)]
#[command(about = "Run golden fixtures against an external evaluator")]
#[command(long_about = None)]
pub struct Args {
    /// Fixture file to run on its own; omit to run the whole suite
    #[arg(value_name = "FIXTURE")]
    pub fixtures: Vec<PathBuf>,

    /// Directory containing the fixture suite
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Fixture file extension
    #[arg(short, long)]
    pub extension: Option<String>,

    /// Per-evaluation timeout in milliseconds
    #[arg(short, long)]
    pub timeout_ms: Option<u64>,

    /// Number of parallel workers
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Evaluator program (arguments come from the config file)
    #[arg(long)]
    pub evaluator: Option<String>,

    /// Treat the expected section as a JSON literal instead of an expression
    #[arg(long)]
    pub expected_literal: bool,

    /// Config file (YAML or JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,

    /// Disable colored progress markers
    #[arg(long)]
    pub no_color: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// What the invocation asks for
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    Suite,
    Single(PathBuf),
}

impl Args {
    pub fn mode(&self) -> Result<Mode, HarnessError> {
        match self.fixtures.as_slice() {
            [] => Ok(Mode::Suite),
            [path] => Ok(Mode::Single(path.clone())),
            more => Err(HarnessError::Usage(format!(
                "expected at most one fixture path, got {}",
                more.len()
            ))),
        }
    }

    /// Apply command-line overrides on top of file and environment settings
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(dir) = &self.dir {
            config.fixtures_dir = dir.clone();
        }
        if let Some(extension) = &self.extension {
            config.extension = extension.trim_start_matches('.').to_string();
        }
        if let Some(timeout) = self.timeout_ms {
            config.timeout_ms = timeout;
        }
        if let Some(jobs) = self.jobs {
            config.workers = Some(jobs);
        }
        if let Some(program) = &self.evaluator {
            config.evaluator.program = program.clone();
        }
        if self.expected_literal {
            config.expected_mode = ExpectedMode::Literal;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments_is_suite_mode() {
        let args = Args::parse_from(["golden-runner"]);
        assert_eq!(args.mode().unwrap(), Mode::Suite);
        assert_eq!(args.format, "text");
    }

    #[test]
    fn test_one_argument_is_single_mode() {
        let args = Args::parse_from(["golden-runner", "test/golden/00001.golden"]);
        assert_eq!(
            args.mode().unwrap(),
            Mode::Single(PathBuf::from("test/golden/00001.golden"))
        );
    }

    #[test]
    fn test_two_arguments_is_usage_error() {
        let args = Args::parse_from(["golden-runner", "a.golden", "b.golden"]);
        assert!(matches!(args.mode(), Err(HarnessError::Usage(_))));
    }

    #[test]
    fn test_overrides() {
        let args = Args::parse_from([
            "golden-runner",
            "--dir",
            "fixtures",
            "--extension",
            ".gold",
            "--timeout-ms",
            "250",
            "-j",
            "3",
            "--evaluator",
            "my-eval",
            "--expected-literal",
            "-vv",
        ]);
        let mut config = AppConfig::default();
        args.apply(&mut config);

        assert_eq!(config.fixtures_dir, PathBuf::from("fixtures"));
        assert_eq!(config.extension, "gold");
        assert_eq!(config.timeout_ms, 250);
        assert_eq!(config.workers, Some(3));
        assert_eq!(config.evaluator.program, "my-eval");
        assert_eq!(config.expected_mode, ExpectedMode::Literal);
        assert_eq!(args.verbose, 2);
    }
}
