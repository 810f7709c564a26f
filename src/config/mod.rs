//! Configuration module
//!
//! Built-in defaults, overridden by a config file, then environment
//! variables, then command-line flags.

#![allow(dead_code)]

mod env;
mod file;

pub use env::EnvConfig;
pub use file::resolve;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::HarnessError;

/// How the expected section of a fixture is interpreted
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpectedMode {
    /// Evaluated with the same evaluator as the source expression
    #[default]
    Expression,
    /// Decoded directly as JSON
    Literal,
}

impl ExpectedMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "expression" | "expr" => Some(ExpectedMode::Expression),
            "literal" | "json" => Some(ExpectedMode::Literal),
            _ => None,
        }
    }
}

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory scanned for fixtures in suite mode
    pub fixtures_dir: PathBuf,

    /// Fixture file extension, without the dot
    pub extension: String,

    /// Per-evaluation timeout in milliseconds
    pub timeout_ms: u64,

    /// Worker pool size; defaults to available parallelism
    pub workers: Option<usize>,

    pub expected_mode: ExpectedMode,

    pub evaluator: EvaluatorConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fixtures_dir: PathBuf::from("test/golden"),
            extension: "golden".to_string(),
            timeout_ms: 1000,
            workers: None,
            expected_mode: ExpectedMode::Expression,
            evaluator: EvaluatorConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML or JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if is_yaml_file(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.timeout_ms == 0 {
            return Err(HarnessError::Config("timeout_ms must be positive".into()));
        }
        if self.workers == Some(0) {
            return Err(HarnessError::Config("workers must be positive".into()));
        }
        if self.evaluator.program.trim().is_empty() {
            return Err(HarnessError::Config("evaluator program is empty".into()));
        }
        if self.extension.is_empty() {
            return Err(HarnessError::Config("fixture extension is empty".into()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Configured worker count, or the number of available execution units
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

/// External evaluator command
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    pub program: String,

    /// Arguments; `{expr}` is replaced by the expression being evaluated
    pub args: Vec<String>,

    /// Working directory for the evaluator process
    pub working_dir: Option<PathBuf>,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            program: "nix-instantiate".to_string(),
            args: [
                "--eval",
                "--strict",
                "--json",
                "--show-trace",
                "-E",
                "{ input }: (import ./.).eval {} input",
                "--argstr",
                "input",
                "{expr}",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            working_dir: None,
        }
    }
}

/// Check if file is YAML based on extension
fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}
