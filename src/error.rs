//! Error types
//!
//! Fixture and evaluation errors are typed so they can be turned into
//! failing test results; everything else flows through `anyhow`.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// A fixture file that could not be turned into a test case
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("malformed fixture {identity}: {reason}")]
    Malformed { identity: String, reason: String },

    #[error("cannot read fixture {identity}: {source}")]
    Unreadable {
        identity: String,
        #[source]
        source: io::Error,
    },
}

impl FixtureError {
    pub fn identity(&self) -> &str {
        match self {
            FixtureError::Malformed { identity, .. } | FixtureError::Unreadable { identity, .. } => {
                identity
            }
        }
    }
}

/// Why a single evaluator invocation did not produce a value
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("evaluation exceeded {0:?}")]
    Timeout(Duration),

    #[error("evaluator exited with status {status}")]
    Crash { status: i32, stderr: Vec<String> },

    #[error("malformed evaluator output: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("failed to start evaluator: {0}")]
    Spawn(#[source] io::Error),

    #[error("failed to collect evaluator output: {0}")]
    Wait(#[source] io::Error),
}

impl EvaluationError {
    /// Diagnostic lines carried by the resulting failure outcome
    pub fn into_diagnostic(self) -> Vec<String> {
        match self {
            EvaluationError::Timeout(_) => vec!["Timed out.".to_string()],
            EvaluationError::Crash { status, stderr } => {
                if stderr.is_empty() {
                    vec![format!("Evaluator exited with status {status} and no diagnostic.")]
                } else {
                    stderr
                }
            }
            EvaluationError::Decode(err) => vec![format!("Malformed evaluator output: {err}")],
            EvaluationError::Spawn(err) => vec![format!("Failed to start evaluator: {err}")],
            EvaluationError::Wait(err) => {
                vec![format!("Failed to collect evaluator output: {err}")]
            }
        }
    }
}

/// Errors that stop the program before or instead of scheduling
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Fixture(#[from] FixtureError),

    #[error("cannot list fixture directory {}: {source}", .path.display())]
    FixtureDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}
