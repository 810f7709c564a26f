//! External process evaluator
//!
//! Runs the configured command once per expression, passing the expression as
//! a single argv element. Stdout must hold one JSON document on success;
//! stderr lines become the diagnostic on a non-zero exit.

#![allow(dead_code)]

use serde_json::Value;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, warn};

use super::Evaluator;
use crate::config::EvaluatorConfig;
use crate::error::EvaluationError;
use crate::models::EvaluationOutcome;

/// Argument token replaced by the expression being evaluated
pub const EXPR_PLACEHOLDER: &str = "{expr}";

/// Evaluator backed by an external command
#[derive(Clone, Debug)]
pub struct ProcessEvaluator {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl ProcessEvaluator {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    pub fn from_config(config: &EvaluatorConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            working_dir: config.working_dir.clone(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Arguments with the placeholder substituted
    fn build_args(&self, expression: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace(EXPR_PLACEHOLDER, expression))
            .collect()
    }

    /// Run the evaluator once and decode its output
    pub async fn run(
        &self,
        expression: &str,
        timeout: Duration,
    ) -> Result<Value, EvaluationError> {
        let mut command = Command::new(&self.program);
        command
            .args(self.build_args(expression))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let child = command.spawn().map_err(EvaluationError::Spawn)?;

        // Dropping the wait future drops the child, which kills it.
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(output) => output.map_err(EvaluationError::Wait)?,
            Err(_) => return Err(EvaluationError::Timeout(timeout)),
        };

        if !output.status.success() {
            return Err(EvaluationError::Crash {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr)
                    .lines()
                    .map(String::from)
                    .collect(),
            });
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

impl Evaluator for ProcessEvaluator {
    async fn evaluate(&self, expression: &str, timeout: Duration) -> EvaluationOutcome {
        let start = Instant::now();
        let result = self.run(expression, timeout).await;
        let elapsed = start.elapsed().as_millis();

        match result {
            Ok(value) => {
                debug!("{} evaluated in {}ms", self.program, elapsed);
                EvaluationOutcome::success(value)
            }
            Err(err) => {
                match &err {
                    EvaluationError::Timeout(_)
                    | EvaluationError::Spawn(_)
                    | EvaluationError::Wait(_) => {
                        warn!("{}: {}", self.program, err)
                    }
                    _ => debug!("{} failed in {}ms: {}", self.program, elapsed, err),
                }
                err.into()
            }
        }
    }
}
