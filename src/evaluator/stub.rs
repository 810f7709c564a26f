//! In-process evaluator for exercising the harness without external processes

use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::Evaluator;
use crate::models::EvaluationOutcome;

#[derive(Clone, Debug)]
struct Response {
    delay: Duration,
    outcome: EvaluationOutcome,
}

/// Evaluator answering from a fixed table of expressions
#[derive(Debug, Default)]
pub struct StubEvaluator {
    responses: HashMap<String, Response>,
    calls: AtomicUsize,
}

impl StubEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(mut self, expression: &str, value: Value) -> Self {
        self.insert(expression, EvaluationOutcome::success(value));
        self
    }

    pub fn failure(mut self, expression: &str, lines: &[&str]) -> Self {
        self.insert(expression, EvaluationOutcome::failure(lines.iter().copied()));
        self
    }

    /// Delay the answer for an expression already in the table
    pub fn delay(mut self, expression: &str, delay: Duration) -> Self {
        if let Some(response) = self.responses.get_mut(expression) {
            response.delay = delay;
        }
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn insert(&mut self, expression: &str, outcome: EvaluationOutcome) {
        self.responses.insert(
            expression.to_string(),
            Response {
                delay: Duration::ZERO,
                outcome,
            },
        );
    }
}

impl Evaluator for StubEvaluator {
    async fn evaluate(&self, expression: &str, timeout: Duration) -> EvaluationOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let Some(response) = self.responses.get(expression).cloned() else {
            return EvaluationOutcome::failure([format!("unknown expression: {expression}")]);
        };

        if response.delay > timeout {
            tokio::time::sleep(timeout).await;
            return EvaluationOutcome::failure(["Timed out."]);
        }
        if !response.delay.is_zero() {
            tokio::time::sleep(response.delay).await;
        }
        response.outcome
    }
}
