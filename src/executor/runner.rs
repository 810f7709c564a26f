//! Single test case execution
//!
//! Evaluates a case's expected and source expressions and pairs the outcomes.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::ExpectedMode;
use crate::evaluator::Evaluator;
use crate::models::{EvaluationOutcome, Fixture, TestCase, TestResult};

/// Runs test cases against an evaluator
pub struct CaseRunner<E> {
    evaluator: Arc<E>,
    timeout: Duration,
    expected_mode: ExpectedMode,
}

impl<E: Evaluator> CaseRunner<E> {
    pub fn new(evaluator: Arc<E>, timeout: Duration) -> Self {
        Self {
            evaluator,
            timeout,
            expected_mode: ExpectedMode::Expression,
        }
    }

    pub fn with_expected_mode(mut self, mode: ExpectedMode) -> Self {
        self.expected_mode = mode;
        self
    }

    /// Run one case. Never fails: every problem ends up in the outcomes.
    pub async fn run_case(&self, case: &TestCase) -> TestResult {
        let start = Instant::now();

        let expected = match self.expected_mode {
            ExpectedMode::Expression => {
                self.evaluator
                    .evaluate(&case.expected_expression, self.timeout)
                    .await
            }
            ExpectedMode::Literal => decode_literal(&case.expected_expression),
        };
        let actual = self
            .evaluator
            .evaluate(&case.source_expression, self.timeout)
            .await;

        let result = TestResult::new(
            case.clone(),
            expected,
            actual,
            start.elapsed().as_millis() as u64,
        );
        debug!("{}", result);
        result
    }

    /// Run a discovered fixture; unparseable fixtures fail without evaluation
    pub async fn run_fixture(&self, fixture: &Fixture) -> TestResult {
        match fixture {
            Ok(case) => self.run_case(case).await,
            Err(err) => TestResult::from_fixture_error(err),
        }
    }
}

fn decode_literal(text: &str) -> EvaluationOutcome {
    match serde_json::from_str(text) {
        Ok(value) => EvaluationOutcome::success(value),
        Err(err) => {
            EvaluationOutcome::failure([format!("Expected value is not valid JSON: {err}")])
        }
    }
}
