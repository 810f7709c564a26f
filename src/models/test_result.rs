//! Test results, run progress and run summaries

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{EvaluationOutcome, TestCase};
use crate::compare;
use crate::error::FixtureError;

/// Diagnostic used when a worker disappears without sending its result
pub const WORKER_LOST: &str = "Worker terminated before reporting a result.";

/// Outcome of running one test case
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestResult {
    pub test_case: TestCase,
    pub success: bool,
    pub expected: EvaluationOutcome,
    pub actual: EvaluationOutcome,
    pub duration_ms: u64,
}

impl TestResult {
    /// Pair the two outcomes of a case; success requires both to be canonically equal values
    pub fn new(
        test_case: TestCase,
        expected: EvaluationOutcome,
        actual: EvaluationOutcome,
        duration_ms: u64,
    ) -> Self {
        let success = match (&expected, &actual) {
            (
                EvaluationOutcome::Success { value: expected },
                EvaluationOutcome::Success { value: actual },
            ) => compare::equal(expected, actual),
            _ => false,
        };

        Self {
            test_case,
            success,
            expected,
            actual,
            duration_ms,
        }
    }

    /// Failing result for a fixture that never became a runnable case
    pub fn from_fixture_error(err: &FixtureError) -> Self {
        let diagnostic = EvaluationOutcome::failure([err.to_string()]);
        Self {
            test_case: TestCase::new(err.identity(), "", ""),
            success: false,
            expected: diagnostic.clone(),
            actual: diagnostic,
            duration_ms: 0,
        }
    }

    /// Failing result for a case whose worker vanished
    pub fn worker_lost(test_case: TestCase) -> Self {
        let diagnostic = EvaluationOutcome::failure([WORKER_LOST]);
        Self {
            test_case,
            success: false,
            expected: diagnostic.clone(),
            actual: diagnostic,
            duration_ms: 0,
        }
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.success { "PASS" } else { "FAIL" };
        write!(
            f,
            "{} {} [{}ms]",
            status, self.test_case.identity, self.duration_ms
        )
    }
}

/// How a case still pending at the first failure was resolved
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Drained {
    /// Cancelled before it started
    Cancelled { identity: String },
    /// Already finished when cancellation was requested
    CompletedBeforeCancel { result: TestResult },
    /// Running when cancellation was requested; its result was awaited
    CompletedAfterCancel { result: TestResult },
}

impl Drained {
    pub fn result(&self) -> Option<&TestResult> {
        match self {
            Drained::Cancelled { .. } => None,
            Drained::CompletedBeforeCancel { result } | Drained::CompletedAfterCancel { result } => {
                Some(result)
            }
        }
    }
}

/// One step of an ordered run
#[derive(Clone, Debug)]
pub enum Progress {
    Passed(TestResult),
    /// The first failure in submission order; everything after it is drained
    Failed(TestResult),
    Drained(Drained),
}

/// Counters and the first failure of a finished run
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub cancelled: usize,
    pub drained_passed: usize,
    pub drained_failed: usize,
    pub duration_ms: u64,
    pub first_failure: Option<TestResult>,
}

impl RunSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn record(&mut self, progress: &Progress) {
        match progress {
            Progress::Passed(_) => self.passed += 1,
            Progress::Failed(result) => {
                if self.first_failure.is_none() {
                    self.first_failure = Some(result.clone());
                }
            }
            Progress::Drained(drained) => match drained.result() {
                None => self.cancelled += 1,
                Some(result) if result.success => self.drained_passed += 1,
                Some(_) => self.drained_failed += 1,
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.first_failure.is_none() && self.passed == self.total
    }
}
