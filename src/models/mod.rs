//! Data models for golden testing
//!
//! Fixtures, evaluation outcomes, test results and run summaries.

mod fixture;
mod outcome;
mod test_result;

pub use fixture::{load_all_fixtures, load_fixture, Fixture, TestCase};
pub use outcome::EvaluationOutcome;
pub use test_result::{Drained, Progress, RunSummary, TestResult};
