//! Evaluation adapter
//!
//! The evaluator under test is reached only through [`Evaluator`]; the
//! production implementation runs one isolated process per expression.

mod process;
#[cfg(test)]
pub mod stub;

pub use process::ProcessEvaluator;

use std::future::Future;
use std::time::Duration;

use crate::models::EvaluationOutcome;

/// Capability to evaluate one expression strictly into a structured value.
///
/// Every failure mode (timeout, crash, undecodable output) is reported as
/// [`EvaluationOutcome::Failure`]; implementations never return errors.
pub trait Evaluator: Send + Sync + 'static {
    fn evaluate(
        &self,
        expression: &str,
        timeout: Duration,
    ) -> impl Future<Output = EvaluationOutcome> + Send;
}
