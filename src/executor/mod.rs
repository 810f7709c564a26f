//! Test execution engine
//!
//! Single-case execution and the concurrent, fail-fast scheduler.

mod runner;
mod scheduler;

pub use runner::CaseRunner;
pub use scheduler::Scheduler;
