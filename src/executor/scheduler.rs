//! Concurrent test scheduling
//!
//! Cases run on a bounded pool of tokio tasks, cheapest first. Results are
//! consumed strictly in submission order however the workers finish, and the
//! first failure in that order cancels every task that has not started yet.

#![allow(dead_code)]

use futures::stream::{self, Stream, StreamExt};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{oneshot, Semaphore};
use tracing::{debug, info};

use super::CaseRunner;
use crate::evaluator::Evaluator;
use crate::models::{Drained, Fixture, Progress, RunSummary, TestCase, TestResult};

const QUEUED: u8 = 0;
const RUNNING: u8 = 1;
const DONE: u8 = 2;
const CANCELLED: u8 = 3;

/// Lifecycle of one dispatched task, shared by the coordinator and its worker
#[derive(Debug, Default)]
struct TaskState(AtomicU8);

/// What a cancellation request found
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CancelOutcome {
    Cancelled,
    AlreadyDone,
    StillRunning,
}

impl TaskState {
    /// Claim the task for execution; false if it was cancelled first
    fn start(&self) -> bool {
        self.0
            .compare_exchange(QUEUED, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn finish(&self) {
        self.0.store(DONE, Ordering::Release);
    }

    /// Cancel if not yet started
    fn cancel(&self) -> CancelOutcome {
        match self
            .0
            .compare_exchange(QUEUED, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) | Err(CANCELLED) => CancelOutcome::Cancelled,
            Err(DONE) => CancelOutcome::AlreadyDone,
            Err(_) => CancelOutcome::StillRunning,
        }
    }
}

/// A submitted case: its cancellation handle and the channel its result arrives on
struct Dispatched {
    case: TestCase,
    state: Arc<TaskState>,
    result: oneshot::Receiver<TestResult>,
}

impl Dispatched {
    async fn resolve(self) -> TestResult {
        let Dispatched { case, result, .. } = self;
        match result.await {
            Ok(result) => result,
            Err(_) => TestResult::worker_lost(case),
        }
    }
}

/// Runs fixtures on a fixed-size worker pool
pub struct Scheduler<E> {
    runner: Arc<CaseRunner<E>>,
    workers: usize,
}

impl<E: Evaluator> Scheduler<E> {
    pub fn new(runner: CaseRunner<E>, workers: usize) -> Self {
        Self {
            runner: Arc::new(runner),
            workers: workers.max(1),
        }
    }

    /// Sort fixtures by cost and submit them all to the pool.
    ///
    /// Must be called from within a tokio runtime. Work starts immediately;
    /// the returned cursor yields results in sorted order.
    pub fn dispatch(&self, mut fixtures: Vec<Fixture>) -> OrderedResults {
        fixtures.sort_by_key(fixture_cost);

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut pending = VecDeque::with_capacity(fixtures.len());

        for fixture in fixtures {
            let case = match &fixture {
                Ok(case) => case.clone(),
                Err(err) => TestCase::new(err.identity(), "", ""),
            };
            let state = Arc::new(TaskState::default());
            let (tx, rx) = oneshot::channel();

            let runner = Arc::clone(&self.runner);
            let semaphore = Arc::clone(&semaphore);
            let task_state = Arc::clone(&state);

            tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                if !task_state.start() {
                    return;
                }

                let result = runner.run_fixture(&fixture).await;
                task_state.finish();
                let _ = tx.send(result);
            });

            pending.push_back(Dispatched {
                case,
                state,
                result: rx,
            });
        }

        OrderedResults {
            pending,
            draining: VecDeque::new(),
            failed: false,
        }
    }

    /// Run every fixture, reporting each step to `on_progress` in order
    pub async fn run_all<F>(&self, fixtures: Vec<Fixture>, mut on_progress: F) -> RunSummary
    where
        F: FnMut(&Progress),
    {
        let start = Instant::now();
        let mut summary = RunSummary::new(fixtures.len());

        info!(
            "Running {} fixtures on {} workers",
            fixtures.len(),
            self.workers
        );

        let mut results = std::pin::pin!(self.dispatch(fixtures).into_stream());
        while let Some(progress) = results.next().await {
            summary.record(&progress);
            on_progress(&progress);
        }

        summary.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Run finished in {}ms - Pass: {}/{}, cancelled: {}",
            summary.duration_ms, summary.passed, summary.total, summary.cancelled
        );

        summary
    }
}

fn fixture_cost(fixture: &Fixture) -> usize {
    match fixture {
        Ok(case) => case.cost(),
        Err(_) => 0,
    }
}

/// Results of a dispatched run, in submission order.
///
/// Dropping this before it is exhausted cancels all work not yet started.
pub struct OrderedResults {
    pending: VecDeque<Dispatched>,
    draining: VecDeque<(Dispatched, CancelOutcome)>,
    failed: bool,
}

impl OrderedResults {
    /// Next step of the run, or `None` once every case has been accounted for
    pub async fn next(&mut self) -> Option<Progress> {
        if self.failed {
            let (task, cancel) = self.draining.pop_front()?;
            let drained = match cancel {
                CancelOutcome::Cancelled => Drained::Cancelled {
                    identity: task.case.identity,
                },
                CancelOutcome::AlreadyDone => Drained::CompletedBeforeCancel {
                    result: task.resolve().await,
                },
                CancelOutcome::StillRunning => Drained::CompletedAfterCancel {
                    result: task.resolve().await,
                },
            };
            return Some(Progress::Drained(drained));
        }

        let task = self.pending.pop_front()?;
        let result = task.resolve().await;
        if result.success {
            return Some(Progress::Passed(result));
        }

        self.failed = true;
        self.cancel_pending();
        Some(Progress::Failed(result))
    }

    pub fn into_stream(self) -> impl Stream<Item = Progress> {
        stream::unfold(self, |mut results| async move {
            let progress = results.next().await?;
            Some((progress, results))
        })
    }

    /// Withdraw everything after the first failure, newest first
    fn cancel_pending(&mut self) {
        let mut outcomes: Vec<CancelOutcome> =
            self.pending.iter().rev().map(|task| task.state.cancel()).collect();
        outcomes.reverse();

        let cancelled = outcomes
            .iter()
            .filter(|o| **o == CancelOutcome::Cancelled)
            .count();
        debug!(
            "Cancelled {} of {} remaining cases",
            cancelled,
            outcomes.len()
        );

        self.draining = self.pending.drain(..).zip(outcomes).collect();
    }
}

impl Drop for OrderedResults {
    fn drop(&mut self) {
        for task in &self.pending {
            task.state.cancel();
        }
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use crate::error::FixtureError;
    use crate::evaluator::stub::StubEvaluator;
    use crate::models::EvaluationOutcome;
    use serde_json::json;
    use std::time::Duration;

    fn passing(identity: &str, expr: &str) -> Fixture {
        Ok(TestCase::new(identity, expr, expr))
    }

    fn scheduler(stub: StubEvaluator, workers: usize) -> Scheduler<StubEvaluator> {
        let runner = CaseRunner::new(Arc::new(stub), Duration::from_secs(2));
        Scheduler::new(runner, workers)
    }

    fn identity(progress: &Progress) -> String {
        match progress {
            Progress::Passed(r) | Progress::Failed(r) => r.test_case.identity.clone(),
            Progress::Drained(Drained::Cancelled { identity }) => identity.clone(),
            Progress::Drained(d) => d
                .result()
                .map(|r| r.test_case.identity.clone())
                .unwrap_or_default(),
        }
    }

    #[test]
    fn test_task_state_cancel_before_start() {
        let state = TaskState::default();
        assert_eq!(state.cancel(), CancelOutcome::Cancelled);
        assert!(!state.start());
        assert_eq!(state.cancel(), CancelOutcome::Cancelled);
    }

    #[test]
    fn test_task_state_cannot_cancel_running_or_done() {
        let state = TaskState::default();
        assert!(state.start());
        assert_eq!(state.cancel(), CancelOutcome::StillRunning);
        state.finish();
        assert_eq!(state.cancel(), CancelOutcome::AlreadyDone);
    }

    #[tokio::test]
    async fn test_all_pass_counts_every_case() {
        let stub = StubEvaluator::new()
            .value("1", json!(1))
            .value("22", json!(22))
            .value("333", json!(333));
        let fixtures = vec![
            passing("c", "333"),
            passing("a", "1"),
            passing("b", "22"),
        ];

        let summary = scheduler(stub, 4).run_all(fixtures, |_| {}).await;
        assert!(summary.is_success());
        assert_eq!(summary.passed, 3);
        assert_eq!(summary.total, 3);
        assert!(summary.first_failure.is_none());
    }

    #[tokio::test]
    async fn test_results_follow_sorted_order_not_completion_order() {
        let stub = StubEvaluator::new()
            .value("1", json!(1))
            .delay("1", Duration::from_millis(120))
            .value("22", json!(22))
            .delay("22", Duration::from_millis(60))
            .value("333", json!(333));
        let fixtures = vec![
            passing("long", "333"),
            passing("medium", "22"),
            passing("short", "1"),
        ];

        let mut order = Vec::new();
        scheduler(stub, 4)
            .run_all(fixtures, |p| order.push(identity(p)))
            .await;
        assert_eq!(order, vec!["short", "medium", "long"]);
    }

    #[tokio::test]
    async fn test_cost_counts_characters_not_bytes() {
        let stub = StubEvaluator::new()
            .value("abcd", json!(4))
            .value("ééé", json!(3));
        let fixtures = vec![passing("ascii", "abcd"), passing("accented", "ééé")];

        let mut order = Vec::new();
        scheduler(stub, 2)
            .run_all(fixtures, |p| order.push(identity(p)))
            .await;
        assert_eq!(order, vec!["accented", "ascii"]);
    }

    /// Evaluator whose worker dies on one expression
    struct PanickingEvaluator;

    impl Evaluator for PanickingEvaluator {
        async fn evaluate(&self, expression: &str, _timeout: Duration) -> EvaluationOutcome {
            if expression == "boom" {
                panic!("evaluator crashed on {expression}");
            }
            EvaluationOutcome::success(json!(expression))
        }
    }

    #[tokio::test]
    async fn test_dead_worker_becomes_failure() {
        let runner = CaseRunner::new(Arc::new(PanickingEvaluator), Duration::from_secs(1));
        let fixtures = vec![passing("fine", "ok"), passing("dies", "boom")];

        let summary = Scheduler::new(runner, 2).run_all(fixtures, |_| {}).await;
        let failure = summary.first_failure.expect("run should fail");
        assert_eq!(failure.test_case.identity, "dies");
        assert_eq!(
            failure.actual,
            EvaluationOutcome::failure(["Worker terminated before reporting a result."])
        );
        assert_eq!(summary.passed, 1);
    }

    #[tokio::test]
    async fn test_equal_lengths_keep_input_order() {
        let stub = StubEvaluator::new()
            .value("x", json!(1))
            .value("y", json!(2))
            .value("z", json!(3));

        let sched = scheduler(stub, 2);
        let fixtures = || vec![passing("3", "z"), passing("1", "x"), passing("2", "y")];

        let mut first = Vec::new();
        sched.run_all(fixtures(), |p| first.push(identity(p))).await;
        let mut second = Vec::new();
        sched.run_all(fixtures(), |p| second.push(identity(p))).await;

        assert_eq!(first, vec!["3", "1", "2"]);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_first_failure_in_order_wins_over_faster_failure() {
        let stub = StubEvaluator::new()
            .value("a", json!(1))
            .delay("a", Duration::from_millis(100))
            .value("b", json!(2))
            .value("cc", json!(1))
            .value("dd", json!(2));
        let fixtures = vec![
            Ok(TestCase::new("later", "cc", "dd")),
            Ok(TestCase::new("earlier", "a", "b")),
        ];

        let summary = scheduler(stub, 4).run_all(fixtures, |_| {}).await;
        let failure = summary.first_failure.expect("run should fail");
        assert_eq!(failure.test_case.identity, "earlier");
        assert_eq!(summary.drained_failed + summary.cancelled, 1);
    }

    #[tokio::test]
    async fn test_failure_cancels_queued_work() {
        let mut stub = StubEvaluator::new().value("f", json!(1)).value("g", json!(2));
        let mut fixtures = vec![Ok(TestCase::new("fail", "f", "g"))];
        for i in 0..20 {
            let expr = format!("{i:02}");
            stub = stub
                .value(&expr, json!(i))
                .delay(&expr, Duration::from_millis(20));
            fixtures.push(passing(&format!("case-{i:02}"), &expr));
        }

        let mut markers = Vec::new();
        let summary = scheduler(stub, 1)
            .run_all(fixtures, |p| markers.push(p.clone()))
            .await;

        assert!(matches!(markers[0], Progress::Failed(_)));
        assert_eq!(markers.len(), 21);
        assert!(summary.cancelled >= 19, "cancelled {}", summary.cancelled);
        assert_eq!(
            summary.cancelled + summary.drained_passed + summary.drained_failed,
            20
        );
        assert_eq!(summary.passed, 0);
    }

    #[tokio::test]
    async fn test_malformed_fixture_fails_first() {
        let stub = StubEvaluator::new().value("1 + 1", json!(2));
        let fixtures = vec![
            passing("ok.golden", "1 + 1"),
            Err(FixtureError::Malformed {
                identity: "bad.golden".into(),
                reason: "no separator line".into(),
            }),
        ];

        let summary = scheduler(stub, 2).run_all(fixtures, |_| {}).await;
        let failure = summary.first_failure.expect("run should fail");
        assert_eq!(failure.test_case.identity, "bad.golden");
        assert_eq!(summary.total, 2);
    }

    #[tokio::test]
    async fn test_cursor_ends_after_every_case() {
        let stub = StubEvaluator::new().value("1", json!(1)).value("22", json!(2));
        let sched = scheduler(stub, 2);

        let mut results = sched.dispatch(vec![passing("b", "22"), passing("a", "1")]);
        assert!(matches!(results.next().await, Some(Progress::Passed(_))));
        assert!(results.next().await.is_some());
        assert!(results.next().await.is_none());
    }

    #[tokio::test]
    async fn test_dropping_results_cancels_queued_work() {
        let stub = Arc::new(
            StubEvaluator::new()
                .value("1", json!(1))
                .delay("1", Duration::from_millis(30))
                .value("22", json!(2))
                .value("333", json!(3)),
        );
        let runner = CaseRunner::new(Arc::clone(&stub), Duration::from_secs(1));
        let sched = Scheduler::new(runner, 1);

        let results = sched.dispatch(vec![
            passing("a", "1"),
            passing("b", "22"),
            passing("c", "333"),
        ]);
        drop(results);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(stub.calls() <= 2, "calls {}", stub.calls());
    }
}
