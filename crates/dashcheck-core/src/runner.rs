//! Test runner - register test cases by suite and execute them in order

use crate::report::{self, Report, ReportError, ReportSink, DEFAULT_REPORT_NAME};
use crate::reporter::{Reporter, SilentReporter};
use crate::value::Value;
use crate::verdict::{IntoOutcome, Outcome};
use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Suite assigned to tests registered outside any `describe`
pub const DEFAULT_SUITE: &str = "Default";

/// Message recorded when an action completes without a verdict
pub const NO_RESULT: &str = "No result";

/// A deferred test body
pub type TestAction = Box<dyn FnOnce() -> BoxFuture<'static, Outcome> + Send>;

/// Runner misuse errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    #[error("a test run is already in progress")]
    AlreadyRunning,
}

/// Lifecycle of a runner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Tests registered, not yet run
    Idle,
    /// Iterating test cases
    Running,
    /// Summary available
    Completed,
}

/// A registered test
pub struct TestCase {
    name: String,
    suite: String,
    action: TestAction,
}

impl TestCase {
    pub fn new(suite: impl Into<String>, name: impl Into<String>, action: TestAction) -> Self {
        Self {
            name: name.into(),
            suite: suite.into(),
            action,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn suite(&self) -> &str {
        &self.suite
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("suite", &self.suite)
            .finish_non_exhaustive()
    }
}

/// Recorded outcome of one executed test
#[derive(Debug, Clone, PartialEq)]
pub struct TestResult {
    pub name: String,
    pub suite: String,
    pub passed: bool,
    pub message: String,
    /// When the test finished
    pub timestamp: DateTime<Utc>,
    pub duration: Duration,
    pub actual: Option<Value>,
    pub expected: Option<Value>,
}

impl TestResult {
    fn from_outcome(name: String, suite: String, outcome: Outcome, duration: Duration) -> Self {
        let (passed, message, actual, expected) = match outcome {
            Outcome::Verdict(v) => (v.passed, v.message, v.actual, v.expected),
            Outcome::NoVerdict => (false, NO_RESULT.to_string(), None, None),
            Outcome::Raised(error) => (false, error, None, None),
        };
        Self {
            name,
            suite,
            passed,
            message,
            timestamp: Utc::now(),
            duration,
            actual,
            expected,
        }
    }

    pub fn is_pass(&self) -> bool {
        self.passed
    }

    pub fn is_fail(&self) -> bool {
        !self.passed
    }
}

/// Aggregate statistics of the results recorded so far
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub total_tests: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration: Duration,
    /// Percentage of passing tests, `0.0` when nothing ran
    pub success_rate: f64,
    pub results: Vec<TestResult>,
}

impl RunSummary {
    fn from_results(results: &[TestResult], duration: Duration) -> Self {
        let total_tests = results.len();
        let passed = results.iter().filter(|r| r.passed).count();
        Self {
            total_tests,
            passed,
            failed: total_tests - passed,
            duration,
            success_rate: report::success_rate(passed, total_tests),
            results: results.to_vec(),
        }
    }

    /// True when no recorded test failed
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &TestResult> {
        self.results.iter().filter(|r| r.is_fail())
    }
}

/// Test runner with configuration
///
/// Tests run strictly one after another in registration order. A panicking
/// or erroring action becomes a failing result and the run continues.
pub struct TestRunner {
    pending: Vec<TestCase>,
    results: Vec<TestResult>,
    state: RunState,
    /// Upper bound for a single action; `None` waits indefinitely
    timeout: Option<Duration>,
    elapsed: Duration,
    reporter: Box<dyn Reporter>,
}

impl Default for TestRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TestRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestRunner")
            .field("pending", &self.pending)
            .field("results", &self.results.len())
            .field("state", &self.state)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl TestRunner {
    /// Create a runner with no timeout and no progress output
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            results: Vec::new(),
            state: RunState::Idle,
            timeout: None,
            elapsed: Duration::ZERO,
            reporter: Box::new(SilentReporter),
        }
    }

    /// Bound each action; an expired action is recorded as a failure
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Send progress events to `reporter`
    pub fn with_reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Tests registered and not yet run
    pub fn pending(&self) -> &[TestCase] {
        &self.pending
    }

    /// Results recorded so far, in execution order
    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    // ------------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------------

    /// Run `body` now with a registrar scoped to `suite`.
    pub fn describe<F>(&mut self, suite: impl Into<String>, body: F) -> &mut Self
    where
        F: FnOnce(&mut SuiteScope<'_>),
    {
        let mut scope = self.suite(suite);
        body(&mut scope);
        self
    }

    /// Registrar for `suite`, announced to the reporter.
    pub fn suite(&mut self, suite: impl Into<String>) -> SuiteScope<'_> {
        let suite = suite.into();
        self.reporter.suite_declared(&suite);
        SuiteScope {
            runner: self,
            suite,
        }
    }

    /// Register a synchronous test in the default suite
    pub fn it<F, R>(&mut self, name: impl Into<String>, action: F) -> &mut Self
    where
        F: FnOnce() -> R + Send + 'static,
        R: IntoOutcome + 'static,
    {
        self.register(TestCase::new(DEFAULT_SUITE, name, sync_action(action)))
    }

    /// Register an asynchronous test in the default suite
    pub fn it_async<F, Fut>(&mut self, name: impl Into<String>, action: F) -> &mut Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: IntoOutcome,
    {
        self.register(TestCase::new(DEFAULT_SUITE, name, async_action(action)))
    }

    /// Register a prepared test case
    pub fn register(&mut self, case: TestCase) -> &mut Self {
        debug!(suite = %case.suite, test = %case.name, "registered test");
        self.pending.push(case);
        self
    }

    // ------------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------------

    /// Execute every pending test in registration order.
    ///
    /// Results are appended to those of earlier runs and the returned summary
    /// covers all of them. Fails fast when a run is already in progress,
    /// which happens when an earlier run future was dropped before finishing.
    pub async fn run_tests(&mut self) -> Result<RunSummary, RunError> {
        if self.state == RunState::Running {
            return Err(RunError::AlreadyRunning);
        }
        self.state = RunState::Running;

        let cases = std::mem::take(&mut self.pending);
        self.reporter.run_started(cases.len());
        let started = Instant::now();

        for case in cases {
            let result = self.execute(case).await;
            self.reporter.test_finished(&result);
            self.results.push(result);
        }

        self.elapsed += started.elapsed();
        self.state = RunState::Completed;

        let summary = self.summary();
        info!(
            total = summary.total_tests,
            passed = summary.passed,
            failed = summary.failed,
            "test run completed"
        );
        self.reporter.run_finished(&summary);
        Ok(summary)
    }

    /// Run a single test, turning errors, panics and timeouts into failures
    async fn execute(&self, case: TestCase) -> TestResult {
        let TestCase {
            name,
            suite,
            action,
        } = case;
        debug!(suite = %suite, test = %name, "running test");

        let start = Instant::now();
        let guarded = AssertUnwindSafe(async move { action().await }).catch_unwind();

        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, guarded).await {
                Ok(caught) => caught.unwrap_or_else(panic_outcome),
                Err(_) => {
                    warn!(suite = %suite, test = %name, ?limit, "test timed out");
                    Outcome::Raised(format!("Timed out after {:.2?}", limit))
                }
            },
            None => guarded.await.unwrap_or_else(panic_outcome),
        };

        if let Outcome::Raised(error) = &outcome {
            warn!(suite = %suite, test = %name, %error, "test raised an error");
        }

        TestResult::from_outcome(name, suite, outcome, start.elapsed())
    }

    /// Summary over every result recorded so far
    pub fn summary(&self) -> RunSummary {
        RunSummary::from_results(&self.results, self.elapsed)
    }

    // ------------------------------------------------------------------------
    // Reporting
    // ------------------------------------------------------------------------

    /// Build the report document from the recorded results
    pub fn generate_report(&self) -> Report {
        Report::from_results(&self.results, self.elapsed)
    }

    /// Serialize the report and hand it to `sink`.
    ///
    /// Returns the name the report was written under.
    pub fn save_report(
        &self,
        sink: &mut dyn ReportSink,
        name: Option<&str>,
    ) -> Result<String, ReportError> {
        let name = name.unwrap_or(DEFAULT_REPORT_NAME);
        self.generate_report().save(sink, name)?;
        Ok(name.to_string())
    }
}

/// Registrar that puts every test into one suite
pub struct SuiteScope<'a> {
    runner: &'a mut TestRunner,
    suite: String,
}

impl SuiteScope<'_> {
    pub fn name(&self) -> &str {
        &self.suite
    }

    /// Register a synchronous test in this suite
    pub fn it<F, R>(&mut self, name: impl Into<String>, action: F) -> &mut Self
    where
        F: FnOnce() -> R + Send + 'static,
        R: IntoOutcome + 'static,
    {
        let case = TestCase::new(self.suite.clone(), name, sync_action(action));
        self.runner.register(case);
        self
    }

    /// Register an asynchronous test in this suite
    pub fn it_async<F, Fut>(&mut self, name: impl Into<String>, action: F) -> &mut Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: IntoOutcome,
    {
        let case = TestCase::new(self.suite.clone(), name, async_action(action));
        self.runner.register(case);
        self
    }

    /// Nested suite; tests registered in `body` belong to `suite`
    pub fn describe<F>(&mut self, suite: impl Into<String>, body: F) -> &mut Self
    where
        F: FnOnce(&mut SuiteScope<'_>),
    {
        let mut inner = self.runner.suite(suite);
        body(&mut inner);
        self
    }
}

fn sync_action<F, R>(action: F) -> TestAction
where
    F: FnOnce() -> R + Send + 'static,
    R: IntoOutcome + 'static,
{
    // The call happens on first poll, inside the runner's panic guard
    Box::new(move || async move { action().into_outcome() }.boxed())
}

fn async_action<F, Fut>(action: F) -> TestAction
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoOutcome,
{
    Box::new(move || async move { action().await.into_outcome() }.boxed())
}

fn panic_outcome(payload: Box<dyn Any + Send>) -> Outcome {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "test panicked".to_string()
    };
    Outcome::Raised(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert::{assert_equal, assert_true};
    use crate::report::WriterSink;
    use crate::reporter::ConsoleReporter;
    use crate::verdict::Verdict;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_runner_pass() {
        let mut runner = TestRunner::new();
        runner.it("simple", || assert_true(true, None));

        let summary = runner.run_tests().await.unwrap();
        assert_eq!(summary.total_tests, 1);
        assert!(summary.is_success());
        assert_eq!(summary.results[0].suite, DEFAULT_SUITE);
    }

    #[tokio::test]
    async fn test_runner_fail_keeps_values() {
        let mut runner = TestRunner::new();
        runner.it("mismatch", || assert_equal(1, 2, None));

        let summary = runner.run_tests().await.unwrap();
        let result = &summary.results[0];
        assert!(result.is_fail());
        assert_eq!(result.actual, Some(Value::from(1)));
        assert_eq!(result.expected, Some(Value::from(2)));
    }

    #[tokio::test]
    async fn test_runner_no_verdict() {
        let mut runner = TestRunner::new();
        runner.it("empty body", || {});

        let summary = runner.run_tests().await.unwrap();
        assert!(summary.results[0].is_fail());
        assert_eq!(summary.results[0].message, NO_RESULT);
    }

    #[tokio::test]
    async fn test_runner_error_is_captured() {
        let mut runner = TestRunner::new();
        runner.it("errors", || -> Result<Verdict, String> {
            Err("element #riskChart missing".to_string())
        });
        runner.it("after", || assert_true(true, None));

        let summary = runner.run_tests().await.unwrap();
        assert_eq!(summary.total_tests, 2);
        assert_eq!(summary.results[0].message, "element #riskChart missing");
        assert!(summary.results[1].is_pass());
    }

    #[tokio::test]
    async fn test_runner_panic_is_captured() {
        let mut runner = TestRunner::new();
        runner.it("panics", || -> Verdict { panic!("boom") });
        runner.it("after", || assert_true(true, None));

        let summary = runner.run_tests().await.unwrap();
        assert_eq!(summary.results[0].message, "boom");
        assert!(summary.results[0].is_fail());
        assert!(summary.results[1].is_pass());
    }

    #[tokio::test]
    async fn test_runner_async_action() {
        let mut runner = TestRunner::new();
        runner.it_async("suspends", || async {
            tokio::task::yield_now().await;
            assert_equal(2 + 2, 4, None)
        });

        let summary = runner.run_tests().await.unwrap();
        assert!(summary.is_success());
    }

    #[tokio::test]
    async fn test_describe_assigns_suite() {
        let mut runner = TestRunner::new();
        runner.describe("Elements", |s| {
            s.it("one", || assert_true(true, None));
            s.describe("Charts", |inner| {
                inner.it("two", || assert_true(true, None));
            });
            s.it("three", || assert_true(true, None));
        });
        runner.it("four", || assert_true(true, None));

        let suites: Vec<&str> = runner.pending().iter().map(|c| c.suite()).collect();
        assert_eq!(suites, vec!["Elements", "Charts", "Elements", DEFAULT_SUITE]);
    }

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_attached_reporter_prints_suite_banners() {
        colored::control::set_override(false);
        let buf = SharedBuf::default();
        let mut runner =
            TestRunner::new().with_reporter(ConsoleReporter::with_writer(false, buf.clone()));
        runner.describe("Charts", |s| {
            s.it("legend", || assert_true(true, None));
        });
        runner.run_tests().await.unwrap();

        let out = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(out.contains("▸ Charts"), "{}", out);
        assert!(out.contains("1 total, 1 passed"), "{}", out);
    }

    #[tokio::test]
    async fn test_registration_does_not_execute() {
        let mut runner = TestRunner::new();
        runner.it("never run", || -> Verdict { panic!("executed during registration") });
        assert_eq!(runner.pending().len(), 1);
        assert_eq!(runner.state(), RunState::Idle);
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let mut runner = TestRunner::new();
        runner.it("a", || assert_true(true, None));
        assert_eq!(runner.state(), RunState::Idle);
        runner.run_tests().await.unwrap();
        assert_eq!(runner.state(), RunState::Completed);
    }

    #[tokio::test]
    async fn test_second_run_appends_new_cases() {
        let mut runner = TestRunner::new();
        runner.it("a", || assert_true(true, None));
        runner.run_tests().await.unwrap();

        runner.it("b", || assert_true(false, None));
        let summary = runner.run_tests().await.unwrap();
        assert_eq!(summary.total_tests, 2);
        assert_eq!(summary.failed, 1);
        assert!(runner.pending().is_empty());
    }

    #[tokio::test]
    async fn test_dropped_run_rejects_next_run() {
        let mut runner = TestRunner::new();
        runner.it_async("hangs", || std::future::pending::<Verdict>());

        {
            let mut run = std::pin::pin!(runner.run_tests());
            // Poll once so the run starts, then drop it mid-flight
            assert!(futures_util::poll!(run.as_mut()).is_pending());
        }

        assert_eq!(runner.state(), RunState::Running);
        assert_eq!(runner.run_tests().await, Err(RunError::AlreadyRunning));
    }

    #[tokio::test]
    async fn test_timeout_records_failure() {
        let mut runner = TestRunner::new().with_timeout(Duration::from_millis(20));
        runner.it_async("hangs", || std::future::pending::<Verdict>());
        runner.it("after", || assert_true(true, None));

        let summary = runner.run_tests().await.unwrap();
        assert!(summary.results[0].message.starts_with("Timed out after"));
        assert!(summary.results[1].is_pass());
    }

    #[tokio::test]
    async fn test_save_report_default_name() {
        let mut runner = TestRunner::new();
        runner.it("a", || assert_true(true, None));
        runner.run_tests().await.unwrap();

        let mut sink = WriterSink::new(Vec::new());
        let name = runner.save_report(&mut sink, None).unwrap();
        assert_eq!(name, DEFAULT_REPORT_NAME);
        assert!(!sink.into_inner().is_empty());
    }

    #[test]
    fn test_summary_without_run() {
        let runner = TestRunner::new();
        let summary = runner.summary();
        assert_eq!(summary.total_tests, 0);
        assert_eq!(summary.success_rate, 0.0);
    }
}
