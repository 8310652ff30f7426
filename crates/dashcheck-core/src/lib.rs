//! dashcheck core - test registration, assertions and reporting
//!
//! This library provides:
//! - A dynamic [`Value`] model for the things being checked
//! - Assertion helpers returning a [`Verdict`] instead of panicking
//! - A sequential async [`TestRunner`] with `describe`/`it` registration
//! - Console progress output and a JSON [`Report`]
//!
//! # Example
//!
//! ```no_run
//! use dashcheck_core::assert::{assert_contains, assert_equal};
//! use dashcheck_core::{FileSink, TestRunner};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let mut runner = TestRunner::new();
//! runner.describe("Risk table", |s| {
//!     s.it("has three tiers", || {
//!         assert_contains(vec!["low", "medium", "high"], "medium", None)
//!     });
//!     s.it("rounds scores", || assert_equal(0.5_f64.round(), 1, None));
//! });
//!
//! let summary = runner.run_tests().await?;
//! runner.save_report(&mut FileSink::new("reports"), None)?;
//! assert_eq!(summary.passed + summary.failed, summary.total_tests);
//! # Ok(())
//! # }
//! ```

/// dashcheck version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod assert;
pub mod report;
pub mod reporter;
pub mod runner;
pub mod value;
pub mod verdict;

// Re-export commonly used types
pub use report::{
    FileSink, Report, ReportEntry, ReportError, ReportSink, ReportSummary, WriterSink,
    DEFAULT_REPORT_NAME,
};
pub use reporter::{ConsoleReporter, Reporter, SilentReporter};
pub use runner::{
    RunError, RunState, RunSummary, SuiteScope, TestAction, TestCase, TestResult, TestRunner,
    DEFAULT_SUITE, NO_RESULT,
};
pub use value::{ObjectValue, Value};
pub use verdict::{IntoOutcome, Outcome, Verdict};
