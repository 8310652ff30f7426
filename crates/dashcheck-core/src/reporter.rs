//! Test reporter - progress output while tests run

use crate::runner::{RunSummary, TestResult};
use colored::*;
use std::io::{self, Write};

/// Receives progress events from a [`TestRunner`](crate::TestRunner)
pub trait Reporter: Send {
    /// A suite was opened with `describe`
    fn suite_declared(&mut self, _suite: &str) {}

    /// A run is starting with `pending` tests
    fn run_started(&mut self, _pending: usize) {}

    /// One test finished
    fn test_finished(&mut self, _result: &TestResult) {}

    /// The run finished
    fn run_finished(&mut self, _summary: &RunSummary) {}
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl Reporter for SilentReporter {}

/// Console reporter with output configuration
///
/// Quiet mode prints one character per test (`.` pass, `F` fail); verbose
/// mode prints a line per test. Both end with a summary and an itemized list
/// of failures showing expected and actual values.
pub struct ConsoleReporter<W: Write + Send = io::Stdout> {
    /// Show detailed output for each test
    verbose: bool,
    out: W,
    /// Dots printed since the last newline
    dots: usize,
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new(false)
    }
}

impl ConsoleReporter {
    /// Create a reporter writing to stdout
    pub fn new(verbose: bool) -> Self {
        Self::with_writer(verbose, io::stdout())
    }
}

impl<W: Write + Send> ConsoleReporter<W> {
    /// Create a reporter writing to `out`
    pub fn with_writer(verbose: bool, out: W) -> Self {
        Self {
            verbose,
            out,
            dots: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn end_dots(&mut self) {
        if self.dots > 0 {
            let _ = writeln!(self.out);
            self.dots = 0;
        }
    }

    /// Print summary statistics
    fn print_summary(&mut self, summary: &RunSummary) {
        let _ = writeln!(self.out);
        let _ = writeln!(self.out, "{}", "─".repeat(50));

        let status = if summary.failed > 0 {
            "FAILED".red().bold()
        } else {
            "PASSED".green().bold()
        };

        let _ = writeln!(
            self.out,
            "Test result: {} | {} total, {} passed, {} failed",
            status,
            summary.total_tests.to_string().bold(),
            summary.passed.to_string().green().bold(),
            if summary.failed > 0 {
                summary.failed.to_string().red().bold()
            } else {
                summary.failed.to_string().normal()
            }
        );
        let _ = writeln!(self.out, "Success rate: {:.1}%", summary.success_rate);
        let _ = writeln!(self.out, "Time: {:.2?}", summary.duration);
    }

    /// Print details of failed tests
    fn print_failures(&mut self, summary: &RunSummary) {
        let failures: Vec<_> = summary.failures().collect();

        if failures.is_empty() {
            return;
        }

        let _ = writeln!(self.out);
        let _ = writeln!(self.out, "{}", "Failures:".red().bold());
        let _ = writeln!(self.out);

        for result in failures {
            let _ = writeln!(
                self.out,
                "  {} {} › {}",
                "●".red(),
                result.suite,
                result.name.bold()
            );
            for line in result.message.lines() {
                let _ = writeln!(self.out, "      {}", line.dimmed());
            }
            if let Some(expected) = &result.expected {
                let _ = writeln!(self.out, "      Expected: {}", expected.to_string().green());
            }
            if let Some(actual) = &result.actual {
                let _ = writeln!(self.out, "      Actual:   {}", actual.to_string().red());
            }
            let _ = writeln!(self.out);
        }
    }
}

impl<W: Write + Send> Reporter for ConsoleReporter<W> {
    fn suite_declared(&mut self, suite: &str) {
        self.end_dots();
        let _ = writeln!(self.out, "\n{} {}", "▸".cyan(), suite.bold());
    }

    fn run_started(&mut self, pending: usize) {
        if self.verbose {
            let _ = writeln!(
                self.out,
                "\nRunning {} test{}",
                pending.to_string().bold(),
                if pending == 1 { "" } else { "s" }
            );
        }
    }

    fn test_finished(&mut self, result: &TestResult) {
        if self.verbose {
            let label = if result.passed {
                "PASS".green().bold()
            } else {
                "FAIL".red().bold()
            };
            let _ = writeln!(
                self.out,
                "{} {} › {} ({:.2?})",
                label, result.suite, result.name, result.duration
            );
        } else {
            let mark = if result.passed {
                ".".green()
            } else {
                "F".red().bold()
            };
            let _ = write!(self.out, "{}", mark);
            let _ = self.out.flush();
            self.dots += 1;
        }
    }

    fn run_finished(&mut self, summary: &RunSummary) {
        self.end_dots();
        self.print_summary(summary);
        self.print_failures(summary);
        let _ = self.out.flush();
    }
}
