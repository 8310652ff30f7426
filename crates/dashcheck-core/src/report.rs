//! Report artifact - structured JSON document of a run, and the sinks it is
//! written to

use crate::runner::TestResult;
use crate::value::Value;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// File name used when the caller does not pick one
pub const DEFAULT_REPORT_NAME: &str = "test-report.json";

/// Report errors
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write report '{name}'")]
    Sink {
        name: String,
        #[source]
        source: io::Error,
    },
}

/// Percentage of passing tests, `0.0` for an empty run
pub fn success_rate(passed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        passed as f64 / total as f64 * 100.0
    }
}

/// The report document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// When the report was generated
    pub timestamp: DateTime<Utc>,
    /// Accumulated run time in milliseconds
    pub duration: u64,
    pub summary: ReportSummary,
    pub results: Vec<ReportEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub success_rate: f64,
}

/// One executed test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    pub name: String,
    pub suite: String,
    pub passed: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
}

impl From<&TestResult> for ReportEntry {
    fn from(result: &TestResult) -> Self {
        Self {
            name: result.name.clone(),
            suite: result.suite.clone(),
            passed: result.passed,
            message: result.message.clone(),
            timestamp: result.timestamp,
            duration_ms: millis(result.duration),
            actual: result.actual.clone(),
            expected: result.expected.clone(),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Report {
    /// Build a report from recorded results
    pub fn from_results(results: &[TestResult], duration: Duration) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.passed).count();

        Self {
            timestamp: Utc::now(),
            duration: millis(duration),
            summary: ReportSummary {
                total,
                passed,
                failed: total - passed,
                success_rate: success_rate(passed, total),
            },
            results: results.iter().map(ReportEntry::from).collect(),
        }
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Serialize and hand the bytes to `sink` under `name`
    pub fn save(&self, sink: &mut dyn ReportSink, name: &str) -> Result<(), ReportError> {
        let json = self.to_json()?;
        sink.write_report(name, json.as_bytes())
            .map_err(|source| ReportError::Sink {
                name: name.to_string(),
                source,
            })
    }

    /// Entries of failing tests
    pub fn failures(&self) -> impl Iterator<Item = &ReportEntry> {
        self.results.iter().filter(|r| !r.passed)
    }
}

// ============================================================================
// Sinks
// ============================================================================

/// Destination for a serialized report
pub trait ReportSink {
    fn write_report(&mut self, name: &str, contents: &[u8]) -> io::Result<()>;
}

/// Writes reports as files under a directory, creating it when missing
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a report named `name` is written to
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

impl ReportSink for FileSink {
    fn write_report(&mut self, name: &str, contents: &[u8]) -> io::Result<()> {
        if !self.dir.as_os_str().is_empty() && !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        fs::write(self.path_for(name), contents)
    }
}

/// Streams reports into any writer (stdout, a buffer)
#[derive(Debug)]
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportSink for WriterSink<W> {
    fn write_report(&mut self, _name: &str, contents: &[u8]) -> io::Result<()> {
        self.writer.write_all(contents)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}
