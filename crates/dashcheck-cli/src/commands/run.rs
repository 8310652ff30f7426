//! Run command - discover check plans, execute them and write the report

use crate::plan::PlanSet;
use anyhow::{Context, Result};
use colored::*;
use dashcheck_config::Config;
use dashcheck_core::{ConsoleReporter, FileSink, TestRunner, WriterSink, DEFAULT_REPORT_NAME};
use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Arguments for the run command
#[derive(Debug, Default)]
pub struct RunArgs {
    /// Filter tests by name or suite
    pub pattern: Option<String>,
    /// Plan directory (overrides `[checks] dir`)
    pub dir: Option<PathBuf>,
    /// Verbose output (one line per test)
    pub verbose: bool,
    /// Print the JSON report to stdout instead of progress output
    pub json: bool,
    /// Report file name (overrides `[report] name`)
    pub report_name: Option<String>,
    /// Report directory (overrides `[report] dir`)
    pub report_dir: Option<PathBuf>,
    /// Skip writing the report file
    pub no_report: bool,
    /// Per-test timeout (overrides `[run] timeout_ms`)
    pub timeout_ms: Option<u64>,
}

/// Run the run command
///
/// Returns `Ok(true)` when every test passed and every plan loaded.
pub async fn run(args: RunArgs, config: &Config) -> Result<bool> {
    let dir = args.dir.clone().unwrap_or_else(|| config.checks_dir());
    if !dir.is_dir() {
        anyhow::bail!("Check directory not found: {}", dir.display());
    }

    if !args.json {
        println!("{}", "Discovering check plans...".bold());
    }

    let mut plans = PlanSet::discover(&dir);
    let load_failed = !plans.parse_errors.is_empty();

    if load_failed {
        eprintln!();
        eprintln!("{}", "Errors in check plans:".yellow().bold());
        for (path, error) in &plans.parse_errors {
            eprintln!("  {} {}", "●".yellow(), path.display());
            eprintln!("    {}", error.dimmed());
        }
        eprintln!();
    }

    if let Some(pattern) = &args.pattern {
        plans = plans.filter(pattern);
    }

    if plans.is_empty() && !args.json {
        println!("{}", "No tests found.".yellow());
        return Ok(!load_failed);
    }

    if !args.json {
        println!(
            "Found {} test{} in {} plan{}",
            plans.len().to_string().bold(),
            if plans.len() == 1 { "" } else { "s" },
            plans.plans.len(),
            if plans.plans.len() == 1 { "" } else { "s" }
        );
    }

    let mut runner = TestRunner::new();
    if let Some(timeout) = args.timeout_ms.map(Duration::from_millis).or(config.timeout()) {
        runner = runner.with_timeout(timeout);
    }
    if !args.json {
        runner = runner.with_reporter(ConsoleReporter::new(args.verbose || config.verbose()));
    }
    for plan in &plans.plans {
        plan.register(&mut runner);
    }

    let summary = runner.run_tests().await?;

    if args.json {
        let mut stdout = WriterSink::new(io::stdout());
        runner
            .save_report(&mut stdout, Some("stdout"))
            .context("Failed to write report to stdout")?;
    }

    if !args.no_report && config.report_enabled() {
        let name = args
            .report_name
            .as_deref()
            .or(config.report_name())
            .unwrap_or(DEFAULT_REPORT_NAME);
        let dir = args.report_dir.clone().unwrap_or_else(|| config.report_dir());
        let mut sink = FileSink::new(dir);

        runner
            .save_report(&mut sink, Some(name))
            .with_context(|| format!("Failed to save report {}", sink.path_for(name).display()))?;

        if !args.json {
            println!("Report saved to {}", sink.path_for(name).display());
        }
    }

    Ok(summary.is_success() && !load_failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const PASSING: &str = r#"
[[suite]]
name = "Layout"

[[suite.test]]
name = "three tiers"
assert = "contains"
actual = ["low", "medium", "high"]
expected = "high"
"#;

    const FAILING: &str = r#"
[[suite]]
name = "Scores"

[[suite.test]]
name = "score ceiling"
assert = "less_than"
actual = 120
expected = 100
"#;

    fn args(dir: &std::path::Path) -> RunArgs {
        RunArgs {
            dir: Some(dir.to_path_buf()),
            report_dir: Some(dir.to_path_buf()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_run_no_plans() {
        let dir = tempdir().unwrap();
        let ok = run(args(dir.path()), &Config::default()).await.unwrap();
        assert!(ok);
        assert!(!dir.path().join(DEFAULT_REPORT_NAME).exists());
    }

    #[tokio::test]
    async fn test_run_passing_writes_report() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("layout.check.toml"), PASSING).unwrap();

        let ok = run(args(dir.path()), &Config::default()).await.unwrap();
        assert!(ok);

        let text = fs::read_to_string(dir.path().join(DEFAULT_REPORT_NAME)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["summary"]["total"], 1);
        assert_eq!(json["results"][0]["suite"], "Layout");
    }

    #[tokio::test]
    async fn test_run_failing() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("layout.check.toml"), PASSING).unwrap();
        fs::write(dir.path().join("scores.check.toml"), FAILING).unwrap();

        let run_args = RunArgs {
            no_report: true,
            ..args(dir.path())
        };
        let ok = run(run_args, &Config::default()).await.unwrap();
        assert!(!ok);
        assert!(!dir.path().join(DEFAULT_REPORT_NAME).exists());
    }

    #[tokio::test]
    async fn test_run_filter_excludes_failure() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("layout.check.toml"), PASSING).unwrap();
        fs::write(dir.path().join("scores.check.toml"), FAILING).unwrap();

        let run_args = RunArgs {
            pattern: Some("Layout".to_string()),
            report_name: Some("layout.json".to_string()),
            ..args(dir.path())
        };
        let ok = run(run_args, &Config::default()).await.unwrap();
        assert!(ok);
        assert!(dir.path().join("layout.json").exists());
    }

    #[tokio::test]
    async fn test_run_broken_plan_fails_run() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("layout.check.toml"), PASSING).unwrap();
        fs::write(dir.path().join("broken.check.toml"), "[[suite]]\nname = 3\n").unwrap();

        let ok = run(args(dir.path()), &Config::default()).await.unwrap();
        assert!(!ok);
    }

    #[tokio::test]
    async fn test_run_missing_dir() {
        let dir = tempdir().unwrap();
        let run_args = RunArgs {
            dir: Some(dir.path().join("absent")),
            ..Default::default()
        };
        assert!(run(run_args, &Config::default()).await.is_err());
    }
}
