use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod config;
mod plan;

/// Declarative dashboard checks with JSON reports.
///
/// dashcheck discovers `*.check.toml` plans, runs their assertions against
/// JSON fixtures one test at a time, and writes a JSON report of the results.
///
/// EXAMPLES:
///     dashcheck run                    Run every plan under the checks directory
///     dashcheck run churn --verbose    Run tests whose name or suite contains "churn"
///     dashcheck run --json             Print the report to stdout
///     dashcheck list                   Show suites and tests without running
///
/// ENVIRONMENT VARIABLES:
///     DASHCHECK_JSON         Set to '1' for JSON output by default
///     DASHCHECK_TIMEOUT_MS   Per-test timeout in milliseconds
///     DASHCHECK_REPORT_DIR   Directory the report file is written to
///     NO_COLOR               Set to disable colored output
#[derive(Parser)]
#[command(name = "dashcheck")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Log runner internals to stderr
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run check plans
    ///
    /// Discovers `*.check.toml` files, runs every test sequentially and
    /// writes the report. Exits with 1 if any test fails or a plan cannot
    /// be loaded, 2 on other errors.
    ///
    /// EXAMPLES:
    ///     dashcheck run                       Run all checks
    ///     dashcheck run "Risk table"          Filter by suite or test name
    ///     dashcheck run --timeout-ms 2000     Fail tests running longer than 2s
    ///     dashcheck run --no-report           Skip writing the report file
    #[command(visible_alias = "r")]
    Run {
        /// Filter tests by name or suite
        pattern: Option<String>,
        /// Plan directory (default: `[checks] dir` or the project root)
        #[arg(long, short = 'd')]
        dir: Option<PathBuf>,
        /// Show one line per test
        #[arg(long, short = 'v')]
        verbose: bool,
        /// Disable colored output
        #[arg(long)]
        no_color: bool,
        /// Print the JSON report to stdout
        #[arg(
            long,
            env = "DASHCHECK_JSON",
            value_parser = clap::builder::BoolishValueParser::new()
        )]
        json: bool,
        /// Report file name
        #[arg(long = "report", value_name = "NAME")]
        report_name: Option<String>,
        /// Directory for the report file
        #[arg(long)]
        report_dir: Option<PathBuf>,
        /// Don't write a report file
        #[arg(long)]
        no_report: bool,
        /// Per-test timeout in milliseconds
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        timeout_ms: Option<u64>,
    },

    /// List suites and tests without running them
    ///
    /// EXAMPLES:
    ///     dashcheck list              List everything
    ///     dashcheck list tooltip      Only tests matching "tooltip"
    #[command(visible_alias = "ls")]
    List {
        /// Filter tests by name or suite
        pattern: Option<String>,
        /// Plan directory (default: `[checks] dir` or the project root)
        #[arg(long, short = 'd')]
        dir: Option<PathBuf>,
    },

    /// Generate shell completions
    ///
    /// EXAMPLES:
    ///     dashcheck completions bash > ~/.bash_completions/dashcheck.bash
    ///     dashcheck completions zsh > ~/.zfunc/_dashcheck
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    match dispatch(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Returns whether the command succeeded in the test sense
async fn dispatch(cli: Cli) -> Result<bool> {
    let cli_config = config::Config::from_env();

    match cli.command {
        Commands::Run {
            pattern,
            dir,
            verbose,
            no_color,
            json,
            report_name,
            report_dir,
            no_report,
            timeout_ms,
        } => {
            if no_color || cli_config.no_color {
                colored::control::set_override(false);
            }
            let project = load_project_config()?;
            let args = commands::run::RunArgs {
                pattern,
                dir,
                verbose,
                json,
                report_name,
                report_dir,
                no_report,
                timeout_ms,
            };
            commands::run::run(args, &project).await
        }
        Commands::List { pattern, dir } => {
            if cli_config.no_color {
                colored::control::set_override(false);
            }
            let project = load_project_config()?;
            let dir = dir.unwrap_or_else(|| project.checks_dir());
            commands::list::run(&dir, pattern.as_deref(), &mut io::stdout())?;
            Ok(true)
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
            Ok(true)
        }
    }
}

/// Load `dashcheck.toml` from the working directory or an ancestor
fn load_project_config() -> Result<dashcheck_config::Config> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    dashcheck_config::ConfigLoader::new()
        .load_from_directory(&cwd)
        .context("Failed to load dashcheck.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_flags() {
        let cli = Cli::parse_from([
            "dashcheck",
            "run",
            "churn",
            "--verbose",
            "--report",
            "out.json",
            "--timeout-ms",
            "500",
            "--no-report",
        ]);
        match cli.command {
            Commands::Run {
                pattern,
                verbose,
                report_name,
                timeout_ms,
                no_report,
                ..
            } => {
                assert_eq!(pattern.as_deref(), Some("churn"));
                assert!(verbose);
                assert_eq!(report_name.as_deref(), Some("out.json"));
                assert_eq!(timeout_ms, Some(500));
                assert!(no_report);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(Cli::try_parse_from(["dashcheck", "run", "--timeout-ms", "0"]).is_err());
    }

    #[test]
    fn test_debug_flag_is_global() {
        let cli = Cli::parse_from(["dashcheck", "list", "--debug"]);
        assert!(cli.debug);
        assert!(matches!(cli.command, Commands::List { .. }));
    }

    #[test]
    fn test_alias_r_for_run() {
        let cli = Cli::parse_from(["dashcheck", "r"]);
        assert!(matches!(cli.command, Commands::Run { .. }));
    }

    #[test]
    fn test_alias_ls_for_list() {
        let cli = Cli::parse_from(["dashcheck", "ls", "--dir", "checks"]);
        match cli.command {
            Commands::List { dir, .. } => assert_eq!(dir, Some(PathBuf::from("checks"))),
            _ => panic!("Expected List command"),
        }
    }

    #[test]
    fn test_completions_zsh() {
        let cli = Cli::parse_from(["dashcheck", "completions", "zsh"]);
        match cli.command {
            Commands::Completions { shell } => assert_eq!(shell, Shell::Zsh),
            _ => panic!("Expected Completions command"),
        }
    }
}
