//! Project Configuration (dashcheck.toml)
//!
//! Every section and field is optional; unknown fields are rejected.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project configuration from dashcheck.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Runner settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<RunConfig>,

    /// Report output settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportConfig>,

    /// Where check plans are discovered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<ChecksConfig>,
}

/// Runner settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Per-test timeout in milliseconds (default: none)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Print one line per test
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
}

/// Report output settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    /// Report file name (default: "test-report.json")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Output directory, relative to the project root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    /// Write a report file after each run (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// Check plan discovery settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ChecksConfig {
    /// Directory searched for `*.check.toml`, relative to the project root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl ProjectConfig {
    /// Load project configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the project configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(run) = &self.run {
            if run.timeout_ms == Some(0) {
                return Err(ConfigError::InvalidValue {
                    field: "run.timeout_ms".to_string(),
                    reason: "timeout must be greater than zero".to_string(),
                });
            }
        }

        if let Some(name) = self.report.as_ref().and_then(|r| r.name.as_deref()) {
            validate_report_name(name)?;
        }

        Ok(())
    }

    pub fn timeout_ms(&self) -> Option<u64> {
        self.run.as_ref().and_then(|r| r.timeout_ms)
    }

    pub fn verbose(&self) -> Option<bool> {
        self.run.as_ref().and_then(|r| r.verbose)
    }

    pub fn report_name(&self) -> Option<&str> {
        self.report.as_ref().and_then(|r| r.name.as_deref())
    }

    pub fn report_dir(&self) -> Option<&Path> {
        self.report.as_ref().and_then(|r| r.dir.as_deref())
    }

    pub fn report_enabled(&self) -> Option<bool> {
        self.report.as_ref().and_then(|r| r.enabled)
    }

    pub fn checks_dir(&self) -> Option<&Path> {
        self.checks.as_ref().and_then(|c| c.dir.as_deref())
    }
}

/// A report name is a bare file name
pub(crate) fn validate_report_name(name: &str) -> ConfigResult<()> {
    if name.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "report.name".to_string(),
            reason: "name cannot be empty".to_string(),
        });
    }
    if name.contains(['/', '\\']) {
        return Err(ConfigError::InvalidValue {
            field: "report.name".to_string(),
            reason: format!("'{}' must be a file name, not a path (use report.dir)", name),
        });
    }
    Ok(())
}
