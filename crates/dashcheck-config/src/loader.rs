//! Configuration Loader
//!
//! Finds `dashcheck.toml` and applies environment overrides:
//! - `DASHCHECK_TIMEOUT_MS` - per-test timeout in milliseconds
//! - `DASHCHECK_REPORT_DIR` - report output directory

use crate::project::{ProjectConfig, ReportConfig, RunConfig};
use crate::{ConfigError, ConfigResult, CONFIG_FILE_NAME};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loader
pub struct ConfigLoader {
    /// File searched for while walking up the directory tree
    file_name: String,
}

/// Merged configuration result
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Project configuration (with environment overrides applied)
    pub project: ProjectConfig,

    /// Project root directory (where dashcheck.toml was found)
    pub project_root: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            file_name: CONFIG_FILE_NAME.to_string(),
        }
    }

    /// Search for a differently named file
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find the config file. A missing file is
    /// not an error: defaults apply and `project_root` is `None`.
    pub fn load_from_directory(&self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project_config) = self.find_project_config(start_dir)?;
        let project_config = self.apply_env_overrides(project_config)?;

        Ok(Config {
            project: project_config,
            project_root,
        })
    }

    /// Load configuration from a specific config file
    pub fn load_from_file(&self, config_path: &Path) -> ConfigResult<Config> {
        let project_config = ProjectConfig::load_from_file(config_path)?;
        let project_config = self.apply_env_overrides(project_config)?;
        let project_root = config_path.parent().map(|p| p.to_path_buf());

        Ok(Config {
            project: project_config,
            project_root,
        })
    }

    /// Find project configuration by walking up directory tree
    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, ProjectConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(&self.file_name);

            if config_path.exists() {
                let project_config = ProjectConfig::load_from_file(&config_path)?;
                return Ok((Some(current), project_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, ProjectConfig::default())),
            }
        }
    }

    /// Apply environment variable overrides to project config
    fn apply_env_overrides(&self, mut config: ProjectConfig) -> ConfigResult<ProjectConfig> {
        if let Ok(raw) = env::var("DASHCHECK_TIMEOUT_MS") {
            let timeout_ms = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or_else(|| ConfigError::InvalidValue {
                    field: "DASHCHECK_TIMEOUT_MS".to_string(),
                    reason: format!("expected a positive integer, got '{}'", raw),
                })?;
            config
                .run
                .get_or_insert_with(RunConfig::default)
                .timeout_ms = Some(timeout_ms);
        }

        if let Ok(dir) = env::var("DASHCHECK_REPORT_DIR") {
            if !dir.is_empty() {
                config
                    .report
                    .get_or_insert_with(ReportConfig::default)
                    .dir = Some(PathBuf::from(dir));
            }
        }

        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Get the project root directory
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Check if a config file was found
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }

    /// Per-test timeout, if configured
    pub fn timeout(&self) -> Option<Duration> {
        self.project.timeout_ms().map(Duration::from_millis)
    }

    pub fn verbose(&self) -> bool {
        self.project.verbose().unwrap_or(false)
    }

    pub fn report_enabled(&self) -> bool {
        self.project.report_enabled().unwrap_or(true)
    }

    /// Configured report file name
    pub fn report_name(&self) -> Option<&str> {
        self.project.report_name()
    }

    /// Report directory, resolved against the project root
    pub fn report_dir(&self) -> PathBuf {
        self.resolve(self.project.report_dir())
    }

    /// Check plan directory, resolved against the project root
    pub fn checks_dir(&self) -> PathBuf {
        self.resolve(self.project.checks_dir())
    }

    fn resolve(&self, path: Option<&Path>) -> PathBuf {
        let base = self.project_root.clone().unwrap_or_else(|| PathBuf::from("."));
        match path {
            Some(p) if p.is_absolute() => p.to_path_buf(),
            Some(p) => base.join(p),
            None => base,
        }
    }
}
