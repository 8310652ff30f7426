//! Configuration loading and precedence tests

use dashcheck_config::{ConfigError, ConfigLoader, ProjectConfig, CONFIG_FILE_NAME};
use serial_test::serial;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

fn create_config_file(dir: &Path, content: &str) -> PathBuf {
    let config_path = dir.join(CONFIG_FILE_NAME);
    fs::write(&config_path, content).unwrap();
    config_path
}

// ============================================================================
// Config Loading Tests
// ============================================================================

#[test]
#[serial]
fn test_load_project_config_basic() {
    let temp_dir = TempDir::new().unwrap();
    create_config_file(
        temp_dir.path(),
        r#"
[run]
timeout_ms = 750
verbose = true
"#,
    );

    let config = ConfigLoader::new()
        .load_from_directory(temp_dir.path())
        .unwrap();

    assert!(config.is_project());
    assert!(config.verbose());
    assert_eq!(config.timeout(), Some(Duration::from_millis(750)));
}

#[test]
#[serial]
fn test_load_from_nested_subdirectory_finds_parent() {
    let temp_dir = TempDir::new().unwrap();
    create_config_file(
        temp_dir.path(),
        r#"
[report]
dir = "reports"
"#,
    );

    let nested = temp_dir.path().join("a").join("b").join("c");
    fs::create_dir_all(&nested).unwrap();

    let config = ConfigLoader::new().load_from_directory(&nested).unwrap();

    assert_eq!(config.project_root(), Some(temp_dir.path()));
    assert_eq!(config.report_dir(), temp_dir.path().join("reports"));
}

#[test]
#[serial]
fn test_absolute_checks_dir_is_kept() {
    let temp_dir = TempDir::new().unwrap();
    let elsewhere = TempDir::new().unwrap();
    create_config_file(
        temp_dir.path(),
        &format!(
            "[checks]\ndir = {:?}\n",
            elsewhere.path().to_string_lossy()
        ),
    );

    let config = ConfigLoader::new()
        .load_from_directory(temp_dir.path())
        .unwrap();

    assert_eq!(config.checks_dir(), elsewhere.path().to_path_buf());
}

// ============================================================================
// Error Tests
// ============================================================================

#[test]
#[serial]
fn test_invalid_toml_reports_file() {
    let temp_dir = TempDir::new().unwrap();
    create_config_file(temp_dir.path(), "[run\ntimeout_ms = 1");

    let err = ConfigLoader::new()
        .load_from_directory(temp_dir.path())
        .unwrap_err();

    match err {
        ConfigError::TomlParseError { file, .. } => {
            assert!(file.ends_with(CONFIG_FILE_NAME));
        }
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
#[serial]
fn test_unknown_section_rejected() {
    let temp_dir = TempDir::new().unwrap();
    create_config_file(temp_dir.path(), "[dashboard]\ntheme = \"dark\"\n");

    let result = ConfigLoader::new().load_from_directory(temp_dir.path());
    assert!(matches!(result, Err(ConfigError::TomlParseError { .. })));
}

#[test]
#[serial]
fn test_report_name_with_path_rejected() {
    let temp_dir = TempDir::new().unwrap();
    create_config_file(temp_dir.path(), "[report]\nname = \"out/report.json\"\n");

    let result = ConfigLoader::new().load_from_directory(temp_dir.path());
    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
}

#[test]
fn test_missing_explicit_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(CONFIG_FILE_NAME);

    let result = ProjectConfig::load_from_file(&path);
    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}

// ============================================================================
// Precedence Tests
// ============================================================================

#[test]
#[serial]
fn test_env_overrides_file_values() {
    let temp_dir = TempDir::new().unwrap();
    create_config_file(
        temp_dir.path(),
        r#"
[run]
timeout_ms = 100

[report]
dir = "from-file"
"#,
    );

    env::set_var("DASHCHECK_TIMEOUT_MS", "900");
    env::set_var("DASHCHECK_REPORT_DIR", "from-env");
    let config = ConfigLoader::new().load_from_directory(temp_dir.path());
    env::remove_var("DASHCHECK_TIMEOUT_MS");
    env::remove_var("DASHCHECK_REPORT_DIR");

    let config = config.unwrap();
    assert_eq!(config.timeout(), Some(Duration::from_millis(900)));
    assert_eq!(config.report_dir(), temp_dir.path().join("from-env"));
}

#[test]
#[serial]
fn test_file_values_used_without_env() {
    let temp_dir = TempDir::new().unwrap();
    create_config_file(
        temp_dir.path(),
        r#"
[report]
enabled = false
name = "nightly.json"
"#,
    );

    env::remove_var("DASHCHECK_TIMEOUT_MS");
    env::remove_var("DASHCHECK_REPORT_DIR");
    let config = ConfigLoader::new()
        .load_from_directory(temp_dir.path())
        .unwrap();

    assert!(!config.report_enabled());
    assert_eq!(config.report_name(), Some("nightly.json"));
    assert_eq!(config.report_dir(), temp_dir.path().to_path_buf());
}
