//! Check plans - declarative suites of assertions in `*.check.toml` files
//!
//! A plan names an optional JSON fixture and lists suites of tests. Each
//! test picks one assertion kind and its operands; operands are literals or
//! JSON pointers into the fixture.

mod discovery;

pub use discovery::PlanSet;

use dashcheck_core::assert::*;
use dashcheck_core::{TestRunner, Value, Verdict};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// File name suffix of check plans
pub const PLAN_SUFFIX: &str = ".check.toml";

/// Errors loading or evaluating a plan
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid plan syntax: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid fixture {path}")]
    Fixture {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Test '{test}': '{assert}' requires an expected operand")]
    MissingExpected { test: String, assert: AssertKind },

    #[error("Test '{test}': '{assert}' takes no expected operand")]
    UnexpectedExpected { test: String, assert: AssertKind },

    #[error("Test '{test}': '{assert}' expects a string name as expected operand")]
    ExpectedName { test: String, assert: AssertKind },

    #[error("Test '{test}': invalid JSON pointer '{pointer}' (must be empty or start with '/')")]
    InvalidPointer { test: String, pointer: String },

    #[error("pointer '{0}' used but the plan has no fixture")]
    NoFixture(String),
}

/// The twelve assertion kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssertKind {
    Equal,
    NotEqual,
    True,
    False,
    Contains,
    NotContains,
    GreaterThan,
    LessThan,
    NotNull,
    Null,
    Type,
    InstanceOf,
}

impl AssertKind {
    /// Whether the assertion compares against an expected operand
    pub fn needs_expected(self) -> bool {
        !matches!(
            self,
            AssertKind::True | AssertKind::False | AssertKind::NotNull | AssertKind::Null
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AssertKind::Equal => "equal",
            AssertKind::NotEqual => "not_equal",
            AssertKind::True => "true",
            AssertKind::False => "false",
            AssertKind::Contains => "contains",
            AssertKind::NotContains => "not_contains",
            AssertKind::GreaterThan => "greater_than",
            AssertKind::LessThan => "less_than",
            AssertKind::NotNull => "not_null",
            AssertKind::Null => "null",
            AssertKind::Type => "type",
            AssertKind::InstanceOf => "instance_of",
        }
    }
}

impl std::fmt::Display for AssertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An assertion operand: a fixture lookup or a literal
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    Pointer {
        pointer: String,
    },
    Literal(serde_json::Value),
}

impl Operand {
    /// Resolve against the fixture; a pointer with no target is `Undefined`
    pub fn resolve(&self, fixture: Option<&serde_json::Value>) -> Result<Value, PlanError> {
        match self {
            Operand::Literal(json) => Ok(Value::from(json)),
            Operand::Pointer { pointer } => {
                let fixture = fixture.ok_or_else(|| PlanError::NoFixture(pointer.clone()))?;
                Ok(fixture
                    .pointer(pointer)
                    .map(Value::from)
                    .unwrap_or(Value::Undefined))
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestSpec {
    pub name: String,
    pub assert: AssertKind,
    pub actual: Operand,
    #[serde(default)]
    pub expected: Option<Operand>,
    #[serde(default)]
    pub message: Option<String>,
}

impl TestSpec {
    fn validate(&self) -> Result<(), PlanError> {
        for operand in std::iter::once(&self.actual).chain(self.expected.as_ref()) {
            if let Operand::Pointer { pointer } = operand {
                if !pointer.is_empty() && !pointer.starts_with('/') {
                    return Err(PlanError::InvalidPointer {
                        test: self.name.clone(),
                        pointer: pointer.clone(),
                    });
                }
            }
        }

        match (&self.expected, self.assert) {
            (None, kind) if kind.needs_expected() => Err(PlanError::MissingExpected {
                test: self.name.clone(),
                assert: kind,
            }),
            (Some(_), kind) if !kind.needs_expected() => Err(PlanError::UnexpectedExpected {
                test: self.name.clone(),
                assert: kind,
            }),
            (Some(expected), kind @ (AssertKind::Type | AssertKind::InstanceOf)) => {
                match expected {
                    Operand::Literal(serde_json::Value::String(_)) => Ok(()),
                    _ => Err(PlanError::ExpectedName {
                        test: self.name.clone(),
                        assert: kind,
                    }),
                }
            }
            _ => Ok(()),
        }
    }

    /// Resolve the operands and apply the assertion
    pub fn evaluate(&self, fixture: Option<&serde_json::Value>) -> Result<Verdict, PlanError> {
        let actual = self.actual.resolve(fixture)?;
        let expected = match &self.expected {
            Some(operand) => operand.resolve(fixture)?,
            None => Value::Undefined,
        };
        let message = self.message.as_deref();

        let verdict = match self.assert {
            AssertKind::Equal => assert_equal(actual, expected, message),
            AssertKind::NotEqual => assert_not_equal(actual, expected, message),
            AssertKind::True => assert_true(actual, message),
            AssertKind::False => assert_false(actual, message),
            AssertKind::Contains => assert_contains(actual, expected, message),
            AssertKind::NotContains => assert_not_contains(actual, expected, message),
            AssertKind::GreaterThan => assert_greater_than(actual, expected, message),
            AssertKind::LessThan => assert_less_than(actual, expected, message),
            AssertKind::NotNull => assert_not_null(actual, message),
            AssertKind::Null => assert_null(actual, message),
            AssertKind::Type => assert_type(actual, expected.as_str().unwrap_or_default(), message),
            AssertKind::InstanceOf => {
                assert_instance_of(actual, expected.as_str().unwrap_or_default(), message)
            }
        };
        Ok(verdict)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuiteSpec {
    pub name: String,
    #[serde(default, rename = "test")]
    pub tests: Vec<TestSpec>,
}

/// On-disk layout of a plan file
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PlanFile {
    #[serde(default)]
    fixture: Option<PathBuf>,
    #[serde(default, rename = "suite")]
    suites: Vec<SuiteSpec>,
}

/// A loaded plan with its fixture parsed
#[derive(Debug, Clone)]
pub struct CheckPlan {
    pub path: PathBuf,
    pub fixture: Option<Arc<serde_json::Value>>,
    pub suites: Vec<SuiteSpec>,
}

impl CheckPlan {
    /// Read, parse and validate a plan file
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let source = fs::read_to_string(path).map_err(|source| PlanError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&source, path)
    }

    /// Parse plan text; a relative fixture path resolves against `path`'s directory
    pub fn parse(source: &str, path: &Path) -> Result<Self, PlanError> {
        let file: PlanFile = toml::from_str(source)?;

        for test in file.suites.iter().flat_map(|s| &s.tests) {
            test.validate()?;
        }

        let fixture = match file.fixture {
            Some(rel) => {
                let fixture_path = path.parent().unwrap_or(Path::new(".")).join(rel);
                Some(Arc::new(load_fixture(&fixture_path)?))
            }
            None => None,
        };

        Ok(CheckPlan {
            path: path.to_path_buf(),
            fixture,
            suites: file.suites,
        })
    }

    /// Number of tests across all suites
    pub fn test_count(&self) -> usize {
        self.suites.iter().map(|s| s.tests.len()).sum()
    }

    /// Register every test of the plan with `runner`, one suite at a time
    pub fn register(&self, runner: &mut TestRunner) {
        for suite in &self.suites {
            runner.describe(suite.name.clone(), |scope| {
                for test in &suite.tests {
                    let spec = test.clone();
                    let fixture = self.fixture.clone();
                    scope.it(test.name.clone(), move || spec.evaluate(fixture.as_deref()));
                }
            });
        }
    }
}

fn load_fixture(path: &Path) -> Result<serde_json::Value, PlanError> {
    let text = fs::read_to_string(path).map_err(|source| PlanError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| PlanError::Fixture {
        path: path.to_path_buf(),
        source,
    })
}
