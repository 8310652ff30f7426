//! Verdicts and test outcomes
//!
//! A [`Verdict`] is the single result shape shared by every assertion and every
//! test action. Test actions may return anything implementing [`IntoOutcome`];
//! the runner records the resulting [`Outcome`].

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pass/fail outcome of one assertion or test action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub passed: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
}

impl Verdict {
    /// A passing verdict
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            actual: None,
            expected: None,
        }
    }

    /// A failing verdict
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            actual: None,
            expected: None,
        }
    }

    /// Attach the value that was checked
    pub fn with_actual(mut self, actual: impl Into<Value>) -> Self {
        self.actual = Some(actual.into());
        self
    }

    /// Attach the value the check compared against
    pub fn with_expected(mut self, expected: impl Into<Value>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    pub fn is_pass(&self) -> bool {
        self.passed
    }

    pub fn is_fail(&self) -> bool {
        !self.passed
    }

    /// Fold several verdicts into one.
    ///
    /// Returns the first failing verdict, or a pass summarising how many
    /// checks ran. An empty input yields `None`, which the runner records as
    /// "No result".
    pub fn all(verdicts: impl IntoIterator<Item = Verdict>) -> Option<Verdict> {
        let mut count = 0usize;
        for verdict in verdicts {
            if verdict.is_fail() {
                return Some(verdict);
            }
            count += 1;
        }
        match count {
            0 => None,
            1 => Some(Verdict::pass("1 assertion passed")),
            n => Some(Verdict::pass(format!("{} assertions passed", n))),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.passed { "pass" } else { "fail" };
        write!(f, "{}: {}", status, self.message)
    }
}

/// What a test action produced
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The action produced a verdict
    Verdict(Verdict),
    /// The action completed without producing a verdict
    NoVerdict,
    /// The action raised an error or panicked
    Raised(String),
}

/// Conversion from a test action's return value into an [`Outcome`]
pub trait IntoOutcome {
    fn into_outcome(self) -> Outcome;
}

impl IntoOutcome for Outcome {
    fn into_outcome(self) -> Outcome {
        self
    }
}

impl IntoOutcome for Verdict {
    fn into_outcome(self) -> Outcome {
        Outcome::Verdict(self)
    }
}

impl IntoOutcome for Option<Verdict> {
    fn into_outcome(self) -> Outcome {
        match self {
            Some(verdict) => Outcome::Verdict(verdict),
            None => Outcome::NoVerdict,
        }
    }
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Outcome {
        Outcome::NoVerdict
    }
}

impl<T, E> IntoOutcome for Result<T, E>
where
    T: IntoOutcome,
    E: fmt::Display,
{
    fn into_outcome(self) -> Outcome {
        match self {
            Ok(inner) => inner.into_outcome(),
            Err(e) => Outcome::Raised(e.to_string()),
        }
    }
}
