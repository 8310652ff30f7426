//! Assertion helpers
//!
//! Every assertion returns a [`Verdict`] and never panics. A `message`, when
//! given, replaces the default description in the verdict.
//!
//! # API
//!
//! ## Equality
//! - `assert_equal(actual, expected)`: same runtime tag and equal value
//! - `assert_not_equal(actual, expected)`
//!
//! ## Boolean
//! - `assert_true(value)`: value is exactly `true`
//! - `assert_false(value)`: value is exactly `false`
//!
//! ## Membership
//! - `assert_contains(haystack, needle)`: array includes item, or string includes substring
//! - `assert_not_contains(haystack, needle)`
//!
//! ## Ordering
//! - `assert_greater_than(actual, bound)`: strict numeric ordering
//! - `assert_less_than(actual, bound)`
//!
//! ## Presence
//! - `assert_null(value)`: null or undefined
//! - `assert_not_null(value)`
//!
//! ## Types
//! - `assert_type(value, tag)`: runtime tag comparison (see [`Value::type_name`])
//! - `assert_instance_of(value, class)`: class-chain membership

use crate::value::Value;
use crate::verdict::Verdict;

// ============================================================================
// Internal helpers
// ============================================================================

/// Pick the caller's message over the default description.
fn describe(message: Option<&str>, default: impl FnOnce() -> String) -> String {
    match message {
        Some(m) if !m.is_empty() => m.to_string(),
        _ => default(),
    }
}

fn verdict(passed: bool, message: String) -> Verdict {
    if passed {
        Verdict::pass(message)
    } else {
        Verdict::fail(message)
    }
}

/// Membership test. `None` when `haystack` is not a container.
///
/// Array elements match by equality, except that `NaN` matches `NaN`.
fn contains(haystack: &Value, needle: &Value) -> Option<bool> {
    match haystack {
        Value::Array(items) => Some(items.iter().any(|item| same_value_zero(item, needle))),
        Value::String(s) => Some(match needle {
            Value::String(n) => s.contains(n.as_str()),
            _ => false,
        }),
        _ => None,
    }
}

fn same_value_zero(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) if x.is_nan() && y.is_nan() => true,
        _ => a == b,
    }
}

/// Both operands as numbers, or a failing verdict naming the offender.
fn numbers(
    fn_name: &str,
    actual: &Value,
    bound: &Value,
    message: Option<&str>,
) -> Result<(f64, f64), Verdict> {
    match (actual.as_number(), bound.as_number()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => {
            let offender = if actual.as_number().is_none() {
                actual
            } else {
                bound
            };
            let message = describe(message, || {
                format!("{}: expected number, got {}", fn_name, offender.type_name())
            });
            Err(Verdict::fail(message)
                .with_actual(actual.clone())
                .with_expected(bound.clone()))
        }
    }
}

// ============================================================================
// Equality assertions
// ============================================================================

/// Passes when `actual` and `expected` have the same runtime tag and value.
pub fn assert_equal(
    actual: impl Into<Value>,
    expected: impl Into<Value>,
    message: Option<&str>,
) -> Verdict {
    let actual = actual.into();
    let expected = expected.into();
    let passed = actual == expected;
    let message = describe(message, || {
        if passed {
            format!("values are equal: {}", actual)
        } else {
            format!("expected {}, got {}", expected, actual)
        }
    });
    verdict(passed, message)
        .with_actual(actual)
        .with_expected(expected)
}

/// Passes when `actual` and `expected` differ.
pub fn assert_not_equal(
    actual: impl Into<Value>,
    expected: impl Into<Value>,
    message: Option<&str>,
) -> Verdict {
    let actual = actual.into();
    let expected = expected.into();
    let passed = actual != expected;
    let message = describe(message, || {
        if passed {
            format!("{} differs from {}", actual, expected)
        } else {
            format!("expected a value other than {}", expected)
        }
    });
    verdict(passed, message)
        .with_actual(actual)
        .with_expected(expected)
}

// ============================================================================
// Boolean assertions
// ============================================================================

/// Passes only for the boolean `true`; no truthiness conversions.
pub fn assert_true(value: impl Into<Value>, message: Option<&str>) -> Verdict {
    let value = value.into();
    let passed = value == Value::Bool(true);
    let message = describe(message, || format!("expected true, got {}", value));
    verdict(passed, message)
        .with_actual(value)
        .with_expected(true)
}

/// Passes only for the boolean `false`.
pub fn assert_false(value: impl Into<Value>, message: Option<&str>) -> Verdict {
    let value = value.into();
    let passed = value == Value::Bool(false);
    let message = describe(message, || format!("expected false, got {}", value));
    verdict(passed, message)
        .with_actual(value)
        .with_expected(false)
}

// ============================================================================
// Membership assertions
// ============================================================================

/// Passes when the array `haystack` holds `needle`, or the string `haystack`
/// contains the string `needle`. A `NaN` needle is found in an array holding `NaN`.
pub fn assert_contains(
    haystack: impl Into<Value>,
    needle: impl Into<Value>,
    message: Option<&str>,
) -> Verdict {
    let haystack = haystack.into();
    let needle = needle.into();
    let Some(found) = contains(&haystack, &needle) else {
        let message = describe(message, || {
            format!(
                "assert_contains: expected array or string, got {}",
                haystack.type_name()
            )
        });
        return Verdict::fail(message)
            .with_actual(haystack)
            .with_expected(needle);
    };
    let message = describe(message, || {
        if found {
            format!("{} contains {}", haystack, needle)
        } else {
            format!("{} does not contain {}", haystack, needle)
        }
    });
    verdict(found, message)
        .with_actual(haystack)
        .with_expected(needle)
}

/// Passes when `haystack` is a container that does not hold `needle`.
pub fn assert_not_contains(
    haystack: impl Into<Value>,
    needle: impl Into<Value>,
    message: Option<&str>,
) -> Verdict {
    let haystack = haystack.into();
    let needle = needle.into();
    let Some(found) = contains(&haystack, &needle) else {
        let message = describe(message, || {
            format!(
                "assert_not_contains: expected array or string, got {}",
                haystack.type_name()
            )
        });
        return Verdict::fail(message)
            .with_actual(haystack)
            .with_expected(needle);
    };
    let message = describe(message, || {
        if found {
            format!("{} unexpectedly contains {}", haystack, needle)
        } else {
            format!("{} does not contain {}", haystack, needle)
        }
    });
    verdict(!found, message)
        .with_actual(haystack)
        .with_expected(needle)
}

// ============================================================================
// Ordering assertions
// ============================================================================

/// Passes when `actual > bound`. Both must be numbers; NaN never passes.
pub fn assert_greater_than(
    actual: impl Into<Value>,
    bound: impl Into<Value>,
    message: Option<&str>,
) -> Verdict {
    let actual = actual.into();
    let bound = bound.into();
    let (a, b) = match numbers("assert_greater_than", &actual, &bound, message) {
        Ok(pair) => pair,
        Err(verdict) => return verdict,
    };
    let passed = a > b;
    let message = describe(message, || {
        format!("expected {} to be greater than {}", actual, bound)
    });
    verdict(passed, message)
        .with_actual(actual)
        .with_expected(bound)
}

/// Passes when `actual < bound`. Both must be numbers; NaN never passes.
pub fn assert_less_than(
    actual: impl Into<Value>,
    bound: impl Into<Value>,
    message: Option<&str>,
) -> Verdict {
    let actual = actual.into();
    let bound = bound.into();
    let (a, b) = match numbers("assert_less_than", &actual, &bound, message) {
        Ok(pair) => pair,
        Err(verdict) => return verdict,
    };
    let passed = a < b;
    let message = describe(message, || {
        format!("expected {} to be less than {}", actual, bound)
    });
    verdict(passed, message)
        .with_actual(actual)
        .with_expected(bound)
}

// ============================================================================
// Presence assertions
// ============================================================================

/// Passes for `null` and `undefined`.
pub fn assert_null(value: impl Into<Value>, message: Option<&str>) -> Verdict {
    let value = value.into();
    let passed = value.is_nullish();
    let message = describe(message, || format!("expected null, got {}", value));
    verdict(passed, message)
        .with_actual(value)
        .with_expected(Value::Null)
}

/// Passes for anything but `null` and `undefined`.
pub fn assert_not_null(value: impl Into<Value>, message: Option<&str>) -> Verdict {
    let value = value.into();
    let passed = !value.is_nullish();
    let message = describe(message, || {
        if passed {
            format!("value is present: {}", value)
        } else {
            format!("expected a value, got {}", value)
        }
    });
    verdict(passed, message).with_actual(value)
}

// ============================================================================
// Type assertions
// ============================================================================

/// Passes when the runtime tag of `value` equals `expected_type`.
pub fn assert_type(value: impl Into<Value>, expected_type: &str, message: Option<&str>) -> Verdict {
    let value = value.into();
    let actual_type = value.type_name();
    let passed = actual_type == expected_type;
    let message = describe(message, || {
        format!("expected type {}, got {}", expected_type, actual_type)
    });
    verdict(passed, message)
        .with_actual(actual_type)
        .with_expected(expected_type)
}

/// Passes when `value` is an instance of `class` (see [`Value::is_instance_of`]).
pub fn assert_instance_of(value: impl Into<Value>, class: &str, message: Option<&str>) -> Verdict {
    let value = value.into();
    let passed = value.is_instance_of(class);
    let message = describe(message, || {
        if passed {
            format!("value is an instance of {}", class)
        } else {
            format!("expected an instance of {}, got {}", class, value)
        }
    });
    verdict(passed, message)
        .with_actual(value)
        .with_expected(class)
}

// ============================================================================
// Unit tests
// ============================================================================
