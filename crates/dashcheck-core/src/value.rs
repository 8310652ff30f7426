//! Runtime value representation
//!
//! Dynamic values inspected by assertions.
//! - Undefined, Null, Bool, Number: immediate values
//! - String: reference-counted, immutable
//! - Array, Object: owned, compared by content
//! - Function: a named callable reference, compared by name
//!
//! Values round-trip through JSON for fixtures and reports. Two keys carry the
//! parts plain JSON cannot express: `"$class"` (a class name or a chain of
//! names, most-derived first) and `"$function"` (a function reference).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

const CLASS_KEY: &str = "$class";
const FUNCTION_KEY: &str = "$function";

/// A dynamic value checked by assertions
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value (a missing lookup)
    #[default]
    Undefined,
    /// Explicit null
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value (IEEE 754 double-precision)
    Number(f64),
    /// String value (reference-counted, immutable)
    String(Arc<String>),
    /// Ordered sequence
    Array(Vec<Value>),
    /// Keyed record with an optional class chain
    Object(ObjectValue),
    /// Function reference
    Function(Arc<str>),
}

/// An object value: fields plus the classes it is an instance of
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectValue {
    /// Class chain, most-derived first. Empty for plain records.
    pub classes: Vec<String>,
    /// Fields in key order
    pub fields: BTreeMap<String, Value>,
}

impl ObjectValue {
    /// Create a plain record with no class chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an instance of `class`
    pub fn instance_of(class: impl Into<String>) -> Self {
        Self {
            classes: vec![class.into()],
            fields: BTreeMap::new(),
        }
    }

    /// Append a superclass to the class chain
    pub fn extends(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Set a field
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

impl Value {
    /// Create a new string value
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(Arc::new(s.into()))
    }

    /// Create a new array value
    pub fn array(values: Vec<Value>) -> Self {
        Value::Array(values)
    }

    /// Create a function reference
    pub fn function(name: impl AsRef<str>) -> Self {
        Value::Function(Arc::from(name.as_ref()))
    }

    /// Get the runtime tag of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
        }
    }

    /// True for `Null` and `Undefined`
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Null | Value::Undefined)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Check class membership.
    ///
    /// Objects match any class in their chain. Every array is an `Array` and
    /// every function a `Function`; primitives are instances of nothing.
    pub fn is_instance_of(&self, class: &str) -> bool {
        match self {
            Value::Object(obj) => class == "Object" || obj.classes.iter().any(|c| c == class),
            Value::Array(_) => class == "Array" || class == "Object",
            Value::Function(_) => class == "Function" || class == "Object",
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => {
                // Whole numbers print without a trailing .0
                if n.fract() == 0.0 && n.is_finite() {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => write!(f, "{:?}", s.as_str()),
            Value::Array(items) => {
                let elements: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", elements.join(", "))
            }
            Value::Object(obj) => {
                if let Some(class) = obj.classes.first() {
                    write!(f, "{} ", class)?;
                }
                let fields: Vec<String> = obj
                    .fields
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v))
                    .collect();
                write!(f, "{{{}}}", fields.join(", "))
            }
            Value::Function(name) => write!(f, "<fn {}>", name),
        }
    }
}

// ============================================================================
// Conversions from Rust values
// ============================================================================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

impl From<ObjectValue> for Value {
    fn from(obj: ObjectValue) -> Self {
        Value::Object(obj)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

// ============================================================================
// JSON interop
// ============================================================================

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::string(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(mut map) => {
                if map.len() == 1 {
                    if let Some(serde_json::Value::String(name)) = map.get(FUNCTION_KEY) {
                        return Value::function(name);
                    }
                }
                let classes = match map.remove(CLASS_KEY) {
                    Some(serde_json::Value::String(class)) => vec![class],
                    Some(serde_json::Value::Array(chain)) => chain
                        .into_iter()
                        .filter_map(|c| match c {
                            serde_json::Value::String(s) => Some(s),
                            _ => None,
                        })
                        .collect(),
                    _ => Vec::new(),
                };
                let fields = map.into_iter().map(|(k, v)| (k, Value::from(v))).collect();
                Value::Object(ObjectValue { classes, fields })
            }
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        Value::from(json.clone())
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            // JSON has no undefined
            Value::Undefined | Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.as_ref().clone()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
            }
            Value::Object(obj) => {
                let mut map: serde_json::Map<String, serde_json::Value> = obj
                    .fields
                    .iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
                    .collect();
                match obj.classes.as_slice() {
                    [] => {}
                    [single] => {
                        map.insert(
                            CLASS_KEY.to_string(),
                            serde_json::Value::String(single.clone()),
                        );
                    }
                    chain => {
                        map.insert(
                            CLASS_KEY.to_string(),
                            serde_json::Value::Array(
                                chain
                                    .iter()
                                    .map(|c| serde_json::Value::String(c.clone()))
                                    .collect(),
                            ),
                        );
                    }
                }
                serde_json::Value::Object(map)
            }
            Value::Function(name) => {
                let mut map = serde_json::Map::new();
                map.insert(
                    FUNCTION_KEY.to_string(),
                    serde_json::Value::String(name.to_string()),
                );
                serde_json::Value::Object(map)
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde_json::Value::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Undefined.type_name(), "undefined");
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::from(true).type_name(), "boolean");
        assert_eq!(Value::from(1).type_name(), "number");
        assert_eq!(Value::from("x").type_name(), "string");
        assert_eq!(Value::from(vec![1, 2]).type_name(), "array");
        assert_eq!(Value::from(ObjectValue::new()).type_name(), "object");
        assert_eq!(Value::function("f").type_name(), "function");
    }

    #[test]
    fn test_nan_is_not_equal_to_itself() {
        assert_ne!(Value::Number(f64::NAN), Value::Number(f64::NAN));
    }

    #[test]
    fn test_undefined_and_null_differ() {
        assert_ne!(Value::Undefined, Value::Null);
        assert!(Value::Undefined.is_nullish());
        assert!(Value::Null.is_nullish());
        assert!(!Value::from(0).is_nullish());
    }

    #[test]
    fn test_option_none_becomes_null() {
        let none: Option<i32> = None;
        assert_eq!(Value::from(none), Value::Null);
        assert_eq!(Value::from(Some(3)), Value::Number(3.0));
    }

    #[test]
    fn test_display_formats() {
        assert_eq!(Value::from(5).to_string(), "5");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
        assert_eq!(Value::from("hi").to_string(), "\"hi\"");
        assert_eq!(Value::from(vec![1, 2]).to_string(), "[1, 2]");
        let obj = ObjectValue::instance_of("Chart").field("id", "risk");
        assert_eq!(Value::from(obj).to_string(), "Chart {id: \"risk\"}");
        assert_eq!(Value::function("save").to_string(), "<fn save>");
    }

    #[test]
    fn test_json_object_with_class_chain() {
        let value = Value::from(json!({
            "$class": ["HTMLCanvasElement", "HTMLElement"],
            "id": "riskChart"
        }));
        assert!(value.is_instance_of("HTMLCanvasElement"));
        assert!(value.is_instance_of("HTMLElement"));
        assert!(value.is_instance_of("Object"));
        assert!(!value.is_instance_of("HTMLDivElement"));
        match &value {
            Value::Object(obj) => {
                assert_eq!(obj.get("id"), Some(&Value::from("riskChart")));
                assert!(obj.get("$class").is_none());
            }
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_json_function_marker() {
        let value = Value::from(json!({ "$function": "calculateROI" }));
        assert_eq!(value, Value::function("calculateROI"));
        assert_eq!(
            serde_json::Value::from(&value),
            json!({ "$function": "calculateROI" })
        );
    }

    #[test]
    fn test_to_json_keeps_class() {
        let obj = ObjectValue::instance_of("Customer").field("risk", 0.8);
        assert_eq!(
            serde_json::Value::from(&Value::from(obj)),
            json!({ "$class": "Customer", "risk": 0.8 })
        );
    }

    #[test]
    fn test_undefined_serializes_as_null() {
        let text = serde_json::to_string(&Value::Undefined).unwrap();
        assert_eq!(text, "null");
    }

    #[test]
    fn test_primitives_are_not_instances() {
        assert!(!Value::from(1).is_instance_of("Number"));
        assert!(Value::from(vec![1]).is_instance_of("Array"));
        assert!(Value::function("f").is_instance_of("Function"));
    }
}
