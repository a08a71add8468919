use std::collections::BTreeMap;
use std::fmt;

use crate::foundation::error::{ShapeError, ShapeResult};

// 2^53: integral values below this survive an i64 round trip.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// A concrete attribute value.
///
/// Values are untyped at storage time; each consumer checks the shape it needs.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent / unconstrained.
    #[default]
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Scalar number.
    Number(f64),
    /// Text (program names, lookup keys).
    Str(String),
    /// Fixed-size vector (colors, rectangles, per-lane results).
    List(Vec<Value>),
    /// Nested table, as produced by `lookup` on shared data.
    Table(BTreeMap<String, Value>),
}

impl Value {
    /// Convert a parsed JSON value.
    pub fn from_json(v: &serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Self::Str(s.clone()),
            serde_json::Value::Array(items) => {
                Self::List(items.iter().map(Self::from_json).collect())
            }
            serde_json::Value::Object(map) => Self::Table(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert back to JSON. Non-finite numbers become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < MAX_EXACT_INT => {
                serde_json::Value::from(*n as i64)
            }
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::Str(s) => serde_json::Value::String(s.clone()),
            Self::List(items) => {
                serde_json::Value::Array(items.iter().map(Self::to_json).collect())
            }
            Self::Table(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }

    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::Str(_) => "string",
            Self::List(_) => "vector",
            Self::Table(_) => "table",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_f64(&self) -> ShapeResult<f64> {
        match self {
            Self::Number(n) => Ok(*n),
            other => Err(mismatch("number", other)),
        }
    }

    /// Booleans, or numbers where any non-zero value is `true`.
    pub fn as_bool(&self) -> ShapeResult<bool> {
        match self {
            Self::Bool(b) => Ok(*b),
            Self::Number(n) => Ok(*n != 0.0),
            other => Err(mismatch("bool", other)),
        }
    }

    pub fn as_str(&self) -> ShapeResult<&str> {
        match self {
            Self::Str(s) => Ok(s),
            other => Err(mismatch("string", other)),
        }
    }

    pub fn as_list(&self) -> ShapeResult<&[Value]> {
        match self {
            Self::List(items) => Ok(items),
            other => Err(mismatch("vector", other)),
        }
    }

    pub fn as_table(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Table(map) => Some(map),
            _ => None,
        }
    }

    /// A vector of plain numbers.
    pub fn as_numbers(&self) -> ShapeResult<Vec<f64>> {
        self.as_list()?.iter().map(Self::as_f64).collect()
    }

    /// Key form used when indexing tables: strings as-is, integral numbers without a fraction.
    pub fn as_key(&self) -> ShapeResult<String> {
        match self {
            Self::Str(s) => Ok(s.clone()),
            Self::Number(n) if n.fract() == 0.0 && n.is_finite() => Ok(format!("{}", *n as i64)),
            Self::Number(n) => Ok(n.to_string()),
            other => Err(mismatch("lookup key", other)),
        }
    }

    /// Element-wise sum. Scalars broadcast over vectors.
    pub fn add(&self, rhs: &Value) -> ShapeResult<Value> {
        zip_numeric(self, rhs, "add", |a, b| a + b)
    }

    /// Element-wise product. Scalars broadcast over vectors.
    pub fn mul(&self, rhs: &Value) -> ShapeResult<Value> {
        zip_numeric(self, rhs, "multiply", |a, b| a * b)
    }

    /// Apply `f` to every number, recursing through vectors.
    pub fn map_numeric(&self, op: &str, f: impl Fn(f64) -> f64 + Copy) -> ShapeResult<Value> {
        match self {
            Self::Number(n) => Ok(Self::Number(f(*n))),
            Self::List(items) => items
                .iter()
                .map(|v| v.map_numeric(op, f))
                .collect::<ShapeResult<Vec<_>>>()
                .map(Self::List),
            other => Err(ShapeError::evaluation(format!(
                "{op} expects a number or vector, got {}",
                other.type_name()
            ))),
        }
    }
}

fn mismatch(expected: &str, got: &Value) -> ShapeError {
    ShapeError::evaluation(format!("expected {expected}, got {}", got.type_name()))
}

fn zip_numeric(
    a: &Value,
    b: &Value,
    op: &str,
    f: impl Fn(f64, f64) -> f64 + Copy,
) -> ShapeResult<Value> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Ok(Value::Number(f(*x, *y))),
        (Value::List(xs), Value::Number(_)) => xs
            .iter()
            .map(|x| zip_numeric(x, b, op, f))
            .collect::<ShapeResult<Vec<_>>>()
            .map(Value::List),
        (Value::Number(_), Value::List(ys)) => ys
            .iter()
            .map(|y| zip_numeric(a, y, op, f))
            .collect::<ShapeResult<Vec<_>>>()
            .map(Value::List),
        (Value::List(xs), Value::List(ys)) if xs.len() == ys.len() => xs
            .iter()
            .zip(ys)
            .map(|(x, y)| zip_numeric(x, y, op, f))
            .collect::<ShapeResult<Vec<_>>>()
            .map(Value::List),
        (Value::List(xs), Value::List(ys)) => Err(ShapeError::evaluation(format!(
            "{op}: vector length mismatch ({} vs {})",
            xs.len(),
            ys.len()
        ))),
        (a, b) => Err(ShapeError::evaluation(format!(
            "{op}: cannot combine {} with {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Number(f64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Self::List(v.into_iter().map(Self::Number).collect())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/value.rs"]
mod tests;
