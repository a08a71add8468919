use std::collections::BTreeMap;

use crate::expression::value::Value;
use crate::foundation::error::{ShapeError, ShapeResult};

/// An attribute program: either a literal or a postfix instruction group.
///
/// Document encodings:
///
/// - `0.5`, `[1, 0, 1]`, `"mandelbrot"`: literal (an array is literal unless its first element is
///   a string or an array);
/// - `["fsine", 0.1, 0.5]`: single opcode followed by its constants;
/// - `[[3, "const"], 1, 2, 3]` / `[["frame", "sine"]]`: instruction group with an optional lane
///   count, followed by the flat constant list.
#[derive(Clone, Debug, PartialEq)]
pub enum Expression {
    /// Passed through evaluation unchanged.
    Literal(Value),
    /// One opcode, invoked with an empty stack and all remaining constants.
    Call {
        /// Opcode name.
        op: String,
        /// Constants handed to the opcode.
        constants: Vec<Value>,
    },
    /// Stack program evaluated once per lane.
    Group {
        /// Leading vector-count marker, if present.
        lanes: Option<usize>,
        /// Opcode names in evaluation order.
        ops: Vec<String>,
        /// Constants, consumed left to right across lanes and instructions.
        constants: Vec<Value>,
    },
}

impl Expression {
    pub fn literal(v: impl Into<Value>) -> Self {
        Self::Literal(v.into())
    }

    pub fn call(op: impl Into<String>, constants: impl IntoIterator<Item = Value>) -> Self {
        Self::Call {
            op: op.into(),
            constants: constants.into_iter().collect(),
        }
    }

    pub fn group<S: Into<String>>(
        lanes: Option<usize>,
        ops: impl IntoIterator<Item = S>,
        constants: impl IntoIterator<Item = Value>,
    ) -> Self {
        Self::Group {
            lanes,
            ops: ops.into_iter().map(Into::into).collect(),
            constants: constants.into_iter().collect(),
        }
    }

    /// Decode the document form.
    pub fn from_json(v: &serde_json::Value) -> ShapeResult<Self> {
        let serde_json::Value::Array(items) = v else {
            return Ok(Self::Literal(Value::from_json(v)));
        };
        let constants = || items[1..].iter().map(Value::from_json).collect::<Vec<_>>();

        match items.first() {
            Some(serde_json::Value::String(op)) => Ok(Self::Call {
                op: op.clone(),
                constants: constants(),
            }),
            Some(serde_json::Value::Array(header)) => {
                let (lanes, names) = split_lane_marker(header)?;
                let ops = names
                    .iter()
                    .map(|n| match n {
                        serde_json::Value::String(s) => Ok(s.clone()),
                        other => Err(ShapeError::document(format!(
                            "instruction names must be strings, got {other}"
                        ))),
                    })
                    .collect::<ShapeResult<Vec<_>>>()?;
                if ops.is_empty() {
                    return Err(ShapeError::document("instruction group has no opcodes"));
                }
                Ok(Self::Group {
                    lanes,
                    ops,
                    constants: constants(),
                })
            }
            _ => Ok(Self::Literal(Value::from_json(v))),
        }
    }

    /// Encode back to the document form.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Literal(v) => v.to_json(),
            Self::Call { op, constants } => {
                let mut out = vec![serde_json::Value::String(op.clone())];
                out.extend(constants.iter().map(Value::to_json));
                serde_json::Value::Array(out)
            }
            Self::Group {
                lanes,
                ops,
                constants,
            } => {
                let mut header = Vec::with_capacity(ops.len() + 1);
                if let Some(n) = lanes {
                    header.push(serde_json::Value::from(*n));
                }
                header.extend(ops.iter().cloned().map(serde_json::Value::String));
                let mut out = vec![serde_json::Value::Array(header)];
                out.extend(constants.iter().map(Value::to_json));
                serde_json::Value::Array(out)
            }
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }
}

// A lane marker is a positive integer (`3` or `3.0`), or a string that parses as one.
fn split_lane_marker(
    header: &[serde_json::Value],
) -> ShapeResult<(Option<usize>, &[serde_json::Value])> {
    let lanes = match header.first() {
        Some(serde_json::Value::Number(n)) => {
            let count = n.as_u64().or_else(|| {
                n.as_f64()
                    .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                    .map(|f| f as u64)
            });
            let Some(count) = count else {
                return Err(ShapeError::document(format!(
                    "vector count must be a positive integer, got {n}"
                )));
            };
            Some(count as usize)
        }
        Some(serde_json::Value::String(s)) => s.trim().parse::<usize>().ok(),
        _ => None,
    };

    match lanes {
        Some(0) => Err(ShapeError::document("vector count must be at least 1")),
        Some(n) => Ok((Some(n), &header[1..])),
        None => Ok((None, header)),
    }
}

/// Mapping from attribute name to its program. Immutable after load.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributeSet(BTreeMap<String, Expression>);

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode every entry of a document attribute map, naming the offending key on error.
    pub fn from_json_map<'a>(
        entries: impl IntoIterator<Item = (&'a String, &'a serde_json::Value)>,
    ) -> ShapeResult<Self> {
        let mut out = BTreeMap::new();
        for (name, raw) in entries {
            let expr = Expression::from_json(raw).map_err(|e| e.at(format!("attribute '{name}'")))?;
            out.insert(name.clone(), expr);
        }
        Ok(Self(out))
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, expr: Expression) -> Self {
        self.0.insert(name.into(), expr);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, expr: Expression) -> Option<Expression> {
        self.0.insert(name.into(), expr)
    }

    pub fn get(&self, name: &str) -> Option<&Expression> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Expression)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/expr.rs"]
mod tests;
