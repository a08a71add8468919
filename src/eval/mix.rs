use std::collections::BTreeMap;

use crate::expression::value::Value;
use crate::foundation::error::{ShapeError, ShapeResult};

static ZERO: Value = Value::Number(0.0);
static ONE: Value = Value::Number(1.0);

/// Concrete attribute values for one node and frame.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, Value>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Required numeric attribute.
    pub fn number(&self, name: &str) -> ShapeResult<f64> {
        self.require(name)?
            .as_f64()
            .map_err(|e| e.at(format!("attribute '{name}'")))
    }

    /// Required boolean attribute (numbers coerce, non-zero is `true`).
    pub fn flag(&self, name: &str) -> ShapeResult<bool> {
        self.require(name)?
            .as_bool()
            .map_err(|e| e.at(format!("attribute '{name}'")))
    }

    /// Numeric attribute where `null` means "not set".
    pub fn optional_number(&self, name: &str) -> ShapeResult<Option<f64>> {
        match self.0.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => v
                .as_f64()
                .map(Some)
                .map_err(|e| e.at(format!("attribute '{name}'"))),
        }
    }

    pub fn require(&self, name: &str) -> ShapeResult<&Value> {
        self.0
            .get(name)
            .ok_or_else(|| ShapeError::evaluation(format!("missing attribute '{name}'")))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// How a node's own value combines with the value inherited from its parent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MixMode {
    /// Product of both sides (missing side counts as 1).
    #[serde(alias = "mult")]
    Multiply,
    /// Sum of both sides (missing side counts as 0).
    Add,
    /// Own value, else inherited.
    #[default]
    Inherit,
    /// Inherited value, else own.
    Ignore,
    /// Carried through untouched for the consuming node to combine itself.
    Passthrough,
}

/// Global mix policy. Names that are not listed behave as [`MixMode::Inherit`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct MixPolicy(BTreeMap<String, MixMode>);

impl Default for MixPolicy {
    fn default() -> Self {
        Self::builtin()
    }
}

impl MixPolicy {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn builtin() -> Self {
        Self::empty()
            .with("alpha", MixMode::Multiply)
            .with("pos_x", MixMode::Add)
            .with("pos_y", MixMode::Add)
            .with("visible", MixMode::Inherit)
            .with("unused", MixMode::Ignore)
            .with("clip_rect", MixMode::Passthrough)
    }

    pub fn with(mut self, name: impl Into<String>, mode: MixMode) -> Self {
        self.0.insert(name.into(), mode);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, mode: MixMode) {
        self.0.insert(name.into(), mode);
    }

    /// Overlay `other` on top of this policy.
    pub fn merge(&mut self, other: &MixPolicy) {
        self.0.extend(other.0.iter().map(|(k, v)| (k.clone(), *v)));
    }

    pub fn mode(&self, name: &str) -> MixMode {
        self.0.get(name).copied().unwrap_or_default()
    }
}

/// Fallback value and human-readable description for one recognised attribute.
#[derive(Clone, Debug, PartialEq)]
pub struct DefaultEntry {
    pub fallback: Value,
    pub description: String,
}

/// The set of attributes a node kind recognises, with their fallbacks.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DefaultTable(BTreeMap<String, DefaultEntry>);

impl DefaultTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(
        mut self,
        name: impl Into<String>,
        fallback: impl Into<Value>,
        description: impl Into<String>,
    ) -> Self {
        self.0.insert(
            name.into(),
            DefaultEntry {
                fallback: fallback.into(),
                description: description.into(),
            },
        );
        self
    }

    /// Replace the fallback of an existing entry.
    pub fn set_fallback(&mut self, name: &str, fallback: impl Into<Value>) {
        if let Some(entry) = self.0.get_mut(name) {
            entry.fallback = fallback.into();
        }
    }

    pub fn get(&self, name: &str) -> Option<&DefaultEntry> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DefaultEntry)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Merge own and inherited values into exactly the names of `defaults`.
pub fn mix(
    own: &Attributes,
    inherited: &Attributes,
    defaults: &DefaultTable,
    policy: &MixPolicy,
) -> ShapeResult<Attributes> {
    let mut out = Attributes::new();

    for (name, entry) in defaults.iter() {
        let mine = own.get(name);
        let theirs = inherited.get(name);

        let value = match policy.mode(name) {
            MixMode::Multiply => match (mine, theirs) {
                (None, None) => entry.fallback.clone(),
                (a, b) => a
                    .unwrap_or(&ONE)
                    .mul(b.unwrap_or(&ONE))
                    .map_err(|e| e.at(format!("mixing '{name}'")))?,
            },
            MixMode::Add => match (mine, theirs) {
                (None, None) => entry.fallback.clone(),
                (a, b) => a
                    .unwrap_or(&ZERO)
                    .add(b.unwrap_or(&ZERO))
                    .map_err(|e| e.at(format!("mixing '{name}'")))?,
            },
            MixMode::Inherit => mine.or(theirs).unwrap_or(&entry.fallback).clone(),
            MixMode::Ignore | MixMode::Passthrough => {
                theirs.or(mine).unwrap_or(&entry.fallback).clone()
            }
        };
        out.insert(name, value);
    }

    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/eval/mix.rs"]
mod tests;
