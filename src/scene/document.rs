use std::collections::BTreeMap;

use serde::Deserialize;

use crate::eval::context::SharedData;
use crate::eval::mix::MixPolicy;
use crate::foundation::error::{ShapeError, ShapeResult};

/// A scene document as authored on disk.
///
/// `graph`, `shared_data` and `setup` are required; `maps` is optional.
#[derive(Clone, Debug, Deserialize)]
pub struct SceneDocument {
    pub graph: GraphSection,
    pub shared_data: SharedData,
    pub setup: Setup,
    #[serde(default)]
    pub maps: Maps,
}

impl SceneDocument {
    pub fn from_json(value: &serde_json::Value) -> ShapeResult<Self> {
        Self::deserialize(value).map_err(|e| ShapeError::document(e.to_string()))
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct GraphSection {
    #[serde(default)]
    pub scenes: BTreeMap<String, SceneDef>,
    #[serde(default)]
    pub objects: BTreeMap<String, ObjectDef>,
}

/// One entry of `graph.scenes`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SceneDef {
    /// Child scene names, in draw order.
    #[serde(default)]
    pub scenes: Vec<String>,
    /// Child drawable names, in draw order.
    #[serde(default)]
    pub objects: Vec<String>,
    /// The scene's own attribute expressions.
    #[serde(default, rename = "self")]
    pub attrs: serde_json::Map<String, serde_json::Value>,
}

/// One entry of `graph.objects`: a kind plus attribute expressions.
#[derive(Clone, Debug, Deserialize)]
pub struct ObjectDef {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub attrs: serde_json::Map<String, serde_json::Value>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Setup {
    /// Recursion budget handed to the root scene.
    pub max_draw_depth: i32,
    pub root: String,
    pub background_color: [f64; 3],
    pub frame_rate: f64,
    /// Refuse documents whose scene references form a cycle.
    pub reject_cycles: bool,
}

impl Default for Setup {
    fn default() -> Self {
        Self {
            max_draw_depth: 5,
            root: "root".to_string(),
            background_color: [0.2, 0.3, 0.3],
            frame_rate: 30.0,
            reject_cycles: false,
        }
    }
}

/// Document-level overrides of the built-in tables.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Maps {
    /// alias → existing opcode
    pub opcodes: BTreeMap<String, String>,
    /// Entries merged over the built-in mix policy.
    pub mix: MixPolicy,
    /// alias → existing drawable kind
    pub kinds: BTreeMap<String, String>,
}

impl Default for Maps {
    fn default() -> Self {
        Self {
            opcodes: BTreeMap::new(),
            mix: MixPolicy::empty(),
            kinds: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/document.rs"]
mod tests;
