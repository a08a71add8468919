use std::collections::BTreeMap;

use crate::expression::value::Value;

/// Pointer state in normalized device coordinates (`y` up).
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Pointer {
    pub x: f64,
    pub y: f64,
    /// `[left, right]` press edges for this frame.
    pub pressed: [bool; 2],
}

impl Pointer {
    /// Convert a window-space pixel position (origin top-left) to normalized coordinates.
    pub fn from_window(px: f64, py: f64, width: u32, height: u32) -> Self {
        let w = f64::from(width.max(1));
        let h = f64::from(height.max(1));
        Self {
            x: 2.0 * (px / w) - 1.0,
            y: -(2.0 * (py / h) - 1.0),
            pressed: [false, false],
        }
    }
}

/// Viewport size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 720,
            height: 480,
        }
    }
}

/// Per-frame read-only inputs available to every attribute program.
#[derive(Clone, Debug, PartialEq)]
pub struct EvalContext {
    /// Frame counter. May be negative when scrubbing backwards.
    pub frame: i64,
    /// Height over width of the viewport.
    pub aspect: f64,
    pub viewport: Viewport,
    pub pointer: Option<Pointer>,
}

impl EvalContext {
    pub fn new(frame: i64, aspect: f64) -> Self {
        Self {
            frame,
            aspect,
            viewport: Viewport::default(),
            pointer: None,
        }
    }

    /// Context whose aspect ratio is derived from the viewport (`height / width`).
    pub fn for_viewport(frame: i64, viewport: Viewport) -> Self {
        let aspect = f64::from(viewport.height) / f64::from(viewport.width.max(1));
        Self {
            frame,
            aspect,
            viewport,
            pointer: None,
        }
    }

    pub fn with_pointer(mut self, pointer: Pointer) -> Self {
        self.pointer = Some(pointer);
        self
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::for_viewport(0, Viewport::default())
    }
}

/// Read-only nested lookup table, constant for the lifetime of a loaded scene.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct SharedData(BTreeMap<String, Value>);

impl SharedData {
    pub fn new(tables: BTreeMap<String, Value>) -> Self {
        Self(tables)
    }

    /// `self[table][key]`, treating `null` entries as absent.
    pub fn lookup(&self, table: &str, key: &str) -> Option<&Value> {
        self.0
            .get(table)?
            .as_table()?
            .get(key)
            .filter(|v| !v.is_null())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
