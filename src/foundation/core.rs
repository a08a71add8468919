use crate::expression::value::Value;
use crate::foundation::error::{ShapeError, ShapeResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Axis-aligned clip region in normalized device coordinates.
///
/// Each bound is optional; `None` leaves that side unconstrained. Intersecting two clip
/// rectangles never enlarges either of them.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClipRect {
    /// Left edge.
    pub min_x: Option<f64>,
    /// Bottom edge.
    pub min_y: Option<f64>,
    /// Right edge.
    pub max_x: Option<f64>,
    /// Top edge.
    pub max_y: Option<f64>,
}

impl ClipRect {
    /// A clip with no constraint on any side.
    pub const UNBOUNDED: Self = Self {
        min_x: None,
        min_y: None,
        max_x: None,
        max_y: None,
    };

    /// Fully bounded clip.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x: Some(min_x),
            min_y: Some(min_y),
            max_x: Some(max_x),
            max_y: Some(max_y),
        }
    }

    /// Clip centered on `center`; a missing half extent leaves that axis unconstrained.
    pub fn centered(center: Point, half_w: Option<f64>, half_h: Option<f64>) -> Self {
        Self {
            min_x: half_w.map(|w| center.x - w),
            min_y: half_h.map(|h| center.y - h),
            max_x: half_w.map(|w| center.x + w),
            max_y: half_h.map(|h| center.y + h),
        }
    }

    /// Ordinate-wise intersection.
    pub fn intersect(self, other: Self) -> Self {
        fn pick(a: Option<f64>, b: Option<f64>, f: fn(f64, f64) -> f64) -> Option<f64> {
            match (a, b) {
                (Some(a), Some(b)) => Some(f(a, b)),
                (a, None) => a,
                (None, b) => b,
            }
        }

        Self {
            min_x: pick(self.min_x, other.min_x, f64::max),
            min_y: pick(self.min_y, other.min_y, f64::max),
            max_x: pick(self.max_x, other.max_x, f64::min),
            max_y: pick(self.max_y, other.max_y, f64::min),
        }
    }

    /// Inclusive containment test. Unconstrained sides always pass.
    pub fn contains(self, p: Point) -> bool {
        self.min_x.is_none_or(|v| p.x >= v)
            && self.max_x.is_none_or(|v| p.x <= v)
            && self.min_y.is_none_or(|v| p.y >= v)
            && self.max_y.is_none_or(|v| p.y <= v)
    }

    /// `true` when all four sides are constrained.
    pub fn is_bounded(self) -> bool {
        self.min_x.is_some() && self.min_y.is_some() && self.max_x.is_some() && self.max_y.is_some()
    }

    /// `true` when no side is constrained.
    pub fn is_unbounded(self) -> bool {
        self == Self::UNBOUNDED
    }

    /// Replace unconstrained sides with the matching side of `frame`.
    pub fn resolve(self, frame: Rect) -> Rect {
        Rect::new(
            self.min_x.unwrap_or(frame.x0),
            self.min_y.unwrap_or(frame.y0),
            self.max_x.unwrap_or(frame.x1),
            self.max_y.unwrap_or(frame.y1),
        )
    }

    /// Encode as a 4-element attribute vector, `null` for unconstrained sides.
    pub fn to_value(self) -> Value {
        let side = |v: Option<f64>| v.map_or(Value::Null, Value::Number);
        Value::List(vec![
            side(self.min_x),
            side(self.min_y),
            side(self.max_x),
            side(self.max_y),
        ])
    }

    /// Decode from an attribute value. `null` decodes to [`ClipRect::UNBOUNDED`].
    pub fn from_value(value: &Value) -> ShapeResult<Self> {
        match value {
            Value::Null => Ok(Self::UNBOUNDED),
            Value::List(items) if items.len() == 4 => {
                let side = |v: &Value| -> ShapeResult<Option<f64>> {
                    match v {
                        Value::Null => Ok(None),
                        other => other.as_f64().map(Some),
                    }
                };
                Ok(Self {
                    min_x: side(&items[0])?,
                    min_y: side(&items[1])?,
                    max_x: side(&items[2])?,
                    max_y: side(&items[3])?,
                })
            }
            other => Err(ShapeError::evaluation(format!(
                "clip rectangle must be null or [min_x, min_y, max_x, max_y], got {other}"
            ))),
        }
    }
}

/// Straight-alpha color with channels in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rgba {
    /// Red.
    pub r: f64,
    /// Green.
    pub g: f64,
    /// Blue.
    pub b: f64,
    /// Alpha.
    pub a: f64,
}

impl Rgba {
    /// Build from an `[r, g, b]` attribute and a separate alpha.
    pub fn from_value(value: &Value, alpha: f64) -> ShapeResult<Self> {
        let rgb = value.as_numbers()?;
        let [r, g, b] = rgb[..] else {
            return Err(ShapeError::evaluation(format!(
                "color must have 3 components, got {}",
                rgb.len()
            )));
        };
        Ok(Self {
            r,
            g,
            b,
            a: alpha,
        })
    }

    /// Quantize to straight RGBA8.
    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
