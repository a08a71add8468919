use crate::eval::mix::DefaultTable;
use crate::expression::value::Value;
use crate::foundation::core::{Affine, Rect};
use crate::foundation::error::ShapeResult;
use crate::scene::primitive::DrawInputs;

pub(crate) mod polygon;
pub(crate) mod rect;
pub(crate) mod surface;

/// Attributes every built-in drawable understands.
pub(crate) fn base_defaults() -> DefaultTable {
    DefaultTable::new()
        .with("size_x", 0.5, "horizontal scale factor")
        .with("size_y", 0.5, "vertical scale factor")
        .with("pos_x", 0.0, "offset from center along x")
        .with("pos_y", 0.0, "offset from center along y")
        .with("color", vec![1.0, 0.0, 1.0], "primary color of shape")
        .with("alpha", 1.0, "opacity, multiplied down the tree")
        .with("visible", true, "draw and pick this shape")
        .with("clip_rect", Value::Null, "inherited clip rectangle")
}

/// Position and half extents shared by quad-based shapes.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Placement {
    pub pos_x: f64,
    pub pos_y: f64,
    pub size_x: f64,
    pub size_y: f64,
}

impl Placement {
    pub fn read(inputs: &DrawInputs<'_>) -> ShapeResult<Self> {
        let a = inputs.attrs;
        Ok(Self {
            pos_x: a.number("pos_x")?,
            pos_y: a.number("pos_y")?,
            size_x: a.number("size_x")?,
            size_y: a.number("size_y")?,
        })
    }

    /// Unit-quad → device transform with an extra horizontal factor.
    pub fn transform(self, x_factor: f64) -> Affine {
        Affine::translate((self.pos_x, self.pos_y))
            * Affine::scale_non_uniform(self.size_x * x_factor, self.size_y)
    }

    /// `pos ± size`.
    pub fn bounds(self) -> Rect {
        Rect::new(
            self.pos_x - self.size_x.abs(),
            self.pos_y - self.size_y.abs(),
            self.pos_x + self.size_x.abs(),
            self.pos_y + self.size_y.abs(),
        )
    }
}
