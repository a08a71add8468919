use crate::eval::mix::DefaultTable;
use crate::foundation::core::Rgba;
use crate::foundation::error::ShapeResult;
use crate::render::backend::{DrawCall, Geometry, Paint, Renderer};
use crate::scene::primitive::{Collision, DrawInputs, Primitive};
use crate::scene::shapes::{Placement, base_defaults};

/// Axis-aligned rectangle: the unit quad `[-1, 1]²` scaled by `size_x`/`size_y`.
#[derive(Debug)]
pub struct RectShape {
    defaults: DefaultTable,
}

impl RectShape {
    pub fn new() -> Self {
        Self {
            defaults: base_defaults().with(
                "line_weight",
                0.0,
                "outline thickness, 0 draws a filled shape",
            ),
        }
    }
}

impl Default for RectShape {
    fn default() -> Self {
        Self::new()
    }
}

impl Primitive for RectShape {
    fn kind(&self) -> &str {
        "rect"
    }

    fn defaults(&self) -> &DefaultTable {
        &self.defaults
    }

    fn draw(
        &mut self,
        inputs: &DrawInputs<'_>,
        renderer: &mut dyn Renderer,
    ) -> ShapeResult<Collision> {
        let place = Placement::read(inputs)?;
        let attrs = inputs.attrs;
        let color = Rgba::from_value(attrs.require("color")?, attrs.number("alpha")?)?;
        let line_weight = attrs.number("line_weight")?;

        let geometry = if line_weight > 0.0 {
            Geometry::Outline {
                inset_x: inset(line_weight, place.size_x),
                inset_y: inset(line_weight, place.size_y),
            }
        } else {
            Geometry::Quad
        };

        renderer.draw(&DrawCall {
            node: inputs.node,
            transform: place.transform(1.0),
            clip: inputs.clip,
            aspect: inputs.ctx.aspect,
            geometry,
            paint: Paint::Solid(color),
        })?;

        Ok(Collision::Rect(place.bounds()))
    }
}

// Device-space thickness → local units of the unit quad.
fn inset(weight: f64, size: f64) -> f64 {
    if size == 0.0 {
        1.0
    } else {
        (weight / size.abs()).min(1.0)
    }
}
