use crate::eval::mix::DefaultTable;
use crate::foundation::error::ShapeResult;
use crate::render::backend::{DrawCall, Geometry, Paint, Renderer};
use crate::scene::primitive::{Collision, DrawInputs, Primitive};
use crate::scene::shapes::{Placement, base_defaults};

/// Quad filled by a procedural program evaluated by the backend.
#[derive(Debug)]
pub struct SurfaceShape {
    defaults: DefaultTable,
}

impl SurfaceShape {
    pub fn new() -> Self {
        Self {
            defaults: base_defaults()
                .with("program", "mandelbrot", "procedural fill program")
                .with("iterations", 100.0, "iteration budget of the program")
                .with("zoom", 1.0, "magnification of the program's plane")
                .with("center_x", 0.0, "plane x at the center of the view")
                .with("center_y", 0.0, "plane y at the center of the view"),
        }
    }
}

impl Default for SurfaceShape {
    fn default() -> Self {
        Self::new()
    }
}

impl Primitive for SurfaceShape {
    fn kind(&self) -> &str {
        "surface"
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

        let program = attrs.require("program")?.as_str()?.to_string();
        let iterations = attrs.number("iterations")?.round().clamp(0.0, f64::from(u32::MAX));
        let viewport = inputs.ctx.viewport;

        renderer.draw(&DrawCall {
            node: inputs.node,
            transform: place.transform(1.0),
            clip: inputs.clip,
            aspect: inputs.ctx.aspect,
            geometry: Geometry::Quad,
            paint: Paint::Program {
                name: program,
                iterations: iterations as u32,
                screen: [viewport.width, viewport.height],
                params: [
                    attrs.number("zoom")?,
                    attrs.number("center_x")?,
                    attrs.number("center_y")?,
                ],
                alpha: attrs.number("alpha")?,
            },
        })?;

        Ok(Collision::Rect(place.bounds()))
    }
}
