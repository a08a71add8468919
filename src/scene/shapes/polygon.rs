use std::f64::consts::TAU;

use crate::eval::mix::DefaultTable;
use crate::foundation::core::{Point, Rgba};
use crate::foundation::error::{ShapeError, ShapeResult};
use crate::render::backend::{DrawCall, Geometry, Paint, Renderer};
use crate::scene::primitive::{Collision, DrawInputs, Primitive};
use crate::scene::shapes::{Placement, base_defaults};

/// Radius of the vertex ring in local units.
pub const RING_RADIUS: f64 = 0.8;

const DEFAULT_MAX_FACES: f64 = 64.0;

/// Upper bound on `max_faces`; buffers are sized from it.
pub const FACE_LIMIT: f64 = 4096.0;

/// Regular polygon drawn as a triangle fan around a center vertex.
///
/// Vertex and index buffers keep the size implied by `max_faces` so a changing face count never
/// reallocates; only the first `faces` triangles are live.
#[derive(Debug)]
pub struct RegularPolygon {
    kind: &'static str,
    defaults: DefaultTable,
    vertices: Vec<Point>,
    indices: Vec<u32>,
}

impl RegularPolygon {
    pub fn regpoly() -> Self {
        Self::with_kind("regpoly", 4.0)
    }

    /// A polygon whose face count defaults to its maximum.
    pub fn circle() -> Self {
        Self::with_kind("circle", DEFAULT_MAX_FACES)
    }

    fn with_kind(kind: &'static str, faces: f64) -> Self {
        Self {
            kind,
            defaults: base_defaults()
                .with("faces", faces, "number of sides on polygon")
                .with(
                    "max_faces",
                    DEFAULT_MAX_FACES,
                    "largest number of faces the shape can have",
                ),
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    // Rebuild the buffers for `faces` live faces within a `max_faces` budget.
    fn fill_buffers(&mut self, faces: usize, max_faces: usize) -> Vec<Point> {
        let ring = distribute(RING_RADIUS, RING_RADIUS, faces);

        self.vertices.clear();
        self.vertices.push(Point::ZERO);
        self.vertices.extend_from_slice(&ring);
        self.vertices.resize(max_faces + 1, Point::ZERO);

        self.indices.clear();
        self.indices.extend(fan_indices(ring.len()));
        self.indices.resize(max_faces * 3, 0);

        ring
    }
}

impl Primitive for RegularPolygon {
    fn kind(&self) -> &str {
        self.kind
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
        let max_faces = attrs.number("max_faces")?;
        if !(0.0..=FACE_LIMIT).contains(&max_faces) {
            return Err(ShapeError::evaluation(format!(
                "max_faces must be within [0, {FACE_LIMIT}], got {max_faces}"
            )));
        }
        let max_faces = max_faces.round() as usize;
        let faces = face_count(attrs.number("faces")?, max_faces);

        let ring = self.fill_buffers(faces, max_faces);
        if ring.is_empty() {
            return Ok(Collision::None);
        }

        let color = Rgba::from_value(attrs.require("color")?, attrs.number("alpha")?)?;
        let transform = place.transform(inputs.ctx.aspect);
        renderer.draw(&DrawCall {
            node: inputs.node,
            transform,
            clip: inputs.clip,
            aspect: inputs.ctx.aspect,
            geometry: Geometry::TriangleFan {
                vertices: &self.vertices,
                indices: &self.indices,
                triangles: ring.len(),
            },
            paint: Paint::Solid(color),
        })?;

        Ok(Collision::Polygon { ring, transform })
    }
}

/// `min(max(3, round(faces)), max_faces)`.
pub fn face_count(faces: f64, max_faces: usize) -> usize {
    let rounded = if faces.is_finite() { faces.round().max(3.0) } else { 3.0 };
    (rounded as usize).min(max_faces)
}

/// `num` points at equal angular steps on the ellipse with radii `a`, `b`, starting on the
/// positive x axis and turning counter-clockwise.
pub fn distribute(a: f64, b: f64, num: usize) -> Vec<Point> {
    if a == 0.0 || b == 0.0 || num == 0 {
        return Vec::new();
    }
    let step = TAU / num as f64;
    (0..num)
        .map(|i| {
            let (sin, cos) = (step * i as f64).sin_cos();
            let r = a * b / ((b * cos).powi(2) + (a * sin).powi(2)).sqrt();
            Point::new(r * cos, r * sin)
        })
        .collect()
}

/// Fan triangles `[0, i + 1, i + 2]`, the last one closing back on vertex 1.
pub fn fan_indices(num: usize) -> Vec<u32> {
    let mut out: Vec<u32> = (0..num as u32).flat_map(|i| [0, i + 1, i + 2]).collect();
    if let Some(last) = out.last_mut() {
        *last = 1;
    }
    out
}

#[cfg(test)]
#[path = "../../../tests/unit/scene/polygon.rs"]
mod tests;
