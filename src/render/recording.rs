use crate::foundation::core::{Affine, ClipRect, Point, Rgba};
use crate::foundation::error::ShapeResult;
use crate::render::backend::{DrawCall, Geometry, Paint, Renderer};

/// Owned copy of [`Geometry`], with fan buffers trimmed to the live triangles.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedGeometry {
    Quad,
    Outline { inset_x: f64, inset_y: f64 },
    TriangleFan {
        vertices: Vec<Point>,
        indices: Vec<[u32; 3]>,
    },
}

impl From<Geometry<'_>> for RecordedGeometry {
    fn from(g: Geometry<'_>) -> Self {
        match g {
            Geometry::Quad => Self::Quad,
            Geometry::Outline { inset_x, inset_y } => Self::Outline { inset_x, inset_y },
            Geometry::TriangleFan {
                vertices,
                indices,
                triangles,
            } => {
                let indices: Vec<[u32; 3]> = indices
                    .chunks_exact(3)
                    .take(triangles)
                    .map(|t| [t[0], t[1], t[2]])
                    .collect();
                let used = indices
                    .iter()
                    .flatten()
                    .map(|&i| i as usize + 1)
                    .max()
                    .unwrap_or(0);
                Self::TriangleFan {
                    vertices: vertices[..used.min(vertices.len())].to_vec(),
                    indices,
                }
            }
        }
    }
}

/// One captured draw call.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawRecord {
    pub node: String,
    pub transform: Affine,
    pub clip: ClipRect,
    pub aspect: f64,
    pub geometry: RecordedGeometry,
    pub paint: Paint,
}

/// Renderer that keeps every draw call for later inspection.
#[derive(Clone, Debug, Default)]
pub struct RecordingRenderer {
    pub background: Option<Rgba>,
    pub records: Vec<DrawRecord>,
    pub frames: usize,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Node names in draw order.
    pub fn order(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.node.as_str()).collect()
    }

    pub fn find(&self, node: &str) -> Option<&DrawRecord> {
        self.records.iter().find(|r| r.node == node)
    }
}

impl Renderer for RecordingRenderer {
    fn begin_frame(&mut self, background: Rgba) -> ShapeResult<()> {
        self.background = Some(background);
        self.records.clear();
        Ok(())
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> ShapeResult<()> {
        self.records.push(DrawRecord {
            node: call.node.to_string(),
            transform: call.transform,
            clip: call.clip,
            aspect: call.aspect,
            geometry: call.geometry.into(),
            paint: call.paint.clone(),
        });
        Ok(())
    }

    fn end_frame(&mut self) -> ShapeResult<()> {
        self.frames += 1;
        Ok(())
    }
}
