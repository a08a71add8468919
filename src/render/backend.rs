use crate::foundation::core::{Affine, ClipRect, Point, Rgba};
use crate::foundation::error::ShapeResult;

/// A rendered frame as RGBA8 pixels.
///
/// Frames produced by the CPU renderer are premultiplied alpha; the `premultiplied` flag makes
/// this explicit at API boundaries.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

/// Shape of a draw call in the node's local space, before `DrawCall::transform`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Geometry<'a> {
    /// Filled unit quad `[-1, 1]²`.
    Quad,
    /// Unit quad outline. Insets are the border thickness in local units per axis.
    Outline { inset_x: f64, inset_y: f64 },
    /// Indexed triangle list sharing vertex 0. Only the first `triangles` index triples are live;
    /// the remaining buffer is padding.
    TriangleFan {
        vertices: &'a [Point],
        indices: &'a [u32],
        triangles: usize,
    },
}

/// How a draw call is filled.
#[derive(Clone, Debug, PartialEq)]
pub enum Paint {
    Solid(Rgba),
    /// A procedural fill evaluated per pixel by the backend.
    Program {
        name: String,
        iterations: u32,
        /// Viewport size in pixels.
        screen: [u32; 2],
        /// `zoom`, `center_x`, `center_y`.
        params: [f64; 3],
        alpha: f64,
    },
}

/// One primitive submission.
#[derive(Clone, Debug)]
pub struct DrawCall<'a> {
    /// Name of the drawable node that issued the call.
    pub node: &'a str,
    /// Local → normalized device coordinates.
    pub transform: Affine,
    /// Clip in normalized device coordinates.
    pub clip: ClipRect,
    pub aspect: f64,
    pub geometry: Geometry<'a>,
    pub paint: Paint,
}

/// Draw-call sink consumed by the scene graph.
///
/// Calls arrive in paint order: later calls draw over earlier ones.
pub trait Renderer {
    /// Called once before the root scene is walked.
    fn begin_frame(&mut self, _background: Rgba) -> ShapeResult<()> {
        Ok(())
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> ShapeResult<()>;

    /// Called once after the walk completes.
    fn end_frame(&mut self) -> ShapeResult<()> {
        Ok(())
    }
}

impl<R: Renderer + ?Sized> Renderer for &mut R {
    fn begin_frame(&mut self, background: Rgba) -> ShapeResult<()> {
        (**self).begin_frame(background)
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> ShapeResult<()> {
        (**self).draw(call)
    }

    fn end_frame(&mut self) -> ShapeResult<()> {
        (**self).end_frame()
    }
}
