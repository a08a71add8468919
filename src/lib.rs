//! Parametric scene graph.
//!
//! Nodes carry attribute programs written in a small postfix language. Each frame the graph is
//! walked from its root: programs are evaluated, mixed with what the parent passed down, and
//! drawable leaves submit draw calls to a [`Renderer`]. The last frame's geometry is cached so
//! points can be resolved back to node names.
#![forbid(unsafe_code)]

mod foundation;

pub(crate) mod eval;
pub(crate) mod expression;
/// Renderers.
pub mod render;
/// Scene graph.
pub mod scene;

pub use crate::eval::context::{EvalContext, Pointer, SharedData, Viewport};
pub use crate::eval::diagnostics::{CapturedDiagnostics, Diagnostics, TracingDiagnostics};
pub use crate::eval::mix::{Attributes, DefaultEntry, DefaultTable, MixMode, MixPolicy, mix};
pub use crate::expression::expr::{AttributeSet, Expression};
pub use crate::expression::opcodes::{OpArgs, Opcode, OpcodeTable};
pub use crate::expression::value::Value;
pub use crate::expression::vm::{EvalEnv, eval_expression, evaluate};
pub use crate::foundation::core::{Affine, BezPath, ClipRect, Point, Rect, Rgba, Vec2};
pub use crate::foundation::error::{ShapeError, ShapeResult};

pub use crate::render::backend::{DrawCall, FrameRGBA, Geometry, Paint, Renderer};
pub use crate::render::cpu::{CpuRenderer, CpuRendererOpts};
pub use crate::render::recording::{DrawRecord, RecordedGeometry, RecordingRenderer};
pub use crate::scene::graph::{GraphConfig, NodeReport, SceneGraph};
pub use crate::scene::hit_test::Selection;
pub use crate::scene::primitive::{Collision, DrawInputs, Primitive, PrimitiveRegistry};
