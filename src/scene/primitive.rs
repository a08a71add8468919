use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use kurbo::Shape;

use crate::eval::context::EvalContext;
use crate::eval::mix::{Attributes, DefaultTable, mix};
use crate::expression::expr::AttributeSet;
use crate::expression::value::Value;
use crate::expression::vm::evaluate;
use crate::foundation::core::{Affine, BezPath, ClipRect, Point, Rect};
use crate::foundation::error::{ShapeError, ShapeResult};
use crate::render::backend::Renderer;
use crate::scene::graph::RenderPass;
use crate::scene::shapes::{polygon, rect, surface};

/// Inputs handed to a primitive for one draw.
pub struct DrawInputs<'a> {
    pub node: &'a str,
    /// Attributes after evaluation and mixing.
    pub attrs: &'a Attributes,
    pub ctx: &'a EvalContext,
    pub clip: ClipRect,
}

/// Shape-specific behavior of a drawable node.
///
/// Implementations own their geometry buffers and may reuse them between frames.
pub trait Primitive: fmt::Debug {
    fn kind(&self) -> &str;

    /// Attributes this kind recognises, with fallbacks. Only these names survive mixing.
    fn defaults(&self) -> &DefaultTable;

    /// Issue draw calls and return the collision shape for hit testing.
    fn draw(
        &mut self,
        inputs: &DrawInputs<'_>,
        renderer: &mut dyn Renderer,
    ) -> ShapeResult<Collision>;
}

/// Pickable area of a drawn primitive, in normalized device coordinates.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Collision {
    #[default]
    None,
    Rect(Rect),
    /// Closed ring in local space plus the local → device transform it was drawn with.
    Polygon { ring: Vec<Point>, transform: Affine },
}

impl Collision {
    pub fn contains(&self, p: Point) -> bool {
        match self {
            Self::None => false,
            Self::Rect(r) => p.x >= r.x0 && p.x <= r.x1 && p.y >= r.y0 && p.y <= r.y1,
            Self::Polygon { ring, transform } => {
                if ring.len() < 3 || transform.determinant().abs() < f64::EPSILON {
                    return false;
                }
                let local = transform.inverse() * p;
                let mut path = BezPath::new();
                path.move_to(ring[0]);
                for &q in &ring[1..] {
                    path.line_to(q);
                }
                path.close_path();
                path.contains(local)
            }
        }
    }
}

/// Value tagged with the frame that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameSnapshot<T> {
    pub frame: i64,
    pub data: T,
}

/// What a drawable recorded during its last draw.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawSnapshot {
    pub clip: ClipRect,
    pub collision: Collision,
}

/// Leaf node of the graph.
#[derive(Debug)]
pub struct DrawableNode {
    name: String,
    kind: String,
    attributes: AttributeSet,
    primitive: RefCell<Box<dyn Primitive>>,
    snapshot: RefCell<Option<FrameSnapshot<DrawSnapshot>>>,
}

impl DrawableNode {
    pub fn new(
        name: impl Into<String>,
        attributes: AttributeSet,
        primitive: Box<dyn Primitive>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: primitive.kind().to_string(),
            attributes,
            primitive: RefCell::new(primitive),
            snapshot: RefCell::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    pub fn defaults(&self) -> DefaultTable {
        self.primitive.borrow().defaults().clone()
    }

    /// Evaluate, mix, draw, and refresh the collision snapshot.
    pub fn render(
        &self,
        pass: &RenderPass<'_>,
        inherited: &Attributes,
        renderer: &mut dyn Renderer,
    ) -> ShapeResult<()> {
        let at = |e: ShapeError| e.at(format!("drawable '{}'", self.name));

        let own = evaluate(&self.attributes, &pass.env).map_err(at)?;
        let mut primitive = self.primitive.borrow_mut();
        let mixed = mix(&own, inherited, primitive.defaults(), pass.mix).map_err(at)?;

        let visible = match mixed.get("visible") {
            Some(v) => v.as_bool().map_err(at)?,
            None => true,
        };
        if !visible {
            self.snapshot.replace(None);
            return Ok(());
        }

        let clip =
            ClipRect::from_value(mixed.get("clip_rect").unwrap_or(&Value::Null)).map_err(at)?;
        let collision = primitive
            .draw(
                &DrawInputs {
                    node: &self.name,
                    attrs: &mixed,
                    ctx: pass.env.ctx,
                    clip,
                },
                renderer,
            )
            .map_err(at)?;

        self.snapshot.replace(Some(FrameSnapshot {
            frame: pass.env.ctx.frame,
            data: DrawSnapshot { clip, collision },
        }));
        Ok(())
    }

    /// `true` when `p` falls inside both the clip and the shape of the last draw.
    pub fn hit(&self, p: Point) -> bool {
        self.snapshot
            .borrow()
            .as_ref()
            .is_some_and(|s| s.data.clip.contains(p) && s.data.collision.contains(p))
    }

    pub fn snapshot(&self) -> Option<FrameSnapshot<DrawSnapshot>> {
        self.snapshot.borrow().clone()
    }
}

type Constructor = Arc<dyn Fn() -> Box<dyn Primitive> + Send + Sync>;

/// Kind name → primitive constructor.
#[derive(Clone)]
pub struct PrimitiveRegistry {
    kinds: BTreeMap<String, Constructor>,
}

impl fmt::Debug for PrimitiveRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimitiveRegistry")
            .field("kinds", &self.kinds.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for PrimitiveRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PrimitiveRegistry {
    pub fn empty() -> Self {
        Self {
            kinds: BTreeMap::new(),
        }
    }

    pub fn builtin() -> Self {
        let mut r = Self::empty();
        r.register("rect", || Box::new(rect::RectShape::new()));
        r.register("regpoly", || Box::new(polygon::RegularPolygon::regpoly()));
        r.register("circle", || Box::new(polygon::RegularPolygon::circle()));
        r.register("surface", || Box::new(surface::SurfaceShape::new()));
        r
    }

    pub fn register(
        &mut self,
        kind: impl Into<String>,
        ctor: impl Fn() -> Box<dyn Primitive> + Send + Sync + 'static,
    ) {
        self.kinds.insert(kind.into(), Arc::new(ctor));
    }

    /// Make `alias` construct the same primitive as `target`.
    pub fn alias(&mut self, alias: impl Into<String>, target: &str) -> ShapeResult<()> {
        let ctor = self
            .kinds
            .get(target)
            .cloned()
            .ok_or_else(|| ShapeError::document(format!("unknown kind '{target}' in alias")))?;
        self.kinds.insert(alias.into(), ctor);
        Ok(())
    }

    pub fn create(&self, kind: &str) -> ShapeResult<Box<dyn Primitive>> {
        self.kinds
            .get(kind)
            .map(|ctor| ctor())
            .ok_or_else(|| ShapeError::document(format!("unknown object type '{kind}'")))
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/primitive.rs"]
mod tests;
