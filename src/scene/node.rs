use std::cell::RefCell;
use std::sync::LazyLock;

use crate::eval::mix::{Attributes, DefaultTable, mix};
use crate::expression::expr::AttributeSet;
use crate::expression::value::Value;
use crate::expression::vm::evaluate;
use crate::foundation::core::{ClipRect, Point};
use crate::foundation::error::{ShapeError, ShapeResult};
use crate::render::backend::Renderer;
use crate::scene::graph::{NodeRegistry, RenderPass};
use crate::scene::primitive::FrameSnapshot;

static SCENE_DEFAULTS: LazyLock<DefaultTable> = LazyLock::new(|| {
    DefaultTable::new()
        .with("size_x", 0.5, "horizontal scale factor")
        .with("size_y", 0.5, "vertical scale factor")
        .with("pos_x", 0.0, "offset from center along x")
        .with("pos_y", 0.0, "offset from center along y")
        .with(
            "clip_size_x",
            Value::Null,
            "clip half width as a multiple of size_x, null leaves x open",
        )
        .with(
            "clip_size_y",
            Value::Null,
            "clip half height as a multiple of size_y, null leaves y open",
        )
        .with("clip_rect", Value::Null, "clip rectangle inherited from the parent")
        .with("alpha", 1.0, "opacity, multiplied down the tree")
        .with("visible", true, "default visibility for children")
});

/// Clip and aspect cached by the last render of a scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneSnapshot {
    pub clip: ClipRect,
    pub aspect: f64,
}

/// Composite node: ordered child drawables, then ordered child scenes.
#[derive(Debug)]
pub struct SceneNode {
    name: String,
    scenes: Vec<String>,
    objects: Vec<String>,
    attributes: AttributeSet,
    snapshot: RefCell<Option<FrameSnapshot<SceneSnapshot>>>,
}

impl SceneNode {
    pub fn new(
        name: impl Into<String>,
        scenes: Vec<String>,
        objects: Vec<String>,
        attributes: AttributeSet,
    ) -> Self {
        Self {
            name: name.into(),
            scenes,
            objects,
            attributes,
            snapshot: RefCell::new(None),
        }
    }

    /// Attributes every scene recognises.
    pub fn defaults() -> &'static DefaultTable {
        &SCENE_DEFAULTS
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn child_scenes(&self) -> &[String] {
        &self.scenes
    }

    pub fn child_objects(&self) -> &[String] {
        &self.objects
    }

    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    pub fn snapshot(&self) -> Option<FrameSnapshot<SceneSnapshot>> {
        self.snapshot.borrow().clone()
    }

    /// Render this scene and, depth permitting, its descendants.
    ///
    /// A negative `depth` renders nothing. Child scenes receive `depth - 1` and the mixed
    /// attributes of this scene, including its resolved `clip_rect`.
    pub fn render(
        &self,
        pass: &RenderPass<'_>,
        nodes: &NodeRegistry,
        depth: i32,
        inherited: &Attributes,
        renderer: &mut dyn Renderer,
    ) -> ShapeResult<()> {
        if depth < 0 {
            tracing::debug!(scene = %self.name, "draw depth exhausted");
            return Ok(());
        }
        let at = |e: ShapeError| e.at(format!("scene '{}'", self.name));

        let own = evaluate(&self.attributes, &pass.env).map_err(at)?;
        let mut mixed = mix(&own, inherited, &SCENE_DEFAULTS, pass.mix).map_err(at)?;
        let clip = clip_for(&mixed).map_err(at)?;

        self.snapshot.replace(Some(FrameSnapshot {
            frame: pass.env.ctx.frame,
            data: SceneSnapshot {
                clip,
                aspect: pass.env.ctx.aspect,
            },
        }));
        mixed.insert("clip_rect", clip.to_value());

        for name in &self.objects {
            match nodes.drawables.get(name) {
                Some(drawable) => drawable.render(pass, &mixed, renderer)?,
                None => {
                    tracing::warn!(scene = %self.name, object = %name, "skipping missing object")
                }
            }
        }

        for name in &self.scenes {
            match nodes.scenes.get(name) {
                Some(child) => child.render(pass, nodes, depth - 1, &mixed, renderer)?,
                None => {
                    tracing::warn!(scene = %self.name, child = %name, "skipping missing scene")
                }
            }
        }
        Ok(())
    }
}

// Own rectangle around `pos`, intersected with whatever the parent passed down.
fn clip_for(mixed: &Attributes) -> ShapeResult<ClipRect> {
    let center = Point::new(mixed.number("pos_x")?, mixed.number("pos_y")?);
    let half_w = match mixed.optional_number("clip_size_x")? {
        Some(c) => Some((c * mixed.number("size_x")?).abs()),
        None => None,
    };
    let half_h = match mixed.optional_number("clip_size_y")? {
        Some(c) => Some((c * mixed.number("size_y")?).abs()),
        None => None,
    };

    let inherited = ClipRect::from_value(mixed.get("clip_rect").unwrap_or(&Value::Null))?;
    Ok(ClipRect::centered(center, half_w, half_h).intersect(inherited))
}

#[cfg(test)]
#[path = "../../tests/unit/scene/node.rs"]
mod tests;
