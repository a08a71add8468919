use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::eval::context::{EvalContext, SharedData};
use crate::eval::diagnostics::Diagnostics;
use crate::eval::mix::{Attributes, DefaultTable, MixPolicy};
use crate::expression::expr::AttributeSet;
use crate::expression::opcodes::OpcodeTable;
use crate::expression::vm::EvalEnv;
use crate::foundation::core::{Point, Rgba};
use crate::foundation::error::{ShapeError, ShapeResult};
use crate::render::backend::Renderer;
use crate::scene::document::SceneDocument;
use crate::scene::hit_test::{self, Selection};
use crate::scene::node::SceneNode;
use crate::scene::primitive::{DrawableNode, PrimitiveRegistry};

/// Everything a node needs to evaluate and mix during one render pass.
#[derive(Clone, Copy)]
pub struct RenderPass<'a> {
    pub env: EvalEnv<'a>,
    pub mix: &'a MixPolicy,
}

/// Tables and limits assembled once at load from the built-ins and the document.
#[derive(Clone, Debug)]
pub struct GraphConfig {
    pub opcodes: OpcodeTable,
    pub mix: MixPolicy,
    pub max_draw_depth: i32,
    pub root: String,
    pub background: Rgba,
    pub frame_rate: f64,
}

impl GraphConfig {
    /// Number of frames covering `seconds` at the document's frame rate, rounded.
    pub fn frames_for(&self, seconds: f64) -> i64 {
        (seconds * self.frame_rate).round().max(0.0) as i64
    }
}

/// All nodes of a graph, by name.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    pub scenes: BTreeMap<String, SceneNode>,
    pub drawables: BTreeMap<String, DrawableNode>,
}

/// One row of [`SceneGraph::inspect`].
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct AttributeReport {
    pub name: String,
    /// The node's own expression, if it sets one.
    pub expression: Option<serde_json::Value>,
    /// Fallback from the kind's default table; `None` for names the kind ignores.
    pub fallback: Option<serde_json::Value>,
    pub description: String,
}

/// Attribute listing for one node.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct NodeReport {
    pub name: String,
    /// `"scene"` or the drawable kind.
    pub kind: String,
    pub attributes: Vec<AttributeReport>,
}

/// A loaded scene graph with a designated root.
#[derive(Debug)]
pub struct SceneGraph {
    config: GraphConfig,
    shared: SharedData,
    nodes: NodeRegistry,
}

impl SceneGraph {
    /// Build a graph from a parsed document.
    #[tracing::instrument(skip_all)]
    pub fn load(document: &serde_json::Value, kinds: &PrimitiveRegistry) -> ShapeResult<Self> {
        let doc = SceneDocument::from_json(document)?;
        Self::from_document(doc, kinds)
    }

    pub fn from_json_str(text: &str, kinds: &PrimitiveRegistry) -> ShapeResult<Self> {
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| ShapeError::document(format!("invalid JSON: {e}")))?;
        Self::load(&value, kinds)
    }

    pub fn from_path(path: impl AsRef<Path>, kinds: &PrimitiveRegistry) -> ShapeResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ShapeError::document(format!("read '{}': {e}", path.display())))?;
        Self::from_json_str(&text, kinds).map_err(|e| e.at(path.display()))
    }

    pub fn from_document(doc: SceneDocument, kinds: &PrimitiveRegistry) -> ShapeResult<Self> {
        let mut opcodes = OpcodeTable::builtin();
        for (alias, target) in &doc.maps.opcodes {
            opcodes.alias(alias.as_str(), target)?;
        }
        let mut mix = MixPolicy::builtin();
        mix.merge(&doc.maps.mix);
        let mut kinds = kinds.clone();
        for (alias, target) in &doc.maps.kinds {
            kinds.alias(alias.as_str(), target)?;
        }

        let mut nodes = NodeRegistry::default();
        for (name, obj) in &doc.graph.objects {
            let at = |e: ShapeError| e.at(format!("object '{name}'"));
            let primitive = kinds.create(&obj.kind).map_err(at)?;
            let attrs = AttributeSet::from_json_map(&obj.attrs).map_err(at)?;
            nodes
                .drawables
                .insert(name.clone(), DrawableNode::new(name.as_str(), attrs, primitive));
        }
        for (name, def) in &doc.graph.scenes {
            let attrs = AttributeSet::from_json_map(&def.attrs)
                .map_err(|e| e.at(format!("scene '{name}'")))?;
            nodes.scenes.insert(
                name.clone(),
                SceneNode::new(name.as_str(), def.scenes.clone(), def.objects.clone(), attrs),
            );
        }

        let setup = &doc.setup;
        if !nodes.scenes.contains_key(&setup.root) {
            return Err(ShapeError::document(format!(
                "root scene '{}' is not defined",
                setup.root
            )));
        }
        if setup.reject_cycles {
            reject_cycles(&nodes)?;
        }

        if !(setup.frame_rate.is_finite() && setup.frame_rate > 0.0) {
            return Err(ShapeError::document(format!(
                "frame_rate must be a positive number, got {}",
                setup.frame_rate
            )));
        }

        let [r, g, b] = setup.background_color;
        let config = GraphConfig {
            opcodes,
            mix,
            max_draw_depth: setup.max_draw_depth,
            root: setup.root.clone(),
            background: Rgba { r, g, b, a: 1.0 },
            frame_rate: setup.frame_rate,
        };

        tracing::info!(
            scenes = nodes.scenes.len(),
            objects = nodes.drawables.len(),
            root = %config.root,
            "scene graph loaded"
        );
        Ok(Self {
            config,
            shared: doc.shared_data,
            nodes,
        })
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Mutable access to the opcode table, e.g. to add host-specific instructions.
    pub fn opcodes_mut(&mut self) -> &mut OpcodeTable {
        &mut self.config.opcodes
    }

    pub fn shared(&self) -> &SharedData {
        &self.shared
    }

    pub fn nodes(&self) -> &NodeRegistry {
        &self.nodes
    }

    pub fn scene(&self, name: &str) -> Option<&SceneNode> {
        self.nodes.scenes.get(name)
    }

    pub fn drawable(&self, name: &str) -> Option<&DrawableNode> {
        self.nodes.drawables.get(name)
    }

    /// Render one frame from the root scene.
    #[tracing::instrument(skip_all, fields(frame = ctx.frame))]
    pub fn render(
        &self,
        ctx: &EvalContext,
        renderer: &mut dyn Renderer,
        diagnostics: &dyn Diagnostics,
    ) -> ShapeResult<()> {
        let root = self
            .nodes
            .scenes
            .get(&self.config.root)
            .ok_or_else(|| {
                ShapeError::render(format!("root scene '{}' missing", self.config.root))
            })?;
        let pass = RenderPass {
            env: EvalEnv {
                ctx,
                shared: &self.shared,
                opcodes: &self.config.opcodes,
                diagnostics,
            },
            mix: &self.config.mix,
        };

        renderer.begin_frame(self.config.background)?;
        root.render(
            &pass,
            &self.nodes,
            self.config.max_draw_depth,
            &Attributes::new(),
            renderer,
        )?;
        renderer.end_frame()
    }

    /// Name of the topmost node under `point` in the last rendered frame.
    pub fn hit_test(&self, point: Point) -> Option<String> {
        hit_test::resolve(
            point,
            &self.config.root,
            &self.nodes,
            self.config.max_draw_depth,
        )
    }

    /// Hit test and toggle the result in `selection`.
    pub fn pick(&self, point: Point, selection: &mut Selection) -> Option<String> {
        let name = self.hit_test(point)?;
        selection.toggle(&name);
        Some(name)
    }

    /// Attribute listing for every node, scenes first.
    pub fn inspect(&self) -> Vec<NodeReport> {
        let scenes = self.nodes.scenes.values().map(|s| NodeReport {
            name: s.name().to_string(),
            kind: "scene".to_string(),
            attributes: report(s.attributes(), SceneNode::defaults()),
        });
        let drawables = self.nodes.drawables.values().map(|d| NodeReport {
            name: d.name().to_string(),
            kind: d.kind().to_string(),
            attributes: report(d.attributes(), &d.defaults()),
        });
        scenes.chain(drawables).collect()
    }
}

fn report(own: &AttributeSet, defaults: &DefaultTable) -> Vec<AttributeReport> {
    let mut rows: Vec<AttributeReport> = defaults
        .iter()
        .map(|(name, entry)| AttributeReport {
            name: name.to_string(),
            expression: own.get(name).map(|e| e.to_json()),
            fallback: Some(entry.fallback.to_json()),
            description: entry.description.clone(),
        })
        .collect();
    rows.extend(
        own.iter()
            .filter(|(name, _)| defaults.get(name).is_none())
            .map(|(name, expr)| AttributeReport {
                name: name.to_string(),
                expression: Some(expr.to_json()),
                fallback: None,
                description: "not recognised by this kind, ignored".to_string(),
            }),
    );
    rows
}

// Depth-first search over scene → child scene edges; missing children are ignored.
fn reject_cycles(nodes: &NodeRegistry) -> ShapeResult<()> {
    fn visit<'a>(
        name: &'a str,
        nodes: &'a NodeRegistry,
        on_path: &mut Vec<&'a str>,
        done: &mut BTreeSet<&'a str>,
    ) -> ShapeResult<()> {
        if done.contains(name) {
            return Ok(());
        }
        if let Some(i) = on_path.iter().position(|n| *n == name) {
            let mut cycle = on_path[i..].to_vec();
            cycle.push(name);
            return Err(ShapeError::document(format!(
                "scene cycle: {}",
                cycle.join(" -> ")
            )));
        }
        let Some(scene) = nodes.scenes.get(name) else {
            return Ok(());
        };
        on_path.push(name);
        for child in scene.child_scenes() {
            visit(child, nodes, on_path, done)?;
        }
        on_path.pop();
        done.insert(name);
        Ok(())
    }

    let mut done = BTreeSet::new();
    for name in nodes.scenes.keys() {
        visit(name, nodes, &mut Vec::new(), &mut done)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/scene/graph.rs"]
mod tests;
