use super::*;
use crate::eval::context::SharedData;
use crate::eval::diagnostics::TracingDiagnostics;
use crate::eval::mix::MixPolicy;
use crate::expression::expr::Expression;
use crate::expression::opcodes::OpcodeTable;
use crate::expression::vm::EvalEnv;
use crate::render::backend::Paint;
use crate::render::recording::RecordingRenderer;

fn with_pass<R>(frame: i64, f: impl FnOnce(&RenderPass<'_>) -> R) -> R {
    let ctx = EvalContext::new(frame, 1.0);
    let shared = SharedData::default();
    let opcodes = OpcodeTable::builtin();
    let mix = MixPolicy::builtin();
    let pass = RenderPass {
        env: EvalEnv {
            ctx: &ctx,
            shared: &shared,
            opcodes: &opcodes,
            diagnostics: &TracingDiagnostics,
        },
        mix: &mix,
    };
    f(&pass)
}

fn rect_node(attrs: AttributeSet) -> DrawableNode {
    let kind = PrimitiveRegistry::builtin().create("rect").unwrap();
    DrawableNode::new("box", attrs, kind)
}

#[test]
fn rect_collision_is_inclusive() {
    let c = Collision::Rect(Rect::new(-0.5, -0.5, 0.5, 0.5));
    assert!(c.contains(Point::new(0.5, 0.5)));
    assert!(c.contains(Point::new(-0.5, 0.0)));
    assert!(!c.contains(Point::new(0.51, 0.0)));
    assert!(!Collision::None.contains(Point::ZERO));
}

#[test]
fn degenerate_polygon_transform_never_hits() {
    let c = Collision::Polygon {
        ring: vec![
            Point::new(1.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(-1.0, 0.0),
        ],
        transform: Affine::scale_non_uniform(0.0, 1.0),
    };
    assert!(!c.contains(Point::new(0.0, 0.2)));
}

#[test]
fn registry_knows_builtin_kinds() {
    let r = PrimitiveRegistry::builtin();
    let kinds: Vec<&str> = r.kinds().collect();
    assert_eq!(kinds, ["circle", "rect", "regpoly", "surface"]);
    assert_eq!(r.create("circle").unwrap().kind(), "circle");

    let err = r.create("hexagon").unwrap_err();
    assert!(matches!(err, ShapeError::Document(_)));
}

#[test]
fn registry_aliases_share_constructor() {
    let mut r = PrimitiveRegistry::builtin();
    r.alias("box", "rect").unwrap();
    assert_eq!(r.create("box").unwrap().kind(), "rect");
    assert!(r.alias("x", "nope").is_err());
}

#[test]
fn circle_and_regpoly_differ_only_in_face_default() {
    let r = PrimitiveRegistry::builtin();
    let poly = r.create("regpoly").unwrap();
    let circle = r.create("circle").unwrap();
    let faces = |p: &dyn Primitive| p.defaults().get("faces").unwrap().fallback.clone();
    assert_eq!(faces(poly.as_ref()), Value::Number(4.0));
    assert_eq!(faces(circle.as_ref()), Value::Number(64.0));
}

#[test]
fn render_caches_collision_for_the_frame() {
    let node = rect_node(AttributeSet::new());
    assert!(!node.hit(Point::ZERO));

    let mut rec = RecordingRenderer::new();
    with_pass(7, |pass| node.render(pass, &Attributes::new(), &mut rec)).unwrap();

    let snap = node.snapshot().unwrap();
    assert_eq!(snap.frame, 7);
    assert_eq!(snap.data.clip, ClipRect::UNBOUNDED);
    assert!(node.hit(Point::ZERO));
    assert!(node.hit(Point::new(0.5, 0.5)));
    assert!(!node.hit(Point::new(0.9, 0.9)));
}

#[test]
fn hidden_node_is_skipped_and_unpickable() {
    let node = rect_node(AttributeSet::new());
    let mut rec = RecordingRenderer::new();
    with_pass(0, |pass| node.render(pass, &Attributes::new(), &mut rec)).unwrap();
    assert!(node.hit(Point::ZERO));

    let hidden = Attributes::new().with("visible", false);
    with_pass(1, |pass| node.render(pass, &hidden, &mut rec)).unwrap();
    assert_eq!(rec.records.len(), 1);
    assert!(node.snapshot().is_none());
    assert!(!node.hit(Point::ZERO));
}

#[test]
fn inherited_clip_limits_hits() {
    let node = rect_node(AttributeSet::new());
    let inherited =
        Attributes::new().with("clip_rect", ClipRect::new(0.0, 0.0, 1.0, 1.0).to_value());
    let mut rec = RecordingRenderer::new();
    with_pass(0, |pass| node.render(pass, &inherited, &mut rec)).unwrap();

    assert_eq!(rec.records[0].clip, ClipRect::new(0.0, 0.0, 1.0, 1.0));
    assert!(node.hit(Point::new(0.25, 0.25)));
    assert!(!node.hit(Point::new(-0.25, 0.25)));
}

#[test]
fn inherited_position_and_alpha_combine() {
    let attrs = AttributeSet::new()
        .with("pos_x", Expression::literal(0.25))
        .with("alpha", Expression::literal(0.5));
    let node = rect_node(attrs);
    let inherited = Attributes::new().with("pos_x", 0.25).with("alpha", 0.5);
    let mut rec = RecordingRenderer::new();
    with_pass(0, |pass| node.render(pass, &inherited, &mut rec)).unwrap();

    let r = &rec.records[0];
    assert_eq!(r.transform.translation().x, 0.5);
    let Paint::Solid(color) = r.paint else {
        panic!("solid paint expected");
    };
    assert_eq!(color.a, 0.25);
}

#[test]
fn evaluation_errors_name_the_node() {
    let attrs = AttributeSet::new().with("pos_x", Expression::call("nope", []));
    let node = rect_node(attrs);
    let mut rec = RecordingRenderer::new();
    let err = with_pass(0, |pass| node.render(pass, &Attributes::new(), &mut rec)).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("drawable 'box'"), "{msg}");
    assert!(msg.contains("attribute 'pos_x'"), "{msg}");
}
