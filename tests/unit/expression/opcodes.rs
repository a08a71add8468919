use super::*;
use crate::eval::context::Pointer;
use crate::eval::diagnostics::TracingDiagnostics;
use serde_json::json;

fn call(name: &str, popped: &[Value], constants: &[Value]) -> ShapeResult<Value> {
    call_with(name, popped, constants, &EvalContext::new(10, 0.5), &shared())
}

fn call_with(
    name: &str,
    popped: &[Value],
    constants: &[Value],
    ctx: &EvalContext,
    shared: &SharedData,
) -> ShapeResult<Value> {
    let table = OpcodeTable::builtin();
    let op = table.get(name).expect("builtin opcode");
    op.invoke(&OpArgs {
        popped,
        constants,
        ctx,
        shared,
        diagnostics: &TracingDiagnostics,
    })
}

fn shared() -> SharedData {
    serde_json::from_value(json!({
        "palette": {"accent": [1, 0.5, 0], "hidden": null},
        "sizes": {"3": 0.75}
    }))
    .unwrap()
}

fn n(v: f64) -> Value {
    Value::Number(v)
}

#[test]
fn arity_table_matches_contract() {
    let t = OpcodeTable::builtin();
    let expected = [
        ("const", 0, 1),
        ("add", 1, 1),
        ("multiply", 1, 1),
        ("frame", 0, 0),
        ("sine", 1, 0),
        ("floor", 1, 1),
        ("abs", 1, 0),
        ("fsine", 0, 2),
        ("aspect", 0, 0),
        ("inv_aspect", 0, 0),
        ("lookup", 0, 3),
        ("const_group", 1, 3),
        ("print", 1, 0),
    ];
    for (name, pops, consumes) in expected {
        let op = t.get(name).unwrap_or_else(|| panic!("missing {name}"));
        assert_eq!((op.pops, op.consumes), (pops, consumes), "{name}");
    }
}

#[test]
fn arithmetic_uses_constant_against_popped() {
    assert_eq!(call("add", &[n(2.0)], &[n(5.0)]).unwrap(), n(7.0));
    assert_eq!(call("multiply", &[n(2.0)], &[n(5.0)]).unwrap(), n(10.0));
    assert_eq!(call("floor", &[n(7.9)], &[n(2.0)]).unwrap(), n(6.0));
    assert_eq!(call("abs", &[n(-3.0)], &[]).unwrap(), n(3.0));
    assert_eq!(call("sine", &[n(0.0)], &[]).unwrap(), n(0.0));
}

#[test]
fn floor_rejects_zero_step() {
    assert!(call("floor", &[n(1.0)], &[n(0.0)]).unwrap_err().is_dsl());
}

#[test]
fn context_readers() {
    assert_eq!(call("frame", &[], &[]).unwrap(), n(10.0));
    assert_eq!(call("aspect", &[], &[]).unwrap(), n(0.5));
    assert_eq!(call("inv_aspect", &[], &[]).unwrap(), n(2.0));
    assert_eq!(
        call("fsine", &[], &[n(0.1), n(3.0)]).unwrap(),
        n(3.0 * (0.1f64 * 10.0).sin())
    );
}

#[test]
fn pointer_readers_default_to_zero() {
    assert_eq!(call("pointer_x", &[], &[]).unwrap(), n(0.0));
    assert_eq!(call("pointer_press", &[], &[]).unwrap(), Value::Bool(false));

    let ctx = EvalContext::new(0, 1.0).with_pointer(Pointer {
        x: 0.25,
        y: -0.5,
        pressed: [true, false],
    });
    let s = shared();
    assert_eq!(call_with("pointer_x", &[], &[], &ctx, &s).unwrap(), n(0.25));
    assert_eq!(call_with("pointer_y", &[], &[], &ctx, &s).unwrap(), n(-0.5));
    assert_eq!(
        call_with("pointer_press", &[], &[], &ctx, &s).unwrap(),
        Value::Bool(true)
    );
}

#[test]
fn window_pixels_map_to_device_coordinates() {
    let p = Pointer::from_window(0.0, 0.0, 720, 480);
    assert_eq!((p.x, p.y), (-1.0, 1.0));
    let p = Pointer::from_window(540.0, 360.0, 720, 480);
    assert_eq!((p.x, p.y), (0.5, -0.5));
    assert_eq!(p.pressed, [false, false]);
}

#[test]
fn lookup_falls_back_when_absent() {
    let found = call(
        "lookup",
        &[],
        &["palette".into(), "accent".into(), Value::Null],
    )
    .unwrap();
    assert_eq!(found, Value::from(vec![1.0, 0.5, 0.0]));

    let numeric_key = call("lookup", &[], &["sizes".into(), n(3.0), n(0.0)]).unwrap();
    assert_eq!(numeric_key, n(0.75));

    for (table, key) in [("palette", "missing"), ("palette", "hidden"), ("nope", "x")] {
        let v = call("lookup", &[], &[table.into(), key.into(), n(-1.0)]).unwrap();
        assert_eq!(v, n(-1.0), "{table}.{key}");
    }
}

#[test]
fn const_group_picks_greatest_threshold_not_above_driver() {
    let values = Value::from(vec![10.0, 20.0, 30.0]);
    let thresholds = Value::from(vec![0.0, 5.0, 10.0]);
    let pick = |driver: f64| {
        call(
            "const_group",
            &[n(driver)],
            &[values.clone(), thresholds.clone(), n(-1.0)],
        )
        .unwrap()
    };
    assert_eq!(pick(-0.5), n(-1.0));
    assert_eq!(pick(0.0), n(10.0));
    assert_eq!(pick(7.0), n(20.0));
    assert_eq!(pick(10.0), n(30.0));
    assert_eq!(pick(99.0), n(30.0));
}

#[test]
fn const_group_rejects_ragged_lists() {
    let err = call(
        "const_group",
        &[n(1.0)],
        &[Value::from(vec![1.0]), Value::from(vec![0.0, 1.0]), n(0.0)],
    )
    .unwrap_err();
    assert!(err.is_dsl());
}

#[test]
fn alias_copies_existing_opcode() {
    let mut t = OpcodeTable::builtin();
    t.alias("sin", "sine").unwrap();
    assert_eq!(t.get("sin").unwrap().pops, 1);
    assert!(matches!(
        t.alias("x", "missing").unwrap_err(),
        ShapeError::Document(_)
    ));
}
