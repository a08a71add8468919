use super::*;

fn sample() -> ClipRect {
    ClipRect::new(-0.5, -0.25, 0.5, 0.75)
}

#[test]
fn intersect_with_self_is_identity() {
    assert_eq!(sample().intersect(sample()), sample());
}

#[test]
fn intersect_with_unbounded_is_identity() {
    assert_eq!(sample().intersect(ClipRect::UNBOUNDED), sample());
    assert_eq!(ClipRect::UNBOUNDED.intersect(sample()), sample());
}

#[test]
fn intersect_is_commutative_and_never_enlarges() {
    let a = sample();
    let b = ClipRect {
        min_x: Some(0.0),
        min_y: None,
        max_x: Some(2.0),
        max_y: Some(0.5),
    };
    let ab = a.intersect(b);
    assert_eq!(ab, b.intersect(a));
    assert_eq!(ab, ClipRect::new(0.0, -0.25, 0.5, 0.5));

    let r = ab.resolve(Rect::new(-1.0, -1.0, 1.0, 1.0));
    let ra = a.resolve(Rect::new(-1.0, -1.0, 1.0, 1.0));
    assert!(r.x0 >= ra.x0 && r.x1 <= ra.x1 && r.y0 >= ra.y0 && r.y1 <= ra.y1);
}

#[test]
fn centered_without_extent_leaves_axis_open() {
    let c = ClipRect::centered(Point::new(0.2, 0.0), Some(0.1), None);
    assert!((c.min_x.unwrap() - 0.1).abs() < 1e-12);
    assert!((c.max_x.unwrap() - 0.3).abs() < 1e-12);
    assert!(c.min_y.is_none() && c.max_y.is_none());
    assert!(c.contains(Point::new(0.2, 100.0)));
    assert!(!c.contains(Point::new(0.5, 0.0)));
    assert!(!c.is_bounded());
}

#[test]
fn disjoint_intersection_contains_nothing() {
    let a = ClipRect::new(-1.0, -1.0, -0.5, -0.5);
    let b = ClipRect::new(0.5, 0.5, 1.0, 1.0);
    let c = a.intersect(b);
    for p in [
        Point::new(-0.75, -0.75),
        Point::new(0.75, 0.75),
        Point::new(0.0, 0.0),
    ] {
        assert!(!c.contains(p));
    }
}

#[test]
fn value_encoding_keeps_open_sides() {
    let c = ClipRect::centered(Point::ZERO, None, Some(0.5));
    let v = c.to_value();
    assert_eq!(
        v,
        Value::List(vec![
            Value::Null,
            Value::Number(-0.5),
            Value::Null,
            Value::Number(0.5)
        ])
    );
    assert_eq!(ClipRect::from_value(&v).unwrap(), c);
    assert_eq!(
        ClipRect::from_value(&Value::Null).unwrap(),
        ClipRect::UNBOUNDED
    );
    assert!(ClipRect::from_value(&Value::Number(1.0)).is_err());
}

#[test]
fn rgba_requires_three_components() {
    let ok = Rgba::from_value(&Value::from(vec![1.0, 0.0, 0.5]), 1.0).unwrap();
    assert_eq!(ok.to_rgba8(), [255, 0, 128, 255]);
    assert!(Rgba::from_value(&Value::from(vec![1.0, 0.0]), 1.0).is_err());
}
