use super::*;
use crate::foundation::core::ClipRect;

fn px(frame: &FrameRGBA, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * frame.width + x) * 4) as usize;
    [
        frame.data[i],
        frame.data[i + 1],
        frame.data[i + 2],
        frame.data[i + 3],
    ]
}

fn solid(r: f64, g: f64, b: f64) -> Paint {
    Paint::Solid(Rgba { r, g, b, a: 1.0 })
}

fn black() -> Rgba {
    Rgba {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    }
}

fn render(calls: &[DrawCall<'_>]) -> FrameRGBA {
    let mut r = CpuRenderer::new(CpuRendererOpts {
        width: 20,
        height: 20,
    })
    .unwrap();
    r.begin_frame(black()).unwrap();
    for c in calls {
        r.draw(c).unwrap();
    }
    r.end_frame().unwrap();
    r.take_frame().unwrap()
}

#[test]
fn clip_polygon_trims_to_rect() {
    let square = [
        Point::new(-1.0, -1.0),
        Point::new(1.0, -1.0),
        Point::new(1.0, 1.0),
        Point::new(-1.0, 1.0),
    ];
    let out = clip_polygon(&square, Rect::new(0.0, 0.0, 2.0, 2.0));
    assert_eq!(out.len(), 4);
    for p in &out {
        assert!(p.x >= 0.0 && p.y >= 0.0, "{p:?}");
    }

    let gone = clip_polygon(&square, Rect::new(3.0, 3.0, 4.0, 4.0));
    assert!(gone.is_empty());
}

#[test]
fn outline_strips_do_not_cover_the_middle() {
    let polys = local_polygons(&Geometry::Outline {
        inset_x: 0.2,
        inset_y: 0.2,
    });
    assert_eq!(polys.len(), 4);
    let centre = Point::ZERO;
    for p in &polys {
        let min_x = p.iter().map(|q| q.x).fold(f64::INFINITY, f64::min);
        let max_x = p.iter().map(|q| q.x).fold(f64::NEG_INFINITY, f64::max);
        let min_y = p.iter().map(|q| q.y).fold(f64::INFINITY, f64::min);
        let max_y = p.iter().map(|q| q.y).fold(f64::NEG_INFINITY, f64::max);
        let covers = centre.x > min_x && centre.x < max_x && centre.y > min_y && centre.y < max_y;
        assert!(!covers);
    }
}

#[test]
fn fan_uses_only_live_triangles() {
    let vertices = [
        Point::ZERO,
        Point::new(1.0, 0.0),
        Point::new(0.0, 1.0),
        Point::new(-1.0, 0.0),
    ];
    let indices = [0, 1, 2, 0, 2, 3, 0, 0, 0];
    let polys = local_polygons(&Geometry::TriangleFan {
        vertices: &vertices,
        indices: &indices,
        triangles: 2,
    });
    assert_eq!(polys.len(), 2);
}

#[test]
fn quad_fills_centre_and_leaves_background() {
    let call = DrawCall {
        node: "box",
        transform: Affine::scale(0.5),
        clip: ClipRect::UNBOUNDED,
        aspect: 1.0,
        geometry: Geometry::Quad,
        paint: solid(1.0, 0.0, 0.0),
    };
    let frame = render(&[call]);
    assert_eq!((frame.width, frame.height), (20, 20));
    assert_eq!(px(&frame, 10, 10), [255, 0, 0, 255]);
    assert_eq!(px(&frame, 0, 0), [0, 0, 0, 255]);
    assert_eq!(px(&frame, 19, 19), [0, 0, 0, 255]);
}

#[test]
fn clip_hides_outside_pixels() {
    // Only the left half of the frame is visible.
    let call = DrawCall {
        node: "box",
        transform: Affine::IDENTITY,
        clip: ClipRect {
            max_x: Some(0.0),
            ..ClipRect::UNBOUNDED
        },
        aspect: 1.0,
        geometry: Geometry::Quad,
        paint: solid(0.0, 1.0, 0.0),
    };
    let frame = render(&[call]);
    assert_eq!(px(&frame, 4, 10), [0, 255, 0, 255]);
    assert_eq!(px(&frame, 15, 10), [0, 0, 0, 255]);
}

#[test]
fn later_calls_paint_over_earlier_ones() {
    let under = DrawCall {
        node: "under",
        transform: Affine::IDENTITY,
        clip: ClipRect::UNBOUNDED,
        aspect: 1.0,
        geometry: Geometry::Quad,
        paint: solid(0.0, 0.0, 1.0),
    };
    let over = DrawCall {
        node: "over",
        paint: solid(1.0, 1.0, 1.0),
        transform: Affine::scale(0.3),
        ..under.clone()
    };
    let frame = render(&[under, over]);
    assert_eq!(px(&frame, 10, 10), [255, 255, 255, 255]);
    assert_eq!(px(&frame, 1, 1), [0, 0, 255, 255]);
}

#[test]
fn draw_outside_frame_is_an_error() {
    let mut r = CpuRenderer::new(CpuRendererOpts::default()).unwrap();
    let call = DrawCall {
        node: "x",
        transform: Affine::IDENTITY,
        clip: ClipRect::UNBOUNDED,
        aspect: 1.0,
        geometry: Geometry::Quad,
        paint: solid(1.0, 1.0, 1.0),
    };
    assert!(r.draw(&call).is_err());
}

#[test]
fn oversized_frames_are_rejected() {
    let err = CpuRenderer::new(CpuRendererOpts {
        width: 70_000,
        height: 10,
    })
    .err()
    .unwrap();
    assert!(matches!(err, ShapeError::Render(_)));
}

#[test]
fn program_cache_keeps_only_recent_parameter_sets() {
    let mut r = CpuRenderer::new(CpuRendererOpts {
        width: 16,
        height: 12,
    })
    .unwrap();
    for frame in 0..200 {
        let call = DrawCall {
            node: "fractal",
            transform: Affine::IDENTITY,
            clip: ClipRect::UNBOUNDED,
            aspect: 1.0,
            geometry: Geometry::Quad,
            paint: Paint::Program {
                name: "mandelbrot".to_string(),
                iterations: 8,
                screen: [16, 12],
                params: [1.0 + 0.01 * f64::from(frame), -0.5, 0.0],
                alpha: 1.0,
            },
        };
        r.begin_frame(black()).unwrap();
        r.draw(&call).unwrap();
        r.end_frame().unwrap();
        assert!(r.program_cache.len() <= PROGRAM_CACHE_CAPACITY);
    }
    assert_eq!(r.program_cache.len(), PROGRAM_CACHE_CAPACITY);
    assert_eq!(r.program_lru.len(), PROGRAM_CACHE_CAPACITY);

    let newest = ProgramKey {
        iterations: 8,
        params: [1.0 + 0.01 * 199.0, -0.5, 0.0].map(f64::to_bits),
    };
    assert!(r.program_cache.contains_key(&newest));
}
