use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Arc;

use smallvec::SmallVec;

use crate::foundation::core::{Affine, BezPath, Point, Rect, Rgba};
use crate::foundation::error::{ShapeError, ShapeResult};
use crate::render::backend::{DrawCall, FrameRGBA, Geometry, Paint, Renderer};

const NDC: Rect = Rect::new(-1.0, -1.0, 1.0, 1.0);

// Full-frame program images kept across frames.
const PROGRAM_CACHE_CAPACITY: usize = 4;

type Polygon = SmallVec<[Point; 8]>;

/// Options for the CPU renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CpuRendererOpts {
    pub width: u32,
    pub height: u32,
}

impl Default for CpuRendererOpts {
    fn default() -> Self {
        Self {
            width: 720,
            height: 480,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct ProgramKey {
    iterations: u32,
    params: [u64; 3],
}

/// Rasterizes draw calls with `vello_cpu` into an RGBA8 frame.
///
/// Geometry is clipped against the call's clip rectangle on the CPU before submission, then
/// mapped from normalized device coordinates (`y` up) into pixel space.
pub struct CpuRenderer {
    width: u16,
    height: u16,
    ctx: Option<vello_cpu::RenderContext>,
    frame: Option<FrameRGBA>,
    program_cache: HashMap<ProgramKey, vello_cpu::Image>,
    program_lru: VecDeque<ProgramKey>,
    warned_programs: BTreeSet<String>,
}

impl CpuRenderer {
    pub fn new(opts: CpuRendererOpts) -> ShapeResult<Self> {
        let width: u16 = opts
            .width
            .try_into()
            .map_err(|_| ShapeError::render("frame width exceeds u16"))?;
        let height: u16 = opts
            .height
            .try_into()
            .map_err(|_| ShapeError::render("frame height exceeds u16"))?;
        if width == 0 || height == 0 {
            return Err(ShapeError::render("frame size must be non-zero"));
        }
        Ok(Self {
            width,
            height,
            ctx: None,
            frame: None,
            program_cache: HashMap::new(),
            program_lru: VecDeque::new(),
            warned_programs: BTreeSet::new(),
        })
    }

    /// The last completed frame.
    pub fn frame(&self) -> Option<&FrameRGBA> {
        self.frame.as_ref()
    }

    pub fn take_frame(&mut self) -> Option<FrameRGBA> {
        self.frame.take()
    }

    /// Normalized device coordinates → pixels, origin top-left.
    fn view(&self) -> Affine {
        let w = f64::from(self.width);
        let h = f64::from(self.height);
        Affine::new([w / 2.0, 0.0, 0.0, -h / 2.0, w / 2.0, h / 2.0])
    }

    fn fill(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        call: &DrawCall<'_>,
        path: &BezPath,
    ) -> ShapeResult<()> {
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        let alpha = match &call.paint {
            Paint::Solid(color) => {
                let [r, g, b, a] = color.to_rgba8();
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
                1.0
            }
            Paint::Program {
                name,
                iterations,
                params,
                alpha,
                ..
            } if name == "mandelbrot" => {
                ctx.set_paint(self.mandelbrot_paint(*iterations, *params)?);
                *alpha
            }
            Paint::Program { name, alpha, .. } => {
                if self.warned_programs.insert(name.clone()) {
                    tracing::warn!(
                        program = %name,
                        node = call.node,
                        "unknown surface program, drawing placeholder"
                    );
                }
                let [r, g, b, a] = Rgba {
                    r: 1.0,
                    g: 0.0,
                    b: 1.0,
                    a: *alpha,
                }
                .to_rgba8();
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
                1.0
            }
        };

        if alpha < 1.0 {
            ctx.push_opacity_layer(alpha.clamp(0.0, 1.0) as f32);
        }
        ctx.fill_path(&bezpath_to_cpu(path));
        if alpha < 1.0 {
            ctx.pop_layer();
        }
        Ok(())
    }

    // Escape-time image covering the whole frame, so it can be sampled with an identity paint
    // transform under pixel-space paths.
    fn mandelbrot_paint(
        &mut self,
        iterations: u32,
        params: [f64; 3],
    ) -> ShapeResult<vello_cpu::Image> {
        let key = ProgramKey {
            iterations,
            params: params.map(f64::to_bits),
        };
        if let Some(img) = self.program_cache.get(&key).cloned() {
            self.touch_program(key);
            return Ok(img);
        }

        let [zoom, center_x, center_y] = params;
        let zoom = if zoom == 0.0 { 1.0 } else { zoom };
        let w = u32::from(self.width);
        let h = u32::from(self.height);
        let inv_view = self.view().inverse();
        let aspect_x = f64::from(w) / f64::from(h);
        let max_iter = iterations.max(1);

        let mut bytes = vec![0u8; (w as usize) * (h as usize) * 4];
        for y in 0..h {
            for x in 0..w {
                let ndc = inv_view * Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                let cr = ndc.x * aspect_x / zoom + center_x;
                let ci = ndc.y / zoom + center_y;
                let n = escape_time(cr, ci, max_iter);
                let t = f64::from(n) / f64::from(max_iter);
                let idx = ((y as usize) * (w as usize) + (x as usize)) * 4;
                let [r, g, b, _] = Rgba {
                    r: t,
                    g: t * t,
                    b: t.sqrt(),
                    a: 1.0,
                }
                .to_rgba8();
                bytes[idx..idx + 4].copy_from_slice(&[r, g, b, 255]);
            }
        }

        let img = opaque_image(&bytes, self.width, self.height);
        self.insert_program(key, img.clone());
        Ok(img)
    }

    fn insert_program(&mut self, key: ProgramKey, image: vello_cpu::Image) {
        self.program_cache.insert(key, image);
        self.touch_program(key);
        while self.program_lru.len() > PROGRAM_CACHE_CAPACITY {
            if let Some(old) = self.program_lru.pop_front() {
                self.program_cache.remove(&old);
            }
        }
    }

    fn touch_program(&mut self, key: ProgramKey) {
        if let Some(pos) = self.program_lru.iter().position(|k| *k == key) {
            self.program_lru.remove(pos);
        }
        self.program_lru.push_back(key);
    }
}

impl Renderer for CpuRenderer {
    fn begin_frame(&mut self, background: Rgba) -> ShapeResult<()> {
        let mut ctx = match self.ctx.take() {
            Some(ctx) => ctx,
            None => vello_cpu::RenderContext::new(self.width, self.height),
        };
        ctx.reset();
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        let [r, g, b, a] = background.to_rgba8();
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.width),
            f64::from(self.height),
        ));
        self.ctx = Some(ctx);
        Ok(())
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> ShapeResult<()> {
        let bounds = call.clip.resolve(NDC).intersect(NDC);
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return Ok(());
        }

        let view = self.view();
        let mut path = BezPath::new();
        for local in local_polygons(&call.geometry) {
            let ndc: Polygon = local.iter().map(|&p| call.transform * p).collect();
            let clipped = clip_polygon(&ndc, bounds);
            if clipped.len() < 3 {
                continue;
            }
            path.move_to(view * clipped[0]);
            for &p in &clipped[1..] {
                path.line_to(view * p);
            }
            path.close_path();
        }
        if path.elements().is_empty() {
            return Ok(());
        }

        let mut ctx = self
            .ctx
            .take()
            .ok_or_else(|| ShapeError::render("draw call outside begin_frame/end_frame"))?;
        let out = self.fill(&mut ctx, call, &path);
        self.ctx = Some(ctx);
        out
    }

    fn end_frame(&mut self) -> ShapeResult<()> {
        let mut ctx = self
            .ctx
            .take()
            .ok_or_else(|| ShapeError::render("end_frame without begin_frame"))?;
        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        ctx.render_to_pixmap(&mut pixmap);
        self.ctx = Some(ctx);

        self.frame = Some(FrameRGBA {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        });
        Ok(())
    }
}

fn local_polygons(geometry: &Geometry<'_>) -> Vec<Polygon> {
    let quad = |x0: f64, y0: f64, x1: f64, y1: f64| -> Polygon {
        SmallVec::from_slice(&[
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ])
    };

    match *geometry {
        Geometry::Quad => vec![quad(-1.0, -1.0, 1.0, 1.0)],
        Geometry::Outline { inset_x, inset_y } => {
            let ix = inset_x.clamp(0.0, 1.0);
            let iy = inset_y.clamp(0.0, 1.0);
            if ix >= 1.0 || iy >= 1.0 {
                return vec![quad(-1.0, -1.0, 1.0, 1.0)];
            }
            // Non-overlapping strips: full-width bands top and bottom, side bands between.
            vec![
                quad(-1.0, 1.0 - iy, 1.0, 1.0),
                quad(-1.0, -1.0, 1.0, -1.0 + iy),
                quad(-1.0, -1.0 + iy, -1.0 + ix, 1.0 - iy),
                quad(1.0 - ix, -1.0 + iy, 1.0, 1.0 - iy),
            ]
        }
        Geometry::TriangleFan {
            vertices,
            indices,
            triangles,
        } => indices
            .chunks_exact(3)
            .take(triangles)
            .filter_map(|t| {
                let a = vertices.get(t[0] as usize)?;
                let b = vertices.get(t[1] as usize)?;
                let c = vertices.get(t[2] as usize)?;
                Some(SmallVec::from_slice(&[*a, *b, *c]))
            })
            .collect(),
    }
}

// Sutherland–Hodgman against an axis-aligned rectangle.
fn clip_polygon(poly: &[Point], r: Rect) -> Polygon {
    let out: Polygon = poly.iter().copied().collect();
    let out = clip_edge(&out, |p| p.x >= r.x0, |a, b| lerp_x(a, b, r.x0));
    let out = clip_edge(&out, |p| p.x <= r.x1, |a, b| lerp_x(a, b, r.x1));
    let out = clip_edge(&out, |p| p.y >= r.y0, |a, b| lerp_y(a, b, r.y0));
    clip_edge(&out, |p| p.y <= r.y1, |a, b| lerp_y(a, b, r.y1))
}

fn clip_edge(
    input: &[Point],
    inside: impl Fn(Point) -> bool,
    cross: impl Fn(Point, Point) -> Point,
) -> Polygon {
    let mut out = Polygon::new();
    let Some(&last) = input.last() else {
        return out;
    };
    let mut prev = last;
    for &cur in input {
        match (inside(prev), inside(cur)) {
            (true, true) => out.push(cur),
            (true, false) => out.push(cross(prev, cur)),
            (false, true) => {
                out.push(cross(prev, cur));
                out.push(cur);
            }
            (false, false) => {}
        }
        prev = cur;
    }
    out
}

fn lerp_x(a: Point, b: Point, x: f64) -> Point {
    let t = (x - a.x) / (b.x - a.x);
    Point::new(x, a.y + t * (b.y - a.y))
}

fn lerp_y(a: Point, b: Point, y: f64) -> Point {
    let t = (y - a.y) / (b.y - a.y);
    Point::new(a.x + t * (b.x - a.x), y)
}

fn escape_time(cr: f64, ci: f64, max_iter: u32) -> u32 {
    let (mut zr, mut zi) = (0.0f64, 0.0f64);
    for n in 0..max_iter {
        if zr * zr + zi * zi > 4.0 {
            return n;
        }
        let t = zr * zr - zi * zi + cr;
        zi = 2.0 * zr * zi + ci;
        zr = t;
    }
    max_iter
}

fn opaque_image(rgba8: &[u8], width: u16, height: u16) -> vello_cpu::Image {
    let pixels = rgba8
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3],
        })
        .collect();
    let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, width, height, false);
    vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    }
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let pt = |p: Point| vello_cpu::kurbo::Point::new(p.x, p.y);
    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(pt(p)),
            PathEl::LineTo(p) => out.line_to(pt(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(pt(p1), pt(p2)),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(pt(p1), pt(p2), pt(p3)),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
