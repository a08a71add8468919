use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use shapegraph::{
    CpuRenderer, CpuRendererOpts, EvalContext, FrameRGBA, Point, PrimitiveRegistry,
    RecordingRenderer, SceneGraph, TracingDiagnostics, Viewport,
};

#[derive(Parser, Debug)]
#[command(name = "shapegraph", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Render a range of frames as numbered PNGs.
    Frames(FramesArgs),
    /// Render a frame, then report the node under a point.
    Pick(PickArgs),
    /// Print every node's attributes as JSON.
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
struct ViewArgs {
    /// Output width in pixels.
    #[arg(long, default_value_t = 720)]
    width: u32,

    /// Output height in pixels.
    #[arg(long, default_value_t = 480)]
    height: u32,
}

impl ViewArgs {
    fn viewport(&self) -> Viewport {
        Viewport {
            width: self.width,
            height: self.height,
        }
    }
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Frame counter handed to attribute programs.
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    frame: i64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    view: ViewArgs,
}

#[derive(Parser, Debug)]
struct FramesArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// First frame (inclusive).
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    start: i64,

    /// Last frame (exclusive).
    #[arg(
        long,
        allow_hyphen_values = true,
        conflicts_with = "seconds",
        required_unless_present = "seconds"
    )]
    end: Option<i64>,

    /// Duration to render from `--start`, converted with the document's `frame_rate`.
    #[arg(long)]
    seconds: Option<f64>,

    /// Directory receiving `frame_NNNNN.png` files.
    #[arg(long)]
    out_dir: PathBuf,

    #[command(flatten)]
    view: ViewArgs,
}

#[derive(Parser, Debug)]
struct PickArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    frame: i64,

    /// Horizontal position in normalized device coordinates.
    #[arg(long, allow_hyphen_values = true)]
    x: f64,

    /// Vertical position in normalized device coordinates (`y` up).
    #[arg(long, allow_hyphen_values = true)]
    y: f64,

    #[command(flatten)]
    view: ViewArgs,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Frames(args) => cmd_frames(args),
        Command::Pick(args) => cmd_pick(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn load(path: &Path) -> anyhow::Result<SceneGraph> {
    SceneGraph::from_path(path, &PrimitiveRegistry::builtin())
        .with_context(|| format!("load scene '{}'", path.display()))
}

fn render_png(
    graph: &SceneGraph,
    renderer: &mut CpuRenderer,
    ctx: &EvalContext,
    out: &Path,
) -> anyhow::Result<()> {
    graph
        .render(ctx, renderer, &TracingDiagnostics)
        .with_context(|| format!("render frame {}", ctx.frame))?;
    let frame = renderer
        .take_frame()
        .context("renderer produced no frame")?;
    write_png(&frame, out)
}

fn write_png(frame: &FrameRGBA, out: &Path) -> anyhow::Result<()> {
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", out.display()))
}

fn cpu_renderer(view: &ViewArgs) -> anyhow::Result<CpuRenderer> {
    Ok(CpuRenderer::new(CpuRendererOpts {
        width: view.width,
        height: view.height,
    })?)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let graph = load(&args.in_path)?;
    let mut renderer = cpu_renderer(&args.view)?;
    let ctx = EvalContext::for_viewport(args.frame, args.view.viewport());
    render_png(&graph, &mut renderer, &ctx, &args.out)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_frames(args: FramesArgs) -> anyhow::Result<()> {
    let graph = load(&args.in_path)?;
    let end = match (args.end, args.seconds) {
        (Some(end), _) => end,
        (None, Some(seconds)) => args.start + graph.config().frames_for(seconds),
        (None, None) => anyhow::bail!("either --end or --seconds is required"),
    };
    anyhow::ensure!(args.start < end, "empty frame range {}..{}", args.start, end);
    let mut renderer = cpu_renderer(&args.view)?;

    for frame in args.start..end {
        let ctx = EvalContext::for_viewport(frame, args.view.viewport());
        let out = args.out_dir.join(format!("frame_{frame:05}.png"));
        render_png(&graph, &mut renderer, &ctx, &out)?;
    }

    eprintln!(
        "wrote {} frames to {}",
        end - args.start,
        args.out_dir.display()
    );
    Ok(())
}

fn cmd_pick(args: PickArgs) -> anyhow::Result<()> {
    let graph = load(&args.in_path)?;
    let ctx = EvalContext::for_viewport(args.frame, args.view.viewport());
    let mut recorder = RecordingRenderer::new();
    graph
        .render(&ctx, &mut recorder, &TracingDiagnostics)
        .with_context(|| format!("render frame {}", ctx.frame))?;

    match graph.hit_test(Point::new(args.x, args.y)) {
        Some(name) => println!("{name}"),
        None => println!("-"),
    }
    Ok(())
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let graph = load(&args.in_path)?;
    let report = serde_json::to_string_pretty(&graph.inspect()).context("encode report")?;
    println!("{report}");
    Ok(())
}
