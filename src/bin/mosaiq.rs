use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "mosaiq", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a scene document as a PNG.
    Render(RenderArgs),
    /// Render a single slideshow transition frame as a PNG.
    Frame(FrameArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Index of the outgoing image.
    #[arg(long, default_value_t = 0)]
    from: usize,

    /// Index of the incoming image.
    #[arg(long, default_value_t = 1)]
    to: usize,

    /// Transition kind (fade, slide_left, slide_right, slide_up,
    /// slide_down, zoom_in, zoom_out, dissolve, cut).
    #[arg(long, default_value = "fade")]
    transition: String,

    /// Progress in [0, 1].
    #[arg(long)]
    progress: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
    }
}

fn load_scene(in_path: &PathBuf) -> anyhow::Result<(mosaiq::Scene, mosaiq::PreparedAssetStore)> {
    let json = std::fs::read_to_string(in_path)
        .with_context(|| format!("read scene '{}'", in_path.display()))?;
    let scene: mosaiq::Scene =
        serde_json::from_str(&json).with_context(|| "parse scene JSON")?;
    scene.validate()?;

    let assets_root = in_path
        .parent()
        .unwrap_or_else(|| std::path::Path::new("."));
    let store = mosaiq::PreparedAssetStore::prepare(&scene, assets_root)?;
    Ok((scene, store))
}

fn write_png(surface: &mosaiq::Surface, out: &PathBuf) -> anyhow::Result<()> {
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        out,
        &surface.to_straight_rgba8(),
        surface.width(),
        surface.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", out.display()))?;
    eprintln!("wrote {}", out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let (scene, store) = load_scene(&args.in_path)?;
    let frame = mosaiq::render_scene(&scene, &store)?;
    write_png(&frame, &args.out)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let (scene, store) = load_scene(&args.in_path)?;
    let kind = mosaiq::parse_transition(&args.transition)?;
    let frame =
        mosaiq::render_slideshow_frame(&scene, &store, args.from, args.to, kind, args.progress)?;
    write_png(&frame, &args.out)
}
