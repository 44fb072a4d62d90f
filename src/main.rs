use atrous_tracer::{DenoiseSettings, GBufferView, RenderSession, Result, Scene};
use std::fs;
use std::path::PathBuf;
use std::process;
use std::time::Instant;
use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, StructOpt)]
#[structopt(name = "atrous-tracer", about = "Path trace a scene and denoise it")]
struct Opt {
    /// Scene description (JSON)
    #[structopt(parse(from_os_str))]
    scene: PathBuf,

    /// Override the scene's iteration count
    #[structopt(short, long)]
    iterations: Option<u32>,

    /// Override the scene's trace depth
    #[structopt(long)]
    depth: Option<u32>,

    /// Denoise the final image
    #[structopt(short, long)]
    denoise: bool,

    #[structopt(long, default_value = "80")]
    filter_size: u32,

    #[structopt(long, default_value = "0.45")]
    color_phi: f32,

    #[structopt(long, default_value = "0.35")]
    normal_phi: f32,

    #[structopt(long, default_value = "0.2")]
    position_phi: f32,

    /// Jitter primary rays for antialiasing
    #[structopt(long)]
    jitter: bool,

    /// Compact terminated paths between bounces
    #[structopt(long)]
    compact: bool,

    #[structopt(short, long, parse(from_os_str), default_value = "image_out.png")]
    output: PathBuf,

    /// Also write depth/normal/position/color G-buffer views into this directory
    #[structopt(long, parse(from_os_str))]
    gbuffer_output: Option<PathBuf>,
}

fn run(opt: Opt) -> Result<()> {
    let load_start = Instant::now();
    let mut scene = Scene::load(&opt.scene)?;
    if let Some(iterations) = opt.iterations {
        scene.settings.iterations = iterations;
    }
    if let Some(depth) = opt.depth {
        scene.settings.trace_depth = depth;
    }
    scene.settings.jitter = opt.jitter;
    scene.settings.compact_paths = opt.compact;
    tracing::info!(
        scene = %opt.scene.display(),
        elapsed = ?load_start.elapsed(),
        "scene loaded"
    );

    let denoise = DenoiseSettings {
        enabled: opt.denoise,
        filter_size: opt.filter_size,
        color_phi: opt.color_phi,
        normal_phi: opt.normal_phi,
        position_phi: opt.position_phi,
    };
    let total = scene.settings.iterations;

    let mut session = RenderSession::init(scene)?;

    let trace_start = Instant::now();
    for iteration in 1..=total {
        // Filtering only matters for the image that gets written.
        let settings = DenoiseSettings {
            enabled: denoise.enabled && iteration == total,
            ..denoise
        };
        session.render_iteration(0, iteration, &settings)?;
        if iteration % 100 == 0 {
            tracing::info!(iteration, total, "progress");
        }
    }
    tracing::info!(iterations = total, elapsed = ?trace_start.elapsed(), "trace complete");

    let image = if denoise.enabled {
        session.show_denoised()
    } else {
        session.show_image()
    };
    image.save(&opt.output)?;
    tracing::info!(output = %opt.output.display(), "image written");

    if let Some(dir) = &opt.gbuffer_output {
        fs::create_dir_all(dir)?;
        for view in GBufferView::ALL.iter() {
            let path = dir.join(format!("{}.png", view.name()));
            session.show_gbuffer(*view).save(&path)?;
        }
        tracing::info!(dir = %dir.display(), "g-buffer written");
    }

    session.teardown();
    Ok(())
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run(Opt::from_args()) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}
