mod assembly;
mod config;
mod model;
mod viewer;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use image::RgbaImage;
use mcskin_rendering::{
    camera::{Camera, ProjectionParameters},
    pipeline::{GraphicsContext, GraphicsContextDescriptor, Scene, Size},
};
use mcskin_texture::legacy::{process_skin, MODERN_SKIN_HEIGHT, SKIN_WIDTH};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::assembly::SceneMeshes;
use crate::config::RenderConfig;

/// Field of view of the scene camera, in degrees.
const CAMERA_FOV: f32 = 60.0;

#[derive(Parser, Debug)]
#[clap(name = env!("CARGO_CRATE_NAME"), version)]
struct Args {
    /// Input skin PNG (64x64 modern or 64x32 legacy)
    #[arg(short, long)]
    input: PathBuf,

    /// Output PNG for the rendered frame
    #[arg(short, long)]
    output: PathBuf,

    /// Humanoid model in the indexed face-vertex text format
    #[arg(short, long)]
    model: PathBuf,

    /// Camera and body part placement configuration
    #[arg(long)]
    model_config: PathBuf,

    /// Optional background image
    #[arg(long)]
    background: Option<PathBuf>,

    /// Width of the rendered output frame
    #[arg(long, default_value_t = 800)]
    frame_width: u32,

    /// Height of the rendered output frame
    #[arg(long, default_value_t = 600)]
    frame_height: u32,

    /// Treat a legacy skin as the slim-arm variant
    #[arg(long)]
    thin_arms: bool,

    /// Preview the scene in a window before the frame is written
    #[arg(long)]
    keep_window: bool,

    /// MSAA sample count (falls back to 1 if the format does not support it)
    #[arg(long)]
    sample_count: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let skin = image::open(&args.input)
        .with_context(|| format!("failed to open skin {}", args.input.display()))?
        .into_rgba8();
    let skin = process_skin(skin, args.thin_arms).context("failed to process the skin texture")?;

    let background = args
        .background
        .as_deref()
        .map(|path| {
            image::open(path)
                .map(image::DynamicImage::into_rgba8)
                .with_context(|| format!("failed to open background {}", path.display()))
        })
        .transpose()?;

    let groups = model::load_model(&args.model, SKIN_WIDTH as f32, MODERN_SKIN_HEIGHT as f32)
        .with_context(|| format!("failed to load model {}", args.model.display()))?;
    let render_config = config::load_config(&args.model_config).with_context(|| {
        format!("failed to load model config {}", args.model_config.display())
    })?;
    let meshes = assembly::build_meshes(&groups, &render_config)
        .context("failed to assemble the scene meshes")?;

    if args.keep_window {
        viewer::run(&args, &render_config, &skin, background.as_ref(), &meshes).await?;
    }

    let frame_size = Size {
        width: args.frame_width,
        height: args.frame_height,
    };

    let context = GraphicsContext::new(GraphicsContextDescriptor::offscreen(
        (frame_size.width, frame_size.height),
        args.sample_count,
    ))
    .await
    .context("failed to initialize the graphics context")?;

    let mut scene = Scene::new(&context, scene_camera(&render_config, frame_size), frame_size);
    prepare_scene(&mut scene, &context, &skin, background.as_ref(), &meshes);

    scene.render(&context).context("failed to render the frame")?;
    let frame = scene
        .copy_output_texture(&context)
        .await
        .context("failed to read the frame back")?;

    frame
        .save(&args.output)
        .with_context(|| format!("failed to write output {}", args.output.display()))?;

    info!("wrote rendered frame to {}", args.output.display());

    Ok(())
}

fn scene_camera(config: &RenderConfig, size: Size) -> Camera {
    Camera::new(
        config.eye_position,
        config.eye_target,
        config.eye_up,
        ProjectionParameters::Perspective { fov: CAMERA_FOV },
        size,
    )
}

fn prepare_scene(
    scene: &mut Scene,
    context: &GraphicsContext,
    skin: &RgbaImage,
    background: Option<&RgbaImage>,
    meshes: &SceneMeshes,
) {
    scene.set_skin_texture(context, skin);
    if let Some(background) = background {
        scene.set_background(context, background);
    }
    scene.set_model_mesh(context, &meshes.model);
    if !meshes.overlay.is_empty() {
        scene.set_overlay_mesh(context, &meshes.overlay);
    }
}
