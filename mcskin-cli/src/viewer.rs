//! Live preview window for the scene.

use std::sync::Arc;

use anyhow::{Context, Result};
use image::RgbaImage;
use mcskin_rendering::pipeline::graphics_context::Instance;
use mcskin_rendering::pipeline::{GraphicsContext, GraphicsContextDescriptor, Scene, Size};
use tracing::warn;
use winit::{
    dpi::PhysicalSize,
    event::{Event, WindowEvent},
    event_loop::EventLoop,
    window::WindowBuilder,
};

use crate::assembly::SceneMeshes;
use crate::config::RenderConfig;
use crate::Args;

/// Opens a window and presents the scene until the user closes it.
pub async fn run(
    args: &Args,
    render_config: &RenderConfig,
    skin: &RgbaImage,
    background: Option<&RgbaImage>,
    meshes: &SceneMeshes,
) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to create the event loop")?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Minecraft Skin Renderer")
            .with_inner_size(PhysicalSize::new(args.frame_width, args.frame_height))
            .build(&event_loop)
            .context("failed to create the preview window")?,
    );

    let surface_window = window.clone();
    let mut context = GraphicsContext::new(GraphicsContextDescriptor {
        backends: None,
        surface_provider: Box::new(move |instance: &Instance| {
            instance.create_surface(surface_window).ok()
        }),
        default_size: (args.frame_width, args.frame_height),
        sample_count: args.sample_count,
    })
    .await
    .context("failed to initialize the windowed graphics context")?;

    let size = Size {
        width: args.frame_width,
        height: args.frame_height,
    };
    let mut scene = Scene::new(&context, crate::scene_camera(render_config, size), size);
    crate::prepare_scene(&mut scene, &context, skin, background, meshes);

    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => elwt.exit(),
            Event::WindowEvent {
                event: WindowEvent::Resized(new_size),
                ..
            } => {
                let new_size = Size {
                    width: new_size.width.max(1),
                    height: new_size.height.max(1),
                };
                context.set_surface_size(new_size);
                scene.resize(&context, new_size);
                window.request_redraw();
            }
            Event::WindowEvent {
                event: WindowEvent::RedrawRequested,
                ..
            } => {
                if let Err(error) = scene.render_to_surface(&context) {
                    warn!("failed to present a frame: {error}");
                }
            }
            Event::AboutToWait => window.request_redraw(),
            _ => {}
        })
        .context("event loop failed")?;

    Ok(())
}
