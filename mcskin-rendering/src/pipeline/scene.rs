use glam::{Vec2, Vec3};
use image::RgbaImage;
use tracing::instrument;
use wgpu::{
    util::{BufferInitDescriptor, DeviceExt, TextureDataOrder},
    AddressMode, BindGroup, BindGroupDescriptor, BindGroupEntry, Buffer, BufferDescriptor,
    BufferUsages, Color, CommandEncoder, Extent3d, FilterMode, ImageCopyBuffer, ImageCopyTexture,
    ImageDataLayout, IndexFormat, LoadOp, Operations, RenderPassColorAttachment,
    RenderPassDepthStencilAttachment, SamplerDescriptor, StoreOp, TextureDescriptor,
    TextureDimension, TextureUsages, TextureView,
};

use crate::{
    camera::Camera,
    errors::{RenderingError, Result},
    primitives::{MeshPrimitive, Quad},
};

use super::{
    buffer::{create_buffer_and_bind_group, read_buffer},
    graphics_context::GraphicsContext,
    textures::{create_texture, BufferDimensions, SceneTexture, SceneTextures},
};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

struct MeshBuffers {
    vertex_buffer: Buffer,
    index_buffer: Buffer,
    index_count: u32,
}

struct BackgroundLayer {
    bind_group: BindGroup,
    buffers: MeshBuffers,
}

/// A renderable scene: a camera, the skin texture, the base and overlay
/// meshes, and the offscreen targets a frame is drawn into and read back
/// from.
pub struct Scene {
    camera: Camera,
    viewport_size: Size,
    transform_matrix_buffer: Buffer,
    transform_bind_group: BindGroup,
    model_mode_bind_group: BindGroup,
    overlay_mode_bind_group: BindGroup,
    skin_bind_group: Option<BindGroup>,
    background: Option<BackgroundLayer>,
    model_buffers: Option<MeshBuffers>,
    overlay_buffers: Option<MeshBuffers>,
    textures: SceneTextures,
}

impl Scene {
    pub fn new(context: &GraphicsContext, mut camera: Camera, viewport_size: Size) -> Self {
        let device = &context.device;

        camera.size = viewport_size;

        let (transform_matrix_buffer, transform_bind_group) = create_buffer_and_bind_group(
            device,
            "Transform Matrix",
            &context.layouts.transform_bind_group_layout,
            camera.view_projection_matrix().as_ref(),
        );

        // One render-mode uniform per pass: the base geometry ignores the
        // texture's alpha channel, the overlay honors it.
        let (_, model_mode_bind_group) = create_buffer_and_bind_group(
            device,
            "Model Render Mode",
            &context.layouts.render_mode_bind_group_layout,
            &[1u32, 0, 0, 0],
        );
        let (_, overlay_mode_bind_group) = create_buffer_and_bind_group(
            device,
            "Overlay Render Mode",
            &context.layouts.render_mode_bind_group_layout,
            &[0u32, 0, 0, 0],
        );

        let textures = Self::create_scene_textures(context, viewport_size);

        Self {
            camera,
            viewport_size,
            transform_matrix_buffer,
            transform_bind_group,
            model_mode_bind_group,
            overlay_mode_bind_group,
            skin_bind_group: None,
            background: None,
            model_buffers: None,
            overlay_buffers: None,
            textures,
        }
    }

    fn create_scene_textures(context: &GraphicsContext, viewport_size: Size) -> SceneTextures {
        let depth_texture = create_texture(
            context,
            viewport_size.width,
            viewport_size.height,
            GraphicsContext::DEPTH_TEXTURE_FORMAT,
            TextureUsages::RENDER_ATTACHMENT,
            Some("Depth Texture"),
            context.sample_count,
        );

        let multisampled_output_texture = (context.sample_count > 1).then(|| {
            create_texture(
                context,
                viewport_size.width,
                viewport_size.height,
                context.texture_format,
                TextureUsages::RENDER_ATTACHMENT,
                Some("Multisampled Output Texture"),
                context.sample_count,
            )
        });

        let output_texture = create_texture(
            context,
            viewport_size.width,
            viewport_size.height,
            context.texture_format,
            TextureUsages::RENDER_ATTACHMENT | TextureUsages::COPY_SRC,
            Some("Final Output Texture"),
            1,
        );

        let texture_output_buffer_dimensions =
            BufferDimensions::new(viewport_size.width as usize, viewport_size.height as usize);

        let texture_output_buffer = context.device.create_buffer(&BufferDescriptor {
            size: texture_output_buffer_dimensions.size(),
            usage: BufferUsages::COPY_DST | BufferUsages::MAP_READ,
            label: Some("Output Texture Buffer"),
            mapped_at_creation: false,
        });

        SceneTextures {
            depth_texture,
            output_texture,
            multisampled_output_texture,
            texture_output_buffer,
            texture_output_buffer_dimensions,
        }
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn viewport_size(&self) -> Size {
        self.viewport_size
    }

    /// Re-uploads the camera matrix after camera changes.
    pub fn update(&mut self, context: &GraphicsContext) {
        context.queue.write_buffer(
            &self.transform_matrix_buffer,
            0,
            bytemuck::cast_slice(self.camera.view_projection_matrix().as_ref()),
        );
    }

    /// Recreates the render targets for a new viewport size.
    pub fn resize(&mut self, context: &GraphicsContext, viewport_size: Size) {
        self.viewport_size = viewport_size;
        self.camera.size = viewport_size;
        self.textures = Self::create_scene_textures(context, viewport_size);
        self.update(context);
    }

    pub fn set_skin_texture(&mut self, context: &GraphicsContext, skin: &RgbaImage) {
        let texture = upload_texture(context, skin, Some("Skin Texture"));
        // Pixel-art texture, sampled with nearest filtering.
        let bind_group = texture_bind_group(context, &texture, FilterMode::Nearest, "Skin");
        self.skin_bind_group = Some(bind_group);
    }

    pub fn set_background(&mut self, context: &GraphicsContext, background: &RgbaImage) {
        let texture = upload_texture(context, background, Some("Background Texture"));
        let bind_group = texture_bind_group(context, &texture, FilterMode::Linear, "Background");

        // Fullscreen quad in normalized device coordinates.
        let quad = Quad::new(
            Vec3::new(-1.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec2::ZERO,
            Vec2::ONE,
        );
        let buffers = mesh_buffers(context, &quad, "Background");

        self.background = Some(BackgroundLayer {
            bind_group,
            buffers,
        });
    }

    pub fn set_model_mesh(&mut self, context: &GraphicsContext, mesh: &dyn MeshPrimitive) {
        self.model_buffers = Some(mesh_buffers(context, mesh, "Model"));
    }

    pub fn set_overlay_mesh(&mut self, context: &GraphicsContext, mesh: &dyn MeshPrimitive) {
        self.overlay_buffers = Some(mesh_buffers(context, mesh, "Overlay"));
    }

    /// Renders a frame into the offscreen output texture and queues its copy
    /// into the readback buffer.
    #[instrument(skip(self, context))]
    pub fn render(&mut self, context: &GraphicsContext) -> Result<()> {
        let (attachment, resolve_target) = match &self.textures.multisampled_output_texture {
            Some(multisampled) => (&multisampled.view, Some(&self.textures.output_texture.view)),
            None => (&self.textures.output_texture.view, None),
        };

        let mut encoder = context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Scene Rendering"),
            });

        self.record_draws(context, &mut encoder, attachment, resolve_target)?;

        let dimensions = &self.textures.texture_output_buffer_dimensions;
        encoder.copy_texture_to_buffer(
            ImageCopyTexture {
                aspect: wgpu::TextureAspect::All,
                texture: &self.textures.output_texture.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            ImageCopyBuffer {
                buffer: &self.textures.texture_output_buffer,
                layout: ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(dimensions.padded_bytes_per_row),
                    rows_per_image: Some(self.viewport_size.height),
                },
            },
            Extent3d {
                width: self.viewport_size.width,
                height: self.viewport_size.height,
                depth_or_array_layers: 1,
            },
        );

        context.queue.submit(Some(encoder.finish()));

        Ok(())
    }

    /// Renders a frame to the context's window surface and presents it.
    pub fn render_to_surface(&mut self, context: &GraphicsContext) -> Result<()> {
        let surface = match &context.surface {
            Some(surface) => surface,
            None => return self.render(context),
        };

        let frame = surface.get_current_texture()?;
        let frame_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let (attachment, resolve_target) = match &self.textures.multisampled_output_texture {
            Some(multisampled) => (&multisampled.view, Some(&frame_view)),
            None => (&frame_view, None),
        };

        let mut encoder = context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Scene Rendering (surface)"),
            });

        self.record_draws(context, &mut encoder, attachment, resolve_target)?;

        context.queue.submit(Some(encoder.finish()));
        frame.present();

        Ok(())
    }

    /// Records the frame's single render pass: background quad below
    /// everything, then the opaque base geometry, then the blended overlay.
    fn record_draws(
        &self,
        context: &GraphicsContext,
        encoder: &mut CommandEncoder,
        attachment: &TextureView,
        resolve_target: Option<&TextureView>,
    ) -> Result<()> {
        let skin_bind_group = self
            .skin_bind_group
            .as_ref()
            .ok_or(RenderingError::SkinTextureNotSet)?;

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Render Pass"),
            color_attachments: &[Some(RenderPassColorAttachment {
                view: attachment,
                resolve_target,
                ops: Operations {
                    load: LoadOp::Clear(Color::TRANSPARENT),
                    store: StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                view: &self.textures.depth_texture.view,
                depth_ops: Some(Operations {
                    load: LoadOp::Clear(1.0),
                    store: StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if let Some(background) = &self.background {
            rpass.set_pipeline(&context.pipelines.background);
            rpass.set_bind_group(0, &background.bind_group, &[]);
            rpass.set_vertex_buffer(0, background.buffers.vertex_buffer.slice(..));
            rpass.set_index_buffer(background.buffers.index_buffer.slice(..), IndexFormat::Uint16);
            rpass.draw_indexed(0..background.buffers.index_count, 0, 0..1);
        }

        if let Some(model) = &self.model_buffers {
            rpass.set_pipeline(&context.pipelines.model);
            rpass.set_bind_group(0, &self.transform_bind_group, &[]);
            rpass.set_bind_group(1, skin_bind_group, &[]);
            rpass.set_bind_group(2, &self.model_mode_bind_group, &[]);
            rpass.set_vertex_buffer(0, model.vertex_buffer.slice(..));
            rpass.set_index_buffer(model.index_buffer.slice(..), IndexFormat::Uint16);
            rpass.draw_indexed(0..model.index_count, 0, 0..1);
        }

        if let Some(overlay) = &self.overlay_buffers {
            rpass.set_pipeline(&context.pipelines.overlay);
            rpass.set_bind_group(0, &self.transform_bind_group, &[]);
            rpass.set_bind_group(1, skin_bind_group, &[]);
            rpass.set_bind_group(2, &self.overlay_mode_bind_group, &[]);
            rpass.set_vertex_buffer(0, overlay.vertex_buffer.slice(..));
            rpass.set_index_buffer(overlay.index_buffer.slice(..), IndexFormat::Uint16);
            rpass.draw_indexed(0..overlay.index_count, 0, 0..1);
        }

        Ok(())
    }

    /// Maps the readback buffer and assembles the last offscreen frame.
    pub async fn copy_output_texture(&self, context: &GraphicsContext<'_>) -> Result<RgbaImage> {
        let dimensions = &self.textures.texture_output_buffer_dimensions;

        let pixels = read_buffer(
            &context.device,
            &self.textures.texture_output_buffer,
            dimensions,
        )
        .await?;

        RgbaImage::from_raw(dimensions.width as u32, dimensions.height as u32, pixels).ok_or(
            RenderingError::OutputImageError {
                width: dimensions.width as u32,
                height: dimensions.height as u32,
            },
        )
    }
}

fn upload_texture(
    context: &GraphicsContext,
    image: &RgbaImage,
    label: Option<&str>,
) -> SceneTexture {
    let texture = context.device.create_texture_with_data(
        &context.queue,
        &TextureDescriptor {
            size: Extent3d {
                width: image.width(),
                height: image.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: TextureUsages::TEXTURE_BINDING,
            label,
            view_formats: &[],
        },
        TextureDataOrder::LayerMajor,
        image.as_raw(),
    );
    let view = texture.create_view(&Default::default());

    SceneTexture { texture, view }
}

fn texture_bind_group(
    context: &GraphicsContext,
    texture: &SceneTexture,
    filter: FilterMode,
    label: &str,
) -> BindGroup {
    let sampler = context.device.create_sampler(&SamplerDescriptor {
        label: Some(label),
        address_mode_u: AddressMode::ClampToEdge,
        address_mode_v: AddressMode::ClampToEdge,
        address_mode_w: AddressMode::ClampToEdge,
        mag_filter: filter,
        min_filter: filter,
        mipmap_filter: FilterMode::Nearest,
        ..Default::default()
    });

    context.device.create_bind_group(&BindGroupDescriptor {
        layout: &context.layouts.texture_sampler_bind_group_layout,
        entries: &[
            BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&sampler),
            },
        ],
        label: Some(label),
    })
}

fn mesh_buffers(context: &GraphicsContext, mesh: &dyn MeshPrimitive, label: &str) -> MeshBuffers {
    let vertices = mesh.vertices();
    let indices = mesh.indices();

    let vertex_buffer = context.device.create_buffer_init(&BufferInitDescriptor {
        label: Some((label.to_owned() + " Vertex Buffer").as_str()),
        contents: bytemuck::cast_slice(&vertices),
        usage: BufferUsages::VERTEX,
    });

    let index_buffer = context.device.create_buffer_init(&BufferInitDescriptor {
        label: Some((label.to_owned() + " Index Buffer").as_str()),
        contents: bytemuck::cast_slice(&indices),
        usage: BufferUsages::INDEX,
    });

    MeshBuffers {
        vertex_buffer,
        index_buffer,
        index_count: indices.len() as u32,
    }
}
