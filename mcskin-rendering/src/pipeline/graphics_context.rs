use std::{borrow::Cow, mem};

use wgpu::{
    vertex_attr_array, BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry,
    BindingType, BlendState, BufferAddress, BufferBindingType, BufferSize, ColorTargetState,
    ColorWrites, CompareFunction, DepthStencilState, FragmentState, FrontFace, MultisampleState,
    PipelineLayout, PipelineLayoutDescriptor, PresentMode, PrimitiveState, RenderPipeline,
    RenderPipelineDescriptor, SamplerBindingType, ShaderModuleDescriptor, ShaderStages,
    TextureSampleType, TextureViewDimension, VertexBufferLayout, VertexState,
};
pub use wgpu::{Adapter, Backends, Device, Instance, Queue, Surface, SurfaceConfiguration, TextureFormat};

use crate::{
    errors::{RenderingError, Result},
    primitives::vertex::Vertex,
};

use super::scene::Size;

#[derive(Debug)]
pub struct GraphicsContext<'a> {
    pub instance: Instance,
    pub device: Device,
    pub queue: Queue,
    pub surface: Option<Surface<'a>>,
    pub surface_config: Option<SurfaceConfiguration>,
    pub texture_format: TextureFormat,
    pub adapter: Adapter,

    pub pipelines: ScenePipelines,
    pub layouts: GraphicsContextLayouts,
    pub sample_count: u32,
}

/// The three draw configurations of a frame: opaque base geometry, the
/// alpha-blended overlay geometry, and the fullscreen background quad.
#[derive(Debug)]
pub struct ScenePipelines {
    pub model: RenderPipeline,
    pub overlay: RenderPipeline,
    pub background: RenderPipeline,
}

#[derive(Debug)]
pub struct GraphicsContextLayouts {
    pub transform_bind_group_layout: BindGroupLayout,
    pub texture_sampler_bind_group_layout: BindGroupLayout,
    pub render_mode_bind_group_layout: BindGroupLayout,
    pub scene_pipeline_layout: PipelineLayout,
    pub background_pipeline_layout: PipelineLayout,
}

pub type SurfaceProvider<'a> = dyn FnOnce(&Instance) -> Option<Surface<'a>> + 'a + Send;

pub struct GraphicsContextDescriptor<'a> {
    pub backends: Option<Backends>,
    pub surface_provider: Box<SurfaceProvider<'a>>,
    pub default_size: (u32, u32),
    pub sample_count: Option<u32>,
}

impl<'a> GraphicsContextDescriptor<'a> {
    /// A context with no surface, rendering to an offscreen target only.
    pub fn offscreen(default_size: (u32, u32), sample_count: Option<u32>) -> Self {
        Self {
            backends: None,
            surface_provider: Box::new(|_| None),
            default_size,
            sample_count,
        }
    }
}

impl<'a> GraphicsContext<'a> {
    pub const DEFAULT_TEXTURE_FORMAT: TextureFormat = TextureFormat::Rgba8Unorm;
    pub const DEPTH_TEXTURE_FORMAT: TextureFormat = TextureFormat::Depth32Float;

    pub async fn new(descriptor: GraphicsContextDescriptor<'a>) -> Result<Self> {
        let backends = wgpu::util::backend_bits_from_env()
            .or(descriptor.backends)
            .unwrap_or_else(Backends::all);

        let instance = Instance::new(wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let mut surface = (descriptor.surface_provider)(&instance);

        let adapter =
            wgpu::util::initialize_adapter_from_env_or_default(&instance, surface.as_ref())
                .await
                .ok_or(RenderingError::NoAdapterFound)?;

        let adapter_info = adapter.get_info();
        tracing::info!(
            "using adapter {} ({:?})",
            adapter_info.name,
            adapter_info.backend
        );

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await?;

        let (default_width, default_height) = descriptor.default_size;

        let mut surface_config = surface
            .as_mut()
            .map(|surface| {
                surface
                    .get_default_config(&adapter, default_width, default_height)
                    .ok_or(RenderingError::SurfaceNotSupported)
            })
            .transpose()?;

        if let (Some(surface), Some(config)) = (&surface, &mut surface_config) {
            config.present_mode = PresentMode::AutoVsync;
            surface.configure(&device, config);
        }

        let texture_format = surface_config
            .as_ref()
            .map(|config| config.format)
            .unwrap_or(Self::DEFAULT_TEXTURE_FORMAT);

        let sample_count = descriptor.sample_count.unwrap_or(4);
        let sample_flags = adapter.get_texture_format_features(texture_format).flags;
        let sample_count = if sample_flags.sample_count_supported(sample_count) {
            sample_count
        } else {
            1
        };

        // Bind group layout for the view-projection matrix uniform
        let transform_bind_group_layout =
            device.create_bind_group_layout(&BindGroupLayoutDescriptor {
                entries: &[BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::VERTEX,
                    ty: BindingType::Buffer {
                        ty: BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: BufferSize::new(64),
                    },
                    count: None,
                }],
                label: Some("Transform Bind Group Layout"),
            });

        let texture_sampler_bind_group_layout =
            device.create_bind_group_layout(&BindGroupLayoutDescriptor {
                label: Some("Texture Bind Group Layout"),
                entries: &[
                    BindGroupLayoutEntry {
                        binding: 0,
                        visibility: ShaderStages::FRAGMENT,
                        ty: BindingType::Texture {
                            multisampled: false,
                            view_dimension: TextureViewDimension::D2,
                            sample_type: TextureSampleType::Float { filterable: true },
                        },
                        count: None,
                    },
                    BindGroupLayoutEntry {
                        binding: 1,
                        visibility: ShaderStages::FRAGMENT,
                        ty: BindingType::Sampler(SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        // The render mode uniform carries the force_opaque switch that the
        // base geometry pass uses to ignore the texture's alpha channel.
        let render_mode_bind_group_layout =
            device.create_bind_group_layout(&BindGroupLayoutDescriptor {
                entries: &[BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Buffer {
                        ty: BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: BufferSize::new(16),
                    },
                    count: None,
                }],
                label: Some("Render Mode Bind Group Layout"),
            });

        let scene_pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[
                &transform_bind_group_layout,
                &texture_sampler_bind_group_layout,
                &render_mode_bind_group_layout,
            ],
            push_constant_ranges: &[],
        });

        let background_pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Background Pipeline Layout"),
            bind_group_layouts: &[&texture_sampler_bind_group_layout],
            push_constant_ranges: &[],
        });

        let scene_shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("shader.wgsl"))),
        });

        let background_shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("Background Shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("background.wgsl"))),
        });

        let vertex_buffer_layout = VertexBufferLayout {
            array_stride: mem::size_of::<Vertex>() as BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &vertex_attr_array![0 => Float32x3, 1 => Float32x2],
        };

        let scene_pipeline = |label: &str, blend: Option<BlendState>| {
            device.create_render_pipeline(&RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&scene_pipeline_layout),
                vertex: VertexState {
                    module: &scene_shader,
                    entry_point: "vs_main",
                    compilation_options: Default::default(),
                    buffers: &[vertex_buffer_layout.clone()],
                },
                primitive: PrimitiveState {
                    cull_mode: None,
                    front_face: FrontFace::Cw,
                    ..Default::default()
                },
                depth_stencil: Some(DepthStencilState {
                    format: Self::DEPTH_TEXTURE_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: CompareFunction::LessEqual,
                    stencil: Default::default(),
                    bias: Default::default(),
                }),
                multisample: MultisampleState {
                    count: sample_count,
                    alpha_to_coverage_enabled: false,
                    ..Default::default()
                },
                fragment: Some(FragmentState {
                    module: &scene_shader,
                    entry_point: "fs_main",
                    compilation_options: Default::default(),
                    targets: &[Some(ColorTargetState {
                        format: texture_format,
                        blend,
                        write_mask: ColorWrites::ALL,
                    })],
                }),
                multiview: None,
            })
        };

        let model_pipeline = scene_pipeline("Model Pipeline", None);
        let overlay_pipeline =
            scene_pipeline("Overlay Pipeline", Some(BlendState::ALPHA_BLENDING));

        // The background quad is drawn below everything: it never writes
        // depth and always passes the depth test.
        let background_pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("Background Pipeline"),
            layout: Some(&background_pipeline_layout),
            vertex: VertexState {
                module: &background_shader,
                entry_point: "vs_main",
                compilation_options: Default::default(),
                buffers: &[vertex_buffer_layout.clone()],
            },
            primitive: PrimitiveState {
                cull_mode: None,
                front_face: FrontFace::Cw,
                ..Default::default()
            },
            depth_stencil: Some(DepthStencilState {
                format: Self::DEPTH_TEXTURE_FORMAT,
                depth_write_enabled: false,
                depth_compare: CompareFunction::Always,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: MultisampleState {
                count: sample_count,
                alpha_to_coverage_enabled: false,
                ..Default::default()
            },
            fragment: Some(FragmentState {
                module: &background_shader,
                entry_point: "fs_main",
                compilation_options: Default::default(),
                targets: &[Some(ColorTargetState {
                    format: texture_format,
                    blend: None,
                    write_mask: ColorWrites::ALL,
                })],
            }),
            multiview: None,
        });

        Ok(GraphicsContext {
            instance,
            device,
            queue,
            surface,
            surface_config,
            texture_format,
            adapter,
            pipelines: ScenePipelines {
                model: model_pipeline,
                overlay: overlay_pipeline,
                background: background_pipeline,
            },
            layouts: GraphicsContextLayouts {
                transform_bind_group_layout,
                texture_sampler_bind_group_layout,
                render_mode_bind_group_layout,
                scene_pipeline_layout,
                background_pipeline_layout,
            },
            sample_count,
        })
    }

    pub fn set_surface_size(&mut self, size: Size) {
        if let Some(config) = &mut self.surface_config {
            config.width = size.width.max(1);
            config.height = size.height.max(1);

            if let Some(surface) = &self.surface {
                surface.configure(&self.device, config);
            }
        }
    }
}
