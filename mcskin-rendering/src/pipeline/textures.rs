use wgpu::{Buffer, Texture, TextureFormat, TextureUsages, TextureView};

use super::graphics_context::GraphicsContext;

#[derive(Debug)]
pub struct SceneTexture {
    pub(crate) texture: Texture,
    pub(crate) view: TextureView,
}

/// Row padding bookkeeping for reading a texture back into a buffer: wgpu
/// requires texture-to-buffer copy rows to be aligned to
/// `COPY_BYTES_PER_ROW_ALIGNMENT`.
#[derive(Debug, Clone)]
pub(crate) struct BufferDimensions {
    pub width: usize,
    pub height: usize,
    pub unpadded_bytes_per_row: usize,
    pub padded_bytes_per_row: u32,
}

impl BufferDimensions {
    pub fn new(width: usize, height: usize) -> Self {
        let bytes_per_pixel = std::mem::size_of::<u32>();
        let unpadded_bytes_per_row = width * bytes_per_pixel;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as usize;
        let padded_bytes_per_row_padding = (align - unpadded_bytes_per_row % align) % align;
        let padded_bytes_per_row = (unpadded_bytes_per_row + padded_bytes_per_row_padding) as u32;

        Self {
            width,
            height,
            unpadded_bytes_per_row,
            padded_bytes_per_row,
        }
    }

    pub fn size(&self) -> u64 {
        self.padded_bytes_per_row as u64 * self.height as u64
    }
}

#[derive(Debug)]
pub(crate) struct SceneTextures {
    pub depth_texture: SceneTexture,
    pub output_texture: SceneTexture,
    pub multisampled_output_texture: Option<SceneTexture>,
    pub texture_output_buffer: Buffer,
    pub texture_output_buffer_dimensions: BufferDimensions,
}

pub(crate) fn create_texture(
    context: &GraphicsContext,
    width: u32,
    height: u32,
    format: TextureFormat,
    usage: TextureUsages,
    label: Option<&str>,
    sample_count: u32,
) -> SceneTexture {
    let texture = context.device.create_texture(&wgpu::TextureDescriptor {
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        label,
        view_formats: &[],
    });
    let view = texture.create_view(&Default::default());

    SceneTexture { texture, view }
}
