use bytemuck::Pod;
use wgpu::{
    util::{BufferInitDescriptor, DeviceExt},
    BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout, Buffer, BufferUsages, Device,
};

use super::textures::BufferDimensions;
use crate::errors::Result;

pub(crate) fn create_buffer_and_bind_group<T: Pod>(
    device: &Device,
    label: &str,
    layout: &BindGroupLayout,
    value: &[T],
) -> (Buffer, BindGroup) {
    let buffer = device.create_buffer_init(&BufferInitDescriptor {
        label: Some((label.to_owned() + " Buffer").as_str()),
        contents: bytemuck::cast_slice(value),
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
    });

    let bind_group = device.create_bind_group(&BindGroupDescriptor {
        label: Some((label.to_owned() + " Bind Group").as_str()),
        layout,
        entries: &[BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
    });

    (buffer, bind_group)
}

/// Maps the readback buffer and returns the frame's bytes with the per-row
/// copy padding stripped.
pub(crate) async fn read_buffer(
    device: &Device,
    buffer: &Buffer,
    dimensions: &BufferDimensions,
) -> Result<Vec<u8>> {
    let buffer_slice = buffer.slice(..);

    let (tx, rx) = tokio::sync::oneshot::channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    let _ = device.poll(wgpu::Maintain::Wait);
    rx.await??;

    let padded_data = buffer_slice.get_mapped_range();
    let mut pixels = Vec::with_capacity(dimensions.unpadded_bytes_per_row * dimensions.height);
    for row in padded_data.chunks_exact(dimensions.padded_bytes_per_row as usize) {
        pixels.extend_from_slice(&row[..dimensions.unpadded_bytes_per_row]);
    }

    drop(padded_data);
    buffer.unmap();

    Ok(pixels)
}
