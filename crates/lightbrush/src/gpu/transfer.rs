//! Moving RGBA8 frames between host memory and textures.
//!
//! The plugin itself never reads back; these helpers serve hosts that work with
//! files and the integration tests.

use std::sync::mpsc;

use crate::error::PluginError;
use crate::types::Viewport;

const BYTES_PER_PIXEL: u32 = 4;

/// Uploads tightly packed RGBA8 rows as a sampleable input texture.
pub fn upload_rgba8(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    viewport: Viewport,
    bytes: &[u8],
) -> Result<wgpu::Texture, PluginError> {
    if viewport.is_empty() {
        return Err(PluginError::EmptyViewport(viewport));
    }
    if bytes.len() != viewport.pixel_count() * BYTES_PER_PIXEL as usize {
        return Err(PluginError::InvalidInput);
    }

    use wgpu::util::DeviceExt;
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some("input frame"),
            size: extent(viewport),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        bytes,
    );
    Ok(texture)
}

/// Creates a texture that can receive a presented canvas and be read back.
pub fn create_output(device: &wgpu::Device, viewport: Viewport) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("output frame"),
        size: extent(viewport),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::COPY_DST | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

/// Reads an 8-bit RGBA texture back into tightly packed rows.
pub fn read_rgba8(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
) -> Result<Vec<u8>, PluginError> {
    if !matches!(
        texture.format(),
        wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb
    ) {
        return Err(PluginError::OutputFormat(format!("{:?}", texture.format())));
    }

    let (width, height) = (texture.width(), texture.height());
    let unpadded_bytes_per_row = width * BYTES_PER_PIXEL;
    let padded_bytes_per_row = unpadded_bytes_per_row
        .div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
        * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("readback buffer"),
        size: u64::from(padded_bytes_per_row) * u64::from(height),
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("readback encoder"),
    });
    encoder.copy_texture_to_buffer(
        texture.as_image_copy(),
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        texture.size(),
    );
    queue.submit(Some(encoder.finish()));

    let slice = buffer.slice(..);
    let (sender, receiver) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });
    device
        .poll(wgpu::PollType::Wait)
        .map_err(|err| PluginError::Device(format!("device poll failed: {err}")))?;
    receiver
        .recv()
        .map_err(|_| PluginError::Device("readback callback never ran".into()))?
        .map_err(|err| PluginError::Device(format!("readback mapping failed: {err}")))?;

    let mapped = slice.get_mapped_range();
    let mut frame = Vec::with_capacity((unpadded_bytes_per_row * height) as usize);
    for row in mapped
        .chunks(padded_bytes_per_row as usize)
        .take(height as usize)
    {
        frame.extend_from_slice(&row[..unpadded_bytes_per_row as usize]);
    }
    drop(mapped);
    buffer.unmap();
    Ok(frame)
}

pub(crate) fn extent(viewport: Viewport) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: viewport.width,
        height: viewport.height,
        depth_or_array_layers: 1,
    }
}
