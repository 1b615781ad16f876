use crate::compile::{compile_kernel, compile_vertex_shader, KernelKind};
use crate::error::PluginError;

/// Resources every kernel pipeline shares.
pub(crate) struct KernelLayouts {
    pub uniform_layout: wgpu::BindGroupLayout,
    pub vertex_module: wgpu::ShaderModule,
    pub sampler: wgpu::Sampler,
}

impl KernelLayouts {
    pub fn new(device: &wgpu::Device) -> Result<Self, PluginError> {
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let vertex_module = compile_vertex_shader(device)?;

        // Kernels only ever fetch exact texels.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("canvas sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Ok(Self {
            uniform_layout,
            vertex_module,
            sampler,
        })
    }
}

pub(crate) struct KernelPipeline {
    pub kind: KernelKind,
    pub pipeline: wgpu::RenderPipeline,
    channel_layout: wgpu::BindGroupLayout,
}

impl KernelPipeline {
    pub fn new(
        device: &wgpu::Device,
        layouts: &KernelLayouts,
        kind: KernelKind,
        target_format: wgpu::TextureFormat,
    ) -> Result<Self, PluginError> {
        let fragment_module = compile_kernel(device, kind)?;

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let channel_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(kind.name()),
            entries: &build_channel_layout_entries(kind.channels().len()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(kind.name()),
            bind_group_layouts: &[&layouts.uniform_layout, &channel_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(kind.name()),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &layouts.vertex_module,
                entry_point: Some("main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some("main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview: None,
            cache: None,
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(PluginError::KernelBuild {
                kernel: kind.name(),
                message: err.to_string(),
            });
        }

        Ok(Self {
            kind,
            pipeline,
            channel_layout,
        })
    }

    /// Binds `views` to the kernel's channels in declaration order.
    pub fn bind(
        &self,
        device: &wgpu::Device,
        sampler: &wgpu::Sampler,
        views: &[&wgpu::TextureView],
    ) -> wgpu::BindGroup {
        debug_assert_eq!(views.len(), self.kind.channels().len());
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(self.kind.name()),
            layout: &self.channel_layout,
            entries: &build_channel_entries(views, sampler),
        })
    }
}

fn build_channel_entries<'a>(
    views: &[&'a wgpu::TextureView],
    sampler: &'a wgpu::Sampler,
) -> Vec<wgpu::BindGroupEntry<'a>> {
    let mut entries = Vec::with_capacity(views.len() * 2);
    for (index, view) in views.iter().enumerate() {
        entries.push(wgpu::BindGroupEntry {
            binding: (index as u32) * 2,
            resource: wgpu::BindingResource::TextureView(view),
        });
        entries.push(wgpu::BindGroupEntry {
            binding: (index as u32) * 2 + 1,
            resource: wgpu::BindingResource::Sampler(sampler),
        });
    }
    entries
}

/// Velocity may be stored as `R32Float`, so every channel is declared non-filterable.
fn build_channel_layout_entries(count: usize) -> Vec<wgpu::BindGroupLayoutEntry> {
    let mut entries = Vec::with_capacity(count * 2);
    for index in 0..count as u32 {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: index * 2,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        });
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: index * 2 + 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
            count: None,
        });
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_layout_alternates_texture_and_sampler() {
        let entries = build_channel_layout_entries(3);
        assert_eq!(entries.len(), 6);
        for (binding, entry) in entries.iter().enumerate() {
            assert_eq!(entry.binding, binding as u32);
            let is_texture = matches!(entry.ty, wgpu::BindingType::Texture { .. });
            assert_eq!(is_texture, binding % 2 == 0);
        }
    }
}
