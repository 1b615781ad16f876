use tracing::debug;

use crate::backend::CanvasBackend;
use crate::canvas::SurfacePair;
use crate::compile::KernelKind;
use crate::error::PluginError;
use crate::kernel::KernelParams;
use crate::types::{Variant, Viewport};

use super::context::GpuContext;
use super::pipeline::{KernelLayouts, KernelPipeline};
use super::transfer::{self, extent};
use super::uniforms::KernelUniforms;

/// Format of the color pair; presenting copies it verbatim, so outputs match it.
pub const CANVAS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

struct CanvasTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl CanvasTexture {
    fn new(device: &wgpu::Device, label: &str, viewport: Viewport, format: wgpu::TextureFormat) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: extent(viewport),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

enum Kernels {
    Simple(KernelPipeline),
    Advanced {
        velocity: KernelPipeline,
        color: KernelPipeline,
    },
}

struct Canvas {
    viewport: Viewport,
    kernels: Kernels,
    color: SurfacePair<CanvasTexture>,
    velocity: Option<SurfacePair<CanvasTexture>>,
}

/// Canvas state held in GPU textures and advanced with render passes.
pub struct GpuBackend {
    context: GpuContext,
    layouts: KernelLayouts,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    canvas: Option<Canvas>,
}

impl GpuBackend {
    pub fn new(context: GpuContext) -> Result<Self, PluginError> {
        let device = &context.device;
        let layouts = KernelLayouts::new(device)?;

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("kernel params"),
            size: std::mem::size_of::<KernelUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("kernel params"),
            layout: &layouts.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Ok(Self {
            context,
            layouts,
            uniform_buffer,
            uniform_bind_group,
            canvas: None,
        })
    }

    pub fn context(&self) -> &GpuContext {
        &self.context
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.canvas.as_ref().map(|canvas| canvas.viewport)
    }

    /// Reads back the current color buffer, for diagnostics and tests.
    pub fn read_current_color(&self) -> Result<Vec<u8>, PluginError> {
        let canvas = self.canvas.as_ref().ok_or(PluginError::NotInitialised)?;
        transfer::read_rgba8(
            &self.context.device,
            &self.context.queue,
            &canvas.color.current().texture,
        )
    }

    fn canvas(&self) -> Result<&Canvas, PluginError> {
        self.canvas.as_ref().ok_or(PluginError::NotInitialised)
    }

    /// Runs `encode` inside a validation scope and submits the result.
    fn submit(
        &self,
        label: &str,
        encode: impl FnOnce(&mut wgpu::CommandEncoder),
    ) -> Result<(), PluginError> {
        let device = &self.context.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let mut encoder =
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });
        encode(&mut encoder);
        self.context.queue.submit(Some(encoder.finish()));
        match pollster::block_on(device.pop_error_scope()) {
            Some(err) => Err(PluginError::Device(format!("{label}: {err}"))),
            None => Ok(()),
        }
    }
}

fn run_pass(
    encoder: &mut wgpu::CommandEncoder,
    kernel: &KernelPipeline,
    uniforms: &wgpu::BindGroup,
    channels: &wgpu::BindGroup,
    target: &wgpu::TextureView,
) {
    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(kernel.kind.name()),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            depth_slice: None,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        occlusion_query_set: None,
        timestamp_writes: None,
    });
    pass.set_pipeline(&kernel.pipeline);
    pass.set_bind_group(0, uniforms, &[]);
    pass.set_bind_group(1, channels, &[]);
    pass.draw(0..3, 0..1);
}

fn clear_pass(encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
    let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("clear canvas"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            depth_slice: None,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        occlusion_query_set: None,
        timestamp_writes: None,
    });
}

impl CanvasBackend for GpuBackend {
    type Texture = wgpu::Texture;
    type Surface = wgpu::Texture;

    fn allocate(&mut self, variant: Variant, viewport: Viewport) -> Result<(), PluginError> {
        let device = &self.context.device;
        let max = self.context.max_dimension();
        if viewport.width > max || viewport.height > max {
            return Err(PluginError::Device(format!(
                "viewport {viewport} exceeds the GPU texture limit of {max}"
            )));
        }

        let velocity_format = if variant.has_velocity() {
            Some(self.context.velocity_format().ok_or_else(|| {
                PluginError::Device("adapter cannot render to any velocity format".into())
            })?)
        } else {
            None
        };

        let kernels = if let Some(format) = velocity_format {
            Kernels::Advanced {
                velocity: KernelPipeline::new(device, &self.layouts, KernelKind::Velocity, format)?,
                color: KernelPipeline::new(device, &self.layouts, KernelKind::Color, CANVAS_FORMAT)?,
            }
        } else {
            Kernels::Simple(KernelPipeline::new(
                device,
                &self.layouts,
                KernelKind::Simple,
                CANVAS_FORMAT,
            )?)
        };

        let color = SurfacePair::from_fn(|index| {
            CanvasTexture::new(device, &format!("color {index}"), viewport, CANVAS_FORMAT)
        });
        let velocity = velocity_format.map(|format| {
            SurfacePair::from_fn(|index| {
                CanvasTexture::new(device, &format!("velocity {index}"), viewport, format)
            })
        });

        self.canvas = Some(Canvas {
            viewport,
            kernels,
            color,
            velocity,
        });

        // Both halves of each pair start at zero, not only the current one.
        let canvas = self.canvas()?;
        self.submit("zero canvas", |encoder| {
            for surface in canvas.color.iter() {
                clear_pass(encoder, &surface.view);
            }
            for surface in canvas.velocity.iter().flat_map(|pair| pair.iter()) {
                clear_pass(encoder, &surface.view);
            }
        })?;
        debug!(%variant, %viewport, ?velocity_format, "allocated GPU canvas");
        Ok(())
    }

    fn advance(&mut self, input: &wgpu::Texture, params: KernelParams) -> Result<(), PluginError> {
        if !input.usage().contains(wgpu::TextureUsages::TEXTURE_BINDING)
            || input.dimension() != wgpu::TextureDimension::D2
            || !matches!(
                input.format().sample_type(None, None),
                Some(wgpu::TextureSampleType::Float { .. })
            )
        {
            return Err(PluginError::InvalidInput);
        }

        let canvas = self.canvas()?;
        let device = &self.context.device;
        self.context.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&KernelUniforms::from(params)),
        );

        let input_view = input.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = &self.layouts.sampler;
        let uniforms = &self.uniform_bind_group;

        match (&canvas.kernels, &canvas.velocity) {
            (Kernels::Simple(kernel), _) => {
                let channels = kernel.bind(
                    device,
                    sampler,
                    &[&input_view, &canvas.color.current().view],
                );
                self.submit("simple frame", |encoder| {
                    run_pass(encoder, kernel, uniforms, &channels, &canvas.color.next().view);
                })
            }
            (Kernels::Advanced { velocity, color }, Some(velocity_pair)) => {
                let velocity_channels = velocity.bind(
                    device,
                    sampler,
                    &[
                        &input_view,
                        &canvas.color.current().view,
                        &velocity_pair.current().view,
                    ],
                );
                let color_channels = color.bind(
                    device,
                    sampler,
                    &[
                        &input_view,
                        &canvas.color.current().view,
                        &velocity_pair.next().view,
                    ],
                );
                self.submit("advanced frame", |encoder| {
                    run_pass(
                        encoder,
                        velocity,
                        uniforms,
                        &velocity_channels,
                        &velocity_pair.next().view,
                    );
                    run_pass(encoder, color, uniforms, &color_channels, &canvas.color.next().view);
                })
            }
            (Kernels::Advanced { .. }, None) => Err(PluginError::Device(
                "advanced kernels allocated without a velocity pair".into(),
            )),
        }
    }

    fn present(&mut self, output: &mut wgpu::Texture) -> Result<(), PluginError> {
        let canvas = self.canvas()?;
        let actual = Viewport::new(output.width(), output.height());
        if actual != canvas.viewport {
            return Err(PluginError::OutputMismatch {
                expected: canvas.viewport,
                actual,
            });
        }
        if output.format() != CANVAS_FORMAT
            || !output.usage().contains(wgpu::TextureUsages::COPY_DST)
        {
            return Err(PluginError::OutputFormat(format!(
                "{:?} ({:?})",
                output.format(),
                output.usage()
            )));
        }

        let source = &canvas.color.next().texture;
        self.submit("present canvas", |encoder| {
            encoder.copy_texture_to_texture(
                source.as_image_copy(),
                output.as_image_copy(),
                extent(canvas.viewport),
            );
        })
    }

    fn swap(&mut self) {
        if let Some(canvas) = self.canvas.as_mut() {
            canvas.color.swap();
            if let Some(velocity) = canvas.velocity.as_mut() {
                velocity.swap();
            }
        }
    }

    fn clear(&mut self) -> Result<(), PluginError> {
        let canvas = self.canvas()?;
        self.submit("clear canvas", |encoder| {
            clear_pass(encoder, &canvas.color.current().view);
            if let Some(velocity) = canvas.velocity.as_ref() {
                clear_pass(encoder, &velocity.current().view);
            }
        })
    }

    fn release(&mut self) {
        self.canvas = None;
    }
}
