use anyhow::{Context, Result};
use lightbrush::gpu::transfer::{create_output, read_rgba8, upload_rgba8};
use lightbrush::{
    Frame, FramePlugin, GpuBackend, GpuContext, LightBrush, ParamId, ParamValue, PluginError,
    SoftwareBackend, Variant, Viewport,
};
use presets::BackendSetting;
use tracing::{info, warn};

use crate::frames::RgbaFrame;

/// A [`LightBrush`] bound to one backend, fed with RGBA8 frames.
pub enum Driver {
    Software {
        brush: LightBrush<SoftwareBackend>,
        output: Frame,
    },
    Gpu {
        brush: LightBrush<GpuBackend>,
        context: GpuContext,
        output: wgpu::Texture,
    },
}

impl Driver {
    /// Builds and initialises the effect. Falls back to the software backend
    /// when no GPU adapter is available or the GPU kernels cannot be set up.
    pub fn new(backend: BackendSetting, variant: Variant, viewport: Viewport) -> Result<Self> {
        if backend == BackendSetting::Gpu {
            match Self::gpu(variant, viewport) {
                Ok(driver) => return Ok(driver),
                Err(err) => {
                    warn!(error = %err, "GPU unavailable; falling back to software backend");
                }
            }
        }

        let mut brush = LightBrush::new(SoftwareBackend::new(), variant);
        brush
            .initialize(viewport)
            .with_context(|| format!("failed to initialise effect at {viewport}"))?;
        Ok(Self::Software {
            brush,
            output: Frame::filled(viewport, lightbrush::ZERO),
        })
    }

    fn gpu(variant: Variant, viewport: Viewport) -> Result<Self, PluginError> {
        let context = GpuContext::new(wgpu::PowerPreference::HighPerformance)?;
        let backend = GpuBackend::new(context.clone())?;
        let mut brush = LightBrush::new(backend, variant);
        brush.initialize(viewport)?;
        info!(adapter = context.adapter_name().unwrap_or("unknown"), "using GPU backend");
        let output = create_output(&context.device, viewport);
        Ok(Self::Gpu {
            brush,
            context,
            output,
        })
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Driver::Software { .. } => "software",
            Driver::Gpu { .. } => "gpu",
        }
    }

    pub fn set_float(&mut self, id: ParamId, value: f32) -> Result<()> {
        self.set(id, ParamValue::Float(value))
    }

    /// Pulses the clear event so the next request is a fresh rising edge.
    pub fn clear(&mut self) -> Result<()> {
        self.set(ParamId::Clear, ParamValue::Bool(true))?;
        self.set(ParamId::Clear, ParamValue::Bool(false))
    }

    fn set(&mut self, id: ParamId, value: ParamValue) -> Result<()> {
        match self {
            Driver::Software { brush, .. } => brush.set_parameter(id.index(), value),
            Driver::Gpu { brush, .. } => brush.set_parameter(id.index(), value),
        }
        .with_context(|| format!("failed to set {}", id.name()))
    }

    pub fn process(&mut self, input: &RgbaFrame) -> Result<RgbaFrame> {
        match self {
            Driver::Software { brush, output } => {
                let frame = Frame::from_rgba8(input.viewport, &input.bytes)
                    .context("input frame has an unexpected byte length")?;
                brush.process_frame(&[Some(&frame)], output)?;
                Ok(RgbaFrame {
                    viewport: output.viewport(),
                    bytes: output.to_rgba8(),
                })
            }
            Driver::Gpu {
                brush,
                context,
                output,
            } => {
                let texture =
                    upload_rgba8(&context.device, &context.queue, input.viewport, &input.bytes)?;
                brush.process_frame(&[Some(&texture)], output)?;
                let bytes = read_rgba8(&context.device, &context.queue, output)?;
                Ok(RgbaFrame {
                    viewport: Viewport::new(output.width(), output.height()),
                    bytes,
                })
            }
        }
    }

    pub fn teardown(&mut self) {
        match self {
            Driver::Software { brush, .. } => brush.teardown(),
            Driver::Gpu { brush, .. } => brush.teardown(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn software_driver_processes_and_clears() {
        let viewport = Viewport::new(2, 1);
        let mut driver = Driver::new(BackendSetting::Software, Variant::Simple, viewport).unwrap();
        assert_eq!(driver.backend_name(), "software");

        let white = RgbaFrame {
            viewport,
            bytes: vec![255; 8],
        };
        let output = driver.process(&white).unwrap();
        assert_eq!(output.bytes, vec![255; 8]);

        // Clearing twice in a row must fire both times.
        driver.clear().unwrap();
        driver.clear().unwrap();
        driver.set_float(ParamId::Threshold, 0.9).unwrap();
        let black = RgbaFrame {
            viewport,
            bytes: vec![0, 0, 0, 255, 0, 0, 0, 255],
        };
        let output = driver.process(&black).unwrap();
        assert_eq!(output.bytes, black.bytes);
        driver.teardown();
        assert!(driver.process(&black).is_err());
    }

    #[test]
    fn gpu_request_always_yields_a_working_driver() {
        // Either a GPU that can run the advanced kernels, or the software fallback.
        let viewport = Viewport::new(3, 2);
        let mut driver = Driver::new(BackendSetting::Gpu, Variant::Advanced, viewport).unwrap();
        assert!(["gpu", "software"].contains(&driver.backend_name()));

        let white = RgbaFrame {
            viewport,
            bytes: vec![255; 24],
        };
        let output = driver.process(&white).unwrap();
        assert_eq!(output.viewport, viewport);
        assert_eq!(output.bytes, vec![255; 24]);
        driver.teardown();
    }
}
