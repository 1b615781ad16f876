//! CPU reference backend.
//!
//! Runs the kernels from [`crate::kernel`] over in-memory planes. It exists for
//! deterministic tests and for hosts without a GPU adapter; frame data never
//! leaves host memory here, so the GPU pipeline's transfer rules do not apply.

use tracing::debug;

use crate::backend::CanvasBackend;
use crate::canvas::SurfacePair;
use crate::error::PluginError;
use crate::kernel::{self, KernelParams};
use crate::types::{Frame, Plane, Variant, Viewport, ZERO};

struct Canvas {
    viewport: Viewport,
    color: SurfacePair<Frame>,
    velocity: Option<SurfacePair<Plane<f32>>>,
}

#[derive(Default)]
pub struct SoftwareBackend {
    canvas: Option<Canvas>,
}

impl SoftwareBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canvas state after the most recent successful frame.
    pub fn current_color(&self) -> Option<&Frame> {
        self.canvas.as_ref().map(|canvas| canvas.color.current())
    }

    /// Velocity state after the most recent successful frame.
    pub fn current_velocity(&self) -> Option<&Plane<f32>> {
        self.canvas
            .as_ref()
            .and_then(|canvas| canvas.velocity.as_ref())
            .map(|velocity| velocity.current())
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.canvas.as_ref().map(|canvas| canvas.viewport)
    }

    fn canvas_mut(&mut self) -> Result<&mut Canvas, PluginError> {
        self.canvas.as_mut().ok_or(PluginError::NotInitialised)
    }
}

impl CanvasBackend for SoftwareBackend {
    type Texture = Frame;
    type Surface = Frame;

    fn allocate(&mut self, variant: Variant, viewport: Viewport) -> Result<(), PluginError> {
        let color = SurfacePair::from_fn(|_| Frame::filled(viewport, ZERO));
        let velocity = variant
            .has_velocity()
            .then(|| SurfacePair::from_fn(|_| Plane::filled(viewport, 0.0)));
        debug!(%variant, %viewport, "allocated software canvas");
        self.canvas = Some(Canvas {
            viewport,
            color,
            velocity,
        });
        Ok(())
    }

    fn advance(&mut self, input: &Frame, params: KernelParams) -> Result<(), PluginError> {
        let canvas = self.canvas_mut()?;
        let (state, next_color) = canvas.color.split();
        match canvas.velocity.as_mut() {
            None => kernel::simple_pass(input, state, params, next_color),
            Some(velocity) => {
                let (prior, next_velocity) = velocity.split();
                kernel::velocity_pass(input, state, prior, next_velocity);
                kernel::color_pass(input, state, velocity.next(), params, next_color);
            }
        }
        Ok(())
    }

    fn present(&mut self, output: &mut Frame) -> Result<(), PluginError> {
        let canvas = self.canvas_mut()?;
        if output.viewport() != canvas.viewport {
            return Err(PluginError::OutputMismatch {
                expected: canvas.viewport,
                actual: output.viewport(),
            });
        }
        output.copy_from(canvas.color.next());
        Ok(())
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
        let canvas = self.canvas_mut()?;
        canvas.color.current_mut().fill(ZERO);
        if let Some(velocity) = canvas.velocity.as_mut() {
            velocity.current_mut().fill(0.0);
        }
        Ok(())
    }

    fn release(&mut self) {
        self.canvas = None;
    }
}
