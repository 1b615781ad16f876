use tracing::{debug, trace, warn};

use crate::backend::CanvasBackend;
use crate::error::PluginError;
use crate::kernel::KernelParams;
use crate::params::{ParamChange, ParamId, ParamInfo, ParamTable, ParamValue};
use crate::types::{Variant, Viewport};

/// Lifecycle contract between a host and a video effect.
///
/// Hosts call these serially from one control thread. `process_frame` takes the
/// inputs as the host delivers them: possibly empty, possibly with a missing
/// first image.
pub trait FramePlugin {
    type Texture;
    type Surface;

    fn initialize(&mut self, viewport: Viewport) -> Result<(), PluginError>;

    fn teardown(&mut self);

    fn process_frame(
        &mut self,
        inputs: &[Option<&Self::Texture>],
        output: &mut Self::Surface,
    ) -> Result<(), PluginError>;

    fn get_parameter(&self, index: u32) -> Result<ParamValue, PluginError>;

    fn set_parameter(&mut self, index: u32, value: ParamValue) -> Result<(), PluginError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialised,
    Ready(Viewport),
    TornDown,
}

/// The light-painting effect: frame controller plus parameter interface.
pub struct LightBrush<B: CanvasBackend> {
    backend: B,
    variant: Variant,
    params: ParamTable,
    lifecycle: Lifecycle,
    frames: u64,
}

impl<B: CanvasBackend> LightBrush<B> {
    pub fn new(backend: B, variant: Variant) -> Self {
        Self {
            backend,
            variant,
            params: ParamTable::for_variant(variant),
            lifecycle: Lifecycle::Uninitialised,
            frames: 0,
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn viewport(&self) -> Option<Viewport> {
        match self.lifecycle {
            Lifecycle::Ready(viewport) => Some(viewport),
            _ => None,
        }
    }

    /// Frames successfully processed since the last initialisation.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn params(&self) -> &ParamTable {
        &self.params
    }

    pub fn param_info(&self, index: u32) -> Result<&ParamInfo, PluginError> {
        self.params.info(index)
    }

    pub fn parameter_display(&self, index: u32) -> Result<String, PluginError> {
        self.ensure_live()?;
        self.params.display(index)
    }

    fn ensure_live(&self) -> Result<(), PluginError> {
        match self.lifecycle {
            Lifecycle::TornDown => Err(PluginError::TornDown),
            _ => Ok(()),
        }
    }

    /// Resets current canvas state to zero; a no-op before initialisation.
    pub fn clear(&mut self) -> Result<(), PluginError> {
        match self.lifecycle {
            Lifecycle::Ready(viewport) => {
                self.backend.clear()?;
                debug!(%viewport, frame = self.frames, "cleared canvas state");
                Ok(())
            }
            Lifecycle::Uninitialised => {
                debug!("clear requested before initialisation; nothing to reset");
                Ok(())
            }
            Lifecycle::TornDown => Err(PluginError::TornDown),
        }
    }

    fn kernel_params(&self) -> KernelParams {
        KernelParams {
            threshold: self.params.float(ParamId::Threshold),
            darkening: self.params.float(ParamId::Darkening),
        }
    }

    fn run_frame(&mut self, input: &B::Texture, output: &mut B::Surface) -> Result<(), PluginError> {
        let params = self.kernel_params();
        self.backend.advance(input, params)?;
        self.backend.present(output)?;
        self.backend.swap();
        self.frames += 1;
        trace!(
            frame = self.frames,
            threshold = params.threshold,
            darkening = params.darkening,
            "advanced canvas"
        );
        Ok(())
    }
}

impl<B: CanvasBackend> FramePlugin for LightBrush<B> {
    type Texture = B::Texture;
    type Surface = B::Surface;

    fn initialize(&mut self, viewport: Viewport) -> Result<(), PluginError> {
        if self.lifecycle == Lifecycle::TornDown {
            return Err(PluginError::TornDown);
        }
        if viewport.is_empty() {
            return Err(PluginError::EmptyViewport(viewport));
        }
        if let Lifecycle::Ready(previous) = self.lifecycle {
            debug!(%previous, %viewport, "reinitialising canvas");
            self.backend.release();
            self.lifecycle = Lifecycle::Uninitialised;
        }

        self.backend.allocate(self.variant, viewport)?;
        self.lifecycle = Lifecycle::Ready(viewport);
        self.frames = 0;
        debug!(variant = %self.variant, %viewport, "light brush ready");
        Ok(())
    }

    fn teardown(&mut self) {
        self.backend.release();
        self.lifecycle = Lifecycle::TornDown;
        debug!(frames = self.frames, "light brush torn down");
    }

    fn process_frame(
        &mut self,
        inputs: &[Option<&B::Texture>],
        output: &mut B::Surface,
    ) -> Result<(), PluginError> {
        match self.lifecycle {
            Lifecycle::Ready(_) => {}
            Lifecycle::Uninitialised => return Err(PluginError::NotInitialised),
            Lifecycle::TornDown => return Err(PluginError::TornDown),
        }

        let input = match inputs.first() {
            None => Err(PluginError::MissingInput),
            Some(None) => Err(PluginError::InvalidInput),
            Some(Some(input)) => Ok(*input),
        };

        let result = input.and_then(|input| self.run_frame(input, output));
        if let Err(err) = &result {
            warn!(error = %err, frame = self.frames, "frame rejected");
        }
        result
    }

    fn get_parameter(&self, index: u32) -> Result<ParamValue, PluginError> {
        self.ensure_live()?;
        self.params.get(index)
    }

    fn set_parameter(&mut self, index: u32, value: ParamValue) -> Result<(), PluginError> {
        self.ensure_live()?;
        let change = self.params.set(index, value).inspect_err(|err| {
            warn!(index, error = %err, "parameter update rejected");
        })?;
        if change == ParamChange::Fired && ParamId::from_index(index) == Some(ParamId::Clear) {
            self.clear()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::software::SoftwareBackend;
    use crate::types::{Frame, ZERO};

    fn brush(variant: Variant) -> LightBrush<SoftwareBackend> {
        LightBrush::new(SoftwareBackend::new(), variant)
    }

    #[test]
    fn lifecycle_moves_through_ready_to_torn_down() {
        let mut brush = brush(Variant::Simple);
        assert_eq!(brush.lifecycle(), Lifecycle::Uninitialised);
        brush.initialize(Viewport::new(2, 2)).unwrap();
        assert_eq!(brush.lifecycle(), Lifecycle::Ready(Viewport::new(2, 2)));
        brush.teardown();
        assert_eq!(brush.lifecycle(), Lifecycle::TornDown);
        assert!(brush.backend().current_color().is_none());
        assert!(matches!(
            brush.initialize(Viewport::new(2, 2)),
            Err(PluginError::TornDown)
        ));
    }

    #[test]
    fn parameters_are_frozen_after_teardown() {
        let mut brush = brush(Variant::Advanced);
        brush.initialize(Viewport::new(2, 2)).unwrap();
        brush.teardown();

        assert!(matches!(brush.get_parameter(0), Err(PluginError::TornDown)));
        assert!(matches!(
            brush.set_parameter(0, ParamValue::Float(0.1)),
            Err(PluginError::TornDown)
        ));
        assert!(matches!(
            brush.set_parameter(2, ParamValue::Bool(true)),
            Err(PluginError::TornDown)
        ));
        assert!(matches!(brush.parameter_display(1), Err(PluginError::TornDown)));

        // Rejected writes leave the stored values untouched.
        assert_eq!(brush.params().get(0).unwrap(), ParamValue::Float(0.95));
        assert_eq!(brush.params().get(2).unwrap(), ParamValue::Bool(false));
    }

    #[test]
    fn processing_before_initialise_fails() {
        let mut brush = brush(Variant::Simple);
        let input = Frame::filled(Viewport::new(1, 1), ZERO);
        let mut output = input.clone();
        let err = brush
            .process_frame(&[Some(&input)], &mut output)
            .unwrap_err();
        assert!(matches!(err, PluginError::NotInitialised));
    }

    #[test]
    fn zero_sized_viewport_is_rejected() {
        let mut brush = brush(Variant::Advanced);
        assert!(matches!(
            brush.initialize(Viewport::new(0, 4)),
            Err(PluginError::EmptyViewport(_))
        ));
        assert_eq!(brush.lifecycle(), Lifecycle::Uninitialised);
    }

    #[test]
    fn clear_before_initialise_is_harmless() {
        let mut brush = brush(Variant::Advanced);
        brush.set_parameter(2, ParamValue::Bool(true)).unwrap();
        assert_eq!(brush.lifecycle(), Lifecycle::Uninitialised);
    }

    #[test]
    fn kernel_params_follow_last_write() {
        let mut brush = brush(Variant::Simple);
        brush.set_parameter(0, ParamValue::Float(0.2)).unwrap();
        brush.set_parameter(1, ParamValue::Float(0.8)).unwrap();
        brush.set_parameter(0, ParamValue::Float(0.3)).unwrap();
        assert_eq!(
            brush.kernel_params(),
            KernelParams {
                threshold: 0.3,
                darkening: 0.8
            }
        );
    }
}
