use crate::error::PluginError;
use crate::kernel::KernelParams;
use crate::types::{Variant, Viewport};

/// Storage and execution for the canvas buffers.
///
/// A backend owns the surface pairs and the compiled kernels. The frame
/// controller decides *when* each step runs; the backend decides *how*.
/// `advance` may only write the next buffers, `present` may only read them, and
/// nothing but `swap` changes which buffer is current.
pub trait CanvasBackend {
    /// Input image handle supplied by the host each frame.
    type Texture;
    /// Destination the finished canvas is copied into.
    type Surface;

    /// Builds kernels and allocates zeroed pairs, replacing any previous ones.
    fn allocate(&mut self, variant: Variant, viewport: Viewport) -> Result<(), PluginError>;

    /// Runs the variant's passes, reading current buffers and writing next.
    fn advance(&mut self, input: &Self::Texture, params: KernelParams) -> Result<(), PluginError>;

    /// Copies the freshly written color buffer into `output` without resampling.
    fn present(&mut self, output: &mut Self::Surface) -> Result<(), PluginError>;

    /// Exchanges current and next for every pair in lockstep.
    fn swap(&mut self);

    /// Zeroes the current buffers.
    fn clear(&mut self) -> Result<(), PluginError>;

    /// Drops every buffer and kernel.
    fn release(&mut self);
}
