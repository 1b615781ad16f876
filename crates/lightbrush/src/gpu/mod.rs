//! wgpu implementation of [`crate::CanvasBackend`].
//!
//! - `context` acquires a headless adapter, device, and queue, or wraps ones a
//!   host already owns.
//! - `uniforms` mirrors the `KernelParams` block injected by `compile`.
//! - `pipeline` turns each assembled kernel into a render pipeline with the
//!   uniform group and a per-kernel channel group.
//! - `transfer` moves RGBA8 frames between host memory and textures.
//! - `state` owns the surface pairs and drives the passes for each frame.

mod context;
mod pipeline;
mod state;
pub mod transfer;
pub(crate) mod uniforms;

pub use context::{select_velocity_format, GpuContext, VELOCITY_FORMATS};
pub use state::{GpuBackend, CANVAS_FORMAT};
