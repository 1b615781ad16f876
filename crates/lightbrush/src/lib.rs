//! Light-painting video effect.
//!
//! Bright parts of each incoming frame are written into a persistent canvas;
//! dim parts let the canvas fade, so moving lights leave trails. The canvas is
//! a pair of surfaces that trade roles every frame:
//!
//! ```text
//!   host ──▶ FramePlugin::process_frame(input, output)
//!                 │
//!                 ▼
//!   LightBrush ──▶ CanvasBackend::advance   current ──kernel──▶ next
//!                 ├─▶ CanvasBackend::present  next ──copy──▶ output
//!                 └─▶ CanvasBackend::swap     next becomes current
//! ```
//!
//! The simple variant runs one blend pass. The advanced variant keeps a
//! velocity field beside the color field and runs two passes: velocity first,
//! then color from the freshly written velocity.
//!
//! Two backends implement the canvas: [`GpuBackend`] compiles the kernels as
//! GLSL for `wgpu`, and [`SoftwareBackend`] runs the same [`kernel`] functions
//! on the CPU. [`HostAdapter`] maps the plugin onto word-sized host calls.

mod backend;
mod canvas;
mod compile;
mod error;
pub mod gpu;
pub mod host;
pub mod kernel;
pub mod params;
mod plugin;
mod software;
mod types;

pub use backend::CanvasBackend;
pub use canvas::SurfacePair;
pub use error::PluginError;
pub use gpu::{GpuBackend, GpuContext};
pub use host::{HostAdapter, PluginInfo, PLUGIN_INFO};
pub use kernel::KernelParams;
pub use params::{ParamChange, ParamId, ParamInfo, ParamKind, ParamTable, ParamValue};
pub use plugin::{FramePlugin, Lifecycle, LightBrush};
pub use software::SoftwareBackend;
pub use types::{Frame, Plane, Rgba, Variant, Viewport, OPAQUE_BLACK, ZERO};
