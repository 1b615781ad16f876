use crate::params::ParamKind;
use crate::types::Viewport;

/// Failures surfaced across the plugin boundary.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// A kernel failed to compile or link. The session cannot continue.
    #[error("failed to build {kernel} kernel: {message}")]
    KernelBuild { kernel: &'static str, message: String },
    /// The graphics device could not be acquired or misbehaved.
    #[error("graphics device error: {0}")]
    Device(String),
    #[error("viewport {0} has a zero dimension")]
    EmptyViewport(Viewport),
    #[error("plugin has not been initialised")]
    NotInitialised,
    #[error("plugin has been torn down")]
    TornDown,
    #[error("frame carries no input images")]
    MissingInput,
    #[error("first input image is not valid")]
    InvalidInput,
    #[error("output surface is {actual} but the viewport is {expected}")]
    OutputMismatch { expected: Viewport, actual: Viewport },
    #[error("output surface format {0} cannot receive the canvas")]
    OutputFormat(String),
    #[error("unknown parameter index {0}")]
    UnknownParameter(u32),
    #[error("parameter '{name}' expects a {expected} value")]
    ParameterType { name: &'static str, expected: ParamKind },
}

impl PluginError {
    /// True for failures that end the session rather than a single call.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PluginError::KernelBuild { .. } | PluginError::Device(_) | PluginError::TornDown
        )
    }
}
