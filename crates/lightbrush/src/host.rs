//! Translation layer for hosts that speak in raw indices and status words.
//!
//! Plugin hosts of the FreeFrame family pass parameter values as 32-bit words
//! and expect a numeric status back. [`HostAdapter`] converts those words into
//! [`ParamValue`]s and [`PluginError`]s into [`FAIL`], and nothing more.

use tracing::warn;

use crate::backend::CanvasBackend;
use crate::error::PluginError;
use crate::params::{ParamKind, ParamValue};
use crate::plugin::{FramePlugin, LightBrush};
use crate::types::Viewport;

pub const SUCCESS: u32 = 0;
pub const FAIL: u32 = 0xFFFF_FFFF;
pub const INPUT_IN_USE: u32 = 1;

/// Static identity reported to hosts during enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginInfo {
    pub unique_id: [u8; 4],
    pub name: &'static str,
    pub api_version: (u32, u32),
    pub plugin_version: (u32, u32),
    pub kind: PluginKind,
    pub description: &'static str,
    pub about: &'static str,
    pub min_inputs: u32,
    pub max_inputs: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginKind {
    /// Processes one input frame into an output frame.
    Effect,
}

pub const PLUGIN_INFO: PluginInfo = PluginInfo {
    unique_id: *b"LtBr",
    name: "FFGLLightBrush",
    api_version: (1, 0),
    plugin_version: (1, 0),
    kind: PluginKind::Effect,
    description: "FFGL plugin for light painting",
    about: "by Seppo Enarvi - users.marjaniemi.com/seppo",
    min_inputs: 1,
    max_inputs: 1,
};

/// Wraps a [`LightBrush`] behind word-sized entry points.
pub struct HostAdapter<B: CanvasBackend> {
    plugin: LightBrush<B>,
}

impl<B: CanvasBackend> HostAdapter<B> {
    pub fn new(plugin: LightBrush<B>) -> Self {
        Self { plugin }
    }

    pub fn info(&self) -> &'static PluginInfo {
        &PLUGIN_INFO
    }

    pub fn plugin(&self) -> &LightBrush<B> {
        &self.plugin
    }

    pub fn init(&mut self, width: u32, height: u32) -> u32 {
        status(self.plugin.initialize(Viewport::new(width, height)))
    }

    pub fn deinit(&mut self) -> u32 {
        self.plugin.teardown();
        SUCCESS
    }

    pub fn process(&mut self, inputs: &[Option<&B::Texture>], output: &mut B::Surface) -> u32 {
        status(self.plugin.process_frame(inputs, output))
    }

    pub fn input_status(&self, index: u32) -> u32 {
        if index >= PLUGIN_INFO.max_inputs {
            FAIL
        } else {
            INPUT_IN_USE
        }
    }

    pub fn parameter_count(&self) -> u32 {
        self.plugin.params().len() as u32
    }

    pub fn parameter_name(&self, index: u32) -> Option<&'static str> {
        self.plugin.param_info(index).ok().map(|info| info.name)
    }

    pub fn parameter_default(&self, index: u32) -> u32 {
        match self.plugin.param_info(index) {
            Ok(info) => encode(&info.default).unwrap_or(FAIL),
            Err(_) => FAIL,
        }
    }

    /// Float parameters come back as their IEEE-754 bit pattern.
    pub fn get_parameter(&self, index: u32) -> u32 {
        let Ok(info) = self.plugin.param_info(index) else {
            return FAIL;
        };
        // Event parameters have no readable value on this boundary.
        if info.kind != ParamKind::Standard {
            return FAIL;
        }
        match self.plugin.get_parameter(index) {
            Ok(value) => encode(&value).unwrap_or(FAIL),
            Err(_) => FAIL,
        }
    }

    pub fn set_parameter(&mut self, index: u32, raw: u32) -> u32 {
        let Ok(info) = self.plugin.param_info(index) else {
            warn!(index, "host addressed an unknown parameter");
            return FAIL;
        };
        let value = match info.kind {
            ParamKind::Standard => ParamValue::Float(f32::from_bits(raw)),
            ParamKind::Event => ParamValue::Bool(raw != 0),
        };
        status(self.plugin.set_parameter(index, value))
    }

    pub fn parameter_display(&self, index: u32) -> Option<String> {
        self.plugin.parameter_display(index).ok()
    }
}

fn encode(value: &ParamValue) -> Option<u32> {
    match value {
        ParamValue::Float(value) => Some(value.to_bits()),
        ParamValue::Bool(value) => Some(u32::from(*value)),
        ParamValue::Text(_) => None,
    }
}

fn status(result: Result<(), PluginError>) -> u32 {
    match result {
        Ok(()) => SUCCESS,
        Err(_) => FAIL,
    }
}
