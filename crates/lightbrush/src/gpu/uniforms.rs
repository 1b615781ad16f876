use bytemuck::{Pod, Zeroable};

use crate::kernel::KernelParams;

/// std140 mirror of the `KernelParams` uniform block.
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub(crate) struct KernelUniforms {
    pub threshold: f32,
    pub darkening: f32,
    pub _padding: [f32; 2],
}

impl From<KernelParams> for KernelUniforms {
    fn from(params: KernelParams) -> Self {
        Self {
            threshold: params.threshold,
            darkening: params.darkening,
            _padding: [0.0; 2],
        }
    }
}
