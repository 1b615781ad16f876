use std::borrow::Cow;
use std::fmt::Write as _;

use wgpu::naga::ShaderStage;

use crate::error::PluginError;
use crate::kernel::{BORDER_COUPLING, INPUT_COUPLING, LUMINANCE_WEIGHTS, VELOCITY_DECAY};

/// The three fragment kernels the GPU backend runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum KernelKind {
    /// Single-pass blend used by the simple variant.
    Simple,
    /// Pass A of the advanced variant: writes the next velocity.
    Velocity,
    /// Pass B of the advanced variant: writes the next color.
    Color,
}

impl KernelKind {
    pub(crate) fn name(self) -> &'static str {
        match self {
            KernelKind::Simple => "simple",
            KernelKind::Velocity => "velocity",
            KernelKind::Color => "color",
        }
    }

    /// Textures bound in group 1, in binding order.
    pub(crate) fn channels(self) -> &'static [&'static str] {
        match self {
            KernelKind::Simple => &["input", "state"],
            KernelKind::Velocity | KernelKind::Color => &["input", "state", "velocity"],
        }
    }

    fn body(self) -> &'static str {
        match self {
            KernelKind::Simple => SIMPLE_KERNEL,
            KernelKind::Velocity => VELOCITY_KERNEL,
            KernelKind::Color => COLOR_KERNEL,
        }
    }
}

/// Compiles the static full-screen triangle vertex shader.
pub(crate) fn compile_vertex_shader(device: &wgpu::Device) -> Result<wgpu::ShaderModule, PluginError> {
    compile_checked(
        device,
        "vertex",
        Cow::Borrowed(VERTEX_SHADER_GLSL),
        ShaderStage::Vertex,
    )
}

/// Assembles and compiles one kernel as a GLSL fragment shader.
pub(crate) fn compile_kernel(
    device: &wgpu::Device,
    kind: KernelKind,
) -> Result<wgpu::ShaderModule, PluginError> {
    let source = assemble_kernel(kind);
    tracing::trace!(kernel = kind.name(), %source, "assembled kernel source");
    compile_checked(device, kind.name(), Cow::Owned(source), ShaderStage::Fragment)
}

fn compile_checked(
    device: &wgpu::Device,
    kernel: &'static str,
    shader: Cow<'static, str>,
    stage: ShaderStage,
) -> Result<wgpu::ShaderModule, PluginError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(kernel),
        source: wgpu::ShaderSource::Glsl {
            shader,
            stage,
            defines: &[],
        },
    });
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(PluginError::KernelBuild {
            kernel,
            message: err.to_string(),
        }),
        None => Ok(module),
    }
}

/// Produces a self-contained fragment shader for `kind`.
///
/// Layout of the generated source:
///
/// 1. [`HEADER`]: version, output, and the `KernelParams` uniform block.
/// 2. Constants shared with [`crate::kernel`], formatted from the Rust values.
/// 3. One texture/sampler pair per channel plus a bounds-checked `fetch_<name>`
///    helper that returns opaque black outside the texture.
/// 4. The kernel body and [`FOOTER`], which maps `gl_FragCoord` to a texel.
pub(crate) fn assemble_kernel(kind: KernelKind) -> String {
    let mut source = String::from(HEADER);
    let [red, green, blue] = LUMINANCE_WEIGHTS;
    let _ = writeln!(
        source,
        "const vec3 LUMINANCE_WEIGHTS = vec3({red:?}, {green:?}, {blue:?});"
    );
    let _ = writeln!(source, "const float VELOCITY_DECAY = {VELOCITY_DECAY:?};");
    let _ = writeln!(source, "const float BORDER_COUPLING = {BORDER_COUPLING:?};");
    let _ = writeln!(source, "const float INPUT_COUPLING = {INPUT_COUPLING:?};");
    source.push('\n');

    for (index, channel) in kind.channels().iter().enumerate() {
        let texture_binding = index * 2;
        let sampler_binding = index * 2 + 1;
        let _ = write!(
            source,
            "layout(set = 1, binding = {texture_binding}) uniform texture2D lightbrush_{channel}_texture;\n\
             layout(set = 1, binding = {sampler_binding}) uniform sampler lightbrush_{channel}_sampler;\n\
             \n\
             vec4 fetch_{channel}(ivec2 pos) {{\n\
             \x20   ivec2 size = textureSize(sampler2D(lightbrush_{channel}_texture, lightbrush_{channel}_sampler), 0);\n\
             \x20   if (pos.x < 0 || pos.y < 0 || pos.x >= size.x || pos.y >= size.y) {{\n\
             \x20       return vec4(0.0, 0.0, 0.0, 1.0);\n\
             \x20   }}\n\
             \x20   return texelFetch(sampler2D(lightbrush_{channel}_texture, lightbrush_{channel}_sampler), pos, 0);\n\
             }}\n\n"
        );
    }

    source.push_str(HELPERS);
    source.push_str(kind.body());
    source.push_str(FOOTER);
    source
}

/// The uniform block layout must match [`crate::gpu::uniforms::KernelUniforms`].
const HEADER: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform KernelParams {
    float threshold;
    float darkening;
    vec2 _padding;
} params;

";

const HELPERS: &str = r"float luminance(vec4 color) {
    return color.r * LUMINANCE_WEIGHTS.r + color.g * LUMINANCE_WEIGHTS.g + color.b * LUMINANCE_WEIGHTS.b;
}

vec4 darken(vec4 color, float darkening) {
    return vec4(color.rgb * darkening, color.a);
}

";

const SIMPLE_KERNEL: &str = r"vec4 light_kernel(ivec2 pos) {
    vec4 incoming = fetch_input(pos);
    vec4 state = fetch_state(pos);
    float incoming_luminance = luminance(incoming);
    float state_luminance = luminance(state);

    vec4 brighter = incoming;
    float brighter_luminance = incoming_luminance;
    if (state_luminance > incoming_luminance) {
        brighter = state;
        brighter_luminance = state_luminance;
    }

    if (brighter_luminance >= params.threshold) {
        return brighter;
    }
    return darken(incoming, params.darkening);
}

";

const VELOCITY_KERNEL: &str = r"vec4 light_kernel(ivec2 pos) {
    vec4 incoming = fetch_input(pos);
    vec4 state = fetch_state(pos);
    vec4 border = (fetch_state(pos + ivec2(0, -1))
        + fetch_state(pos + ivec2(0, 1))
        + fetch_state(pos + ivec2(-1, 0))
        + fetch_state(pos + ivec2(1, 0))) / 4.0;
    float state_luminance = luminance(state);

    float velocity = fetch_velocity(pos).r * VELOCITY_DECAY;
    velocity += (luminance(border) - state_luminance) * BORDER_COUPLING;
    velocity += (luminance(incoming) - state_luminance) * INPUT_COUPLING;
    return vec4(velocity, 0.0, 0.0, 1.0);
}

";

const COLOR_KERNEL: &str = r"vec4 light_kernel(ivec2 pos) {
    vec4 incoming = fetch_input(pos);
    if (luminance(incoming) >= params.threshold) {
        return incoming;
    }

    vec4 state = fetch_state(pos);
    float velocity = fetch_velocity(pos).r;
    vec4 trail = vec4(abs(state.rgb + vec3(velocity)), 1.0);
    return darken(trail, params.darkening);
}

";

const FOOTER: &str = r"void main() {
    outColor = light_kernel(ivec2(gl_FragCoord.xy));
}
";

/// Minimal full-screen triangle vertex shader.
const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) out vec2 v_uv;

const vec2 positions[3] = vec2[3](
    vec2(-1.0, -3.0),
    vec2(3.0, 1.0),
    vec2(-1.0, 1.0)
);

void main() {
    uint vertex_index = uint(gl_VertexIndex);
    vec2 pos = positions[vertex_index];
    v_uv = pos * 0.5 + vec2(0.5, 0.5);
    gl_Position = vec4(pos, 0.0, 1.0);
}
";
