//! Per-pixel update kernels.
//!
//! These are the reference semantics of the canvas update. The software backend
//! runs them directly; the GPU backend compiles GLSL equivalents whose constants
//! are injected from this module, so both paths share one definition.

use crate::types::{Frame, Plane, Rgba, OPAQUE_BLACK};

/// Perceptual luminance weights for red, green, and blue.
pub const LUMINANCE_WEIGHTS: [f32; 3] = [0.30, 0.59, 0.11];

/// Fraction of the previous velocity carried into the next frame.
pub const VELOCITY_DECAY: f32 = 0.0001;

/// Coupling between the neighbourhood average and the pixel itself.
pub const BORDER_COUPLING: f32 = 0.0002;

/// Coupling between fresh input and the canvas.
pub const INPUT_COUPLING: f32 = 0.0004;

/// Scalars the kernels read every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelParams {
    pub threshold: f32,
    pub darkening: f32,
}

pub fn luminance(color: Rgba) -> f32 {
    color[0] * LUMINANCE_WEIGHTS[0] + color[1] * LUMINANCE_WEIGHTS[1] + color[2] * LUMINANCE_WEIGHTS[2]
}

/// Single-pass blend of one input sample with one canvas sample.
///
/// The trail darkens from the input color even when the state sample was the
/// brighter one; only the refresh branch ever returns the state.
pub fn blend_simple(input: Rgba, state: Rgba, params: KernelParams) -> Rgba {
    let input_luminance = luminance(input);
    let state_luminance = luminance(state);
    let (brighter, brighter_luminance) = if state_luminance > input_luminance {
        (state, state_luminance)
    } else {
        (input, input_luminance)
    };

    if brighter_luminance >= params.threshold {
        brighter
    } else {
        darken(input, params.darkening)
    }
}

/// Next velocity sample from the prior velocity and the canvas neighbourhood.
///
/// `neighbours` holds the up, down, left, and right canvas samples.
pub fn step_velocity(input: Rgba, state: Rgba, neighbours: [Rgba; 4], prior_velocity: f32) -> f32 {
    let input_luminance = luminance(input);
    let state_luminance = luminance(state);
    let border_luminance = luminance(average(neighbours));

    let mut velocity = prior_velocity * VELOCITY_DECAY;
    velocity += (border_luminance - state_luminance) * BORDER_COUPLING;
    velocity += (input_luminance - state_luminance) * INPUT_COUPLING;
    velocity
}

/// Next color sample given this frame's velocity.
///
/// Negative overshoot reflects through `abs` instead of clipping at zero.
pub fn step_color(input: Rgba, state: Rgba, velocity: f32, params: KernelParams) -> Rgba {
    if luminance(input) >= params.threshold {
        return input;
    }

    let trail = [
        (state[0] + velocity).abs(),
        (state[1] + velocity).abs(),
        (state[2] + velocity).abs(),
        1.0,
    ];
    darken(trail, params.darkening)
}

/// Scales the color channels, alpha passes through.
fn darken(color: Rgba, darkening: f32) -> Rgba {
    [
        color[0] * darkening,
        color[1] * darkening,
        color[2] * darkening,
        color[3],
    ]
}

fn average(samples: [Rgba; 4]) -> Rgba {
    let mut sum = [0.0f32; 4];
    for sample in samples {
        for (total, channel) in sum.iter_mut().zip(sample) {
            *total += channel;
        }
    }
    sum.map(|total| total / 4.0)
}

fn sample(plane: &Frame, x: i64, y: i64) -> Rgba {
    plane.get(x, y).unwrap_or(OPAQUE_BLACK)
}

fn sample_velocity(plane: &Plane<f32>, x: i64, y: i64) -> f32 {
    plane.get(x, y).unwrap_or(OPAQUE_BLACK[0])
}

/// Runs [`blend_simple`] for every pixel of `output`.
pub fn simple_pass(input: &Frame, state: &Frame, params: KernelParams, output: &mut Frame) {
    for y in 0..output.height() {
        for x in 0..output.width() {
            let (sx, sy) = (i64::from(x), i64::from(y));
            let value = blend_simple(sample(input, sx, sy), sample(state, sx, sy), params);
            output.set(x, y, value);
        }
    }
}

/// Runs [`step_velocity`] for every pixel of `output`.
pub fn velocity_pass(input: &Frame, state: &Frame, velocity: &Plane<f32>, output: &mut Plane<f32>) {
    for y in 0..output.height() {
        for x in 0..output.width() {
            let (sx, sy) = (i64::from(x), i64::from(y));
            let neighbours = [
                sample(state, sx, sy - 1),
                sample(state, sx, sy + 1),
                sample(state, sx - 1, sy),
                sample(state, sx + 1, sy),
            ];
            let value = step_velocity(
                sample(input, sx, sy),
                sample(state, sx, sy),
                neighbours,
                sample_velocity(velocity, sx, sy),
            );
            output.set(x, y, value);
        }
    }
}

/// Runs [`step_color`] for every pixel of `output`.
///
/// `velocity` must be the complete output of [`velocity_pass`] for this frame.
pub fn color_pass(
    input: &Frame,
    state: &Frame,
    velocity: &Plane<f32>,
    params: KernelParams,
    output: &mut Frame,
) {
    for y in 0..output.height() {
        for x in 0..output.width() {
            let (sx, sy) = (i64::from(x), i64::from(y));
            let value = step_color(
                sample(input, sx, sy),
                sample(state, sx, sy),
                sample_velocity(velocity, sx, sy),
                params,
            );
            output.set(x, y, value);
        }
    }
}
