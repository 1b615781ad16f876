use std::fmt;

/// One RGBA sample, channels nominally in `[0, 1]`.
pub type Rgba = [f32; 4];

/// Sample returned for every read outside a plane.
pub const OPAQUE_BLACK: Rgba = [0.0, 0.0, 0.0, 1.0];

/// Fully zeroed sample used to initialise and clear canvas state.
pub const ZERO: Rgba = [0.0; 4];

/// Which evolution of the canvas update runs each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Variant {
    /// Single-pass luminance threshold blend over one color pair.
    Simple,
    /// Velocity pass followed by a color pass, two buffer pairs.
    #[default]
    Advanced,
}

impl Variant {
    /// Threshold used until the host sets one.
    pub fn default_threshold(self) -> f32 {
        match self {
            Variant::Simple => 0.5,
            Variant::Advanced => 0.95,
        }
    }

    /// Darkening factor used until the host sets one.
    pub fn default_darkening(self) -> f32 {
        match self {
            Variant::Simple => 0.5,
            Variant::Advanced => 0.95,
        }
    }

    pub fn has_velocity(self) -> bool {
        matches!(self, Variant::Advanced)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Simple => f.write_str("simple"),
            Variant::Advanced => f.write_str("advanced"),
        }
    }
}

/// Size negotiated with the host at initialisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Row-major 2D grid of samples.
///
/// Planes back the software canvas and double as the frame type handed to the
/// software backend. Signed coordinates let kernels address neighbours without
/// pre-checking; anything outside the grid reads as `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane<T> {
    width: u32,
    height: u32,
    samples: Vec<T>,
}

impl<T: Copy> Plane<T> {
    pub fn filled(viewport: Viewport, value: T) -> Self {
        Self {
            width: viewport.width,
            height: viewport.height,
            samples: vec![value; viewport.pixel_count()],
        }
    }

    /// Wraps existing samples; `None` when the length does not match.
    pub fn from_samples(viewport: Viewport, samples: Vec<T>) -> Option<Self> {
        if samples.len() != viewport.pixel_count() {
            return None;
        }
        Some(Self {
            width: viewport.width,
            height: viewport.height,
            samples,
        })
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn samples(&self) -> &[T] {
        &self.samples
    }

    pub fn get(&self, x: i64, y: i64) -> Option<T> {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return None;
        }
        Some(self.samples[y as usize * self.width as usize + x as usize])
    }

    pub fn set(&mut self, x: u32, y: u32, value: T) {
        let index = y as usize * self.width as usize + x as usize;
        self.samples[index] = value;
    }

    pub fn fill(&mut self, value: T) {
        self.samples.iter_mut().for_each(|sample| *sample = value);
    }

    /// Overwrites every sample with `source`; both planes must share a size.
    pub fn copy_from(&mut self, source: &Plane<T>) {
        debug_assert_eq!(self.viewport(), source.viewport());
        self.samples.copy_from_slice(&source.samples);
    }
}

/// An RGBA image as handled by the software backend.
pub type Frame = Plane<Rgba>;

impl Frame {
    /// Decodes tightly packed 8-bit RGBA bytes.
    pub fn from_rgba8(viewport: Viewport, bytes: &[u8]) -> Option<Self> {
        if bytes.len() != viewport.pixel_count() * 4 {
            return None;
        }
        let samples = bytes
            .chunks_exact(4)
            .map(|px| {
                [
                    f32::from(px[0]) / 255.0,
                    f32::from(px[1]) / 255.0,
                    f32::from(px[2]) / 255.0,
                    f32::from(px[3]) / 255.0,
                ]
            })
            .collect();
        Self::from_samples(viewport, samples)
    }

    /// Encodes to 8-bit RGBA, clamping each channel to `[0, 1]`.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.samples
            .iter()
            .flat_map(|sample| sample.map(|channel| (channel.clamp(0.0, 1.0) * 255.0).round() as u8))
            .collect()
    }
}
