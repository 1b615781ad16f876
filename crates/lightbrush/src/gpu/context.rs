use crate::error::PluginError;

/// Candidate formats for the velocity pair, most precise first. Only the red
/// channel is used; GL adapters often cannot render to `R32Float`.
pub const VELOCITY_FORMATS: [wgpu::TextureFormat; 3] = [
    wgpu::TextureFormat::R32Float,
    wgpu::TextureFormat::R16Float,
    wgpu::TextureFormat::Rgba16Float,
];

const VELOCITY_USAGES: wgpu::TextureUsages = wgpu::TextureUsages::RENDER_ATTACHMENT
    .union(wgpu::TextureUsages::TEXTURE_BINDING);

/// First candidate whose allowed usages cover rendering and sampling.
pub fn select_velocity_format(
    allowed_usages: impl Fn(wgpu::TextureFormat) -> wgpu::TextureUsages,
) -> Option<wgpu::TextureFormat> {
    VELOCITY_FORMATS
        .into_iter()
        .find(|format| allowed_usages(*format).contains(VELOCITY_USAGES))
}

fn adapter_velocity_format(adapter: &wgpu::Adapter) -> Option<wgpu::TextureFormat> {
    select_velocity_format(|format| adapter.get_texture_format_features(format).allowed_usages)
}

/// Device and queue shared by every kernel and surface of one plugin instance.
#[derive(Clone)]
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    adapter_name: Option<String>,
    velocity_format: Option<wgpu::TextureFormat>,
}

impl GpuContext {
    /// Acquires a headless device on the preferred adapter.
    pub fn new(power_preference: wgpu::PowerPreference) -> Result<Self, PluginError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|err| PluginError::Device(format!("no suitable GPU adapter: {err}")))?;

        let info = adapter.get_info();
        let velocity_format = adapter_velocity_format(&adapter);
        tracing::debug!(
            name = %info.name,
            backend = ?info.backend,
            device_type = ?info.device_type,
            ?velocity_format,
            "selected GPU adapter"
        );

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("lightbrush device"),
            required_features: wgpu::Features::empty(),
            required_limits: adapter.limits(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::default(),
        }))
        .map_err(|err| PluginError::Device(format!("failed to create GPU device: {err}")))?;

        Ok(Self {
            device,
            queue,
            adapter_name: Some(info.name),
            velocity_format,
        })
    }

    /// Wraps a device the host already created, so textures can be shared.
    pub fn from_parts(adapter: &wgpu::Adapter, device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            adapter_name: Some(adapter.get_info().name),
            velocity_format: adapter_velocity_format(adapter),
        }
    }

    pub fn adapter_name(&self) -> Option<&str> {
        self.adapter_name.as_deref()
    }

    /// Renderable format for the velocity pair, if the adapter has one.
    pub fn velocity_format(&self) -> Option<wgpu::TextureFormat> {
        self.velocity_format
    }

    /// Largest square viewport the device can allocate.
    pub fn max_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }
}
