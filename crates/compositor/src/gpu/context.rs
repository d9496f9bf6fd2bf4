use wgpu::TextureFormatFeatureFlags;

use crate::error::{CompositorError, FrameError};
use crate::types::{Antialiasing, CompositorOptions};

pub(crate) struct GpuContext {
    _instance: wgpu::Instance,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub sample_count: u32,
}

impl GpuContext {
    pub(crate) fn new<T>(
        target: T,
        pixel_size: (u32, u32),
        options: &CompositorOptions,
    ) -> Result<Self, CompositorError>
    where
        T: Into<wgpu::SurfaceTarget<'static>>,
    {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });

        let surface = instance
            .create_surface(target)
            .map_err(|err| CompositorError::graphics("failed to create rendering surface", err))?;

        let power_preference = if options.high_performance {
            wgpu::PowerPreference::HighPerformance
        } else {
            wgpu::PowerPreference::LowPower
        };
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .map_err(|err| CompositorError::graphics("failed to find a suitable GPU adapter", err))?;

        let info = adapter.get_info();
        let limits = adapter.limits();
        let is_software = info.device_type == wgpu::DeviceType::Cpu;
        tracing::debug!(
            name = %info.name,
            backend = ?info.backend,
            device_type = ?info.device_type,
            is_software,
            "selected GPU adapter"
        );

        let (width, height) = (pixel_size.0.max(1), pixel_size.1.max(1));
        let max_dimension = limits.max_texture_dimension_2d;
        if width > max_dimension || height > max_dimension {
            return Err(CompositorError::GraphicsUnavailable(format!(
                "GPU max texture dimension is {max_dimension}, requested surface is {width}x{height}"
            )));
        }

        let surface_caps = surface.get_capabilities(&adapter);
        let Some(&first_format) = surface_caps.formats.first() else {
            return Err(CompositorError::GraphicsUnavailable(
                "surface is not compatible with the selected adapter".into(),
            ));
        };
        // Shader output is already gamma encoded.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .unwrap_or_else(|| {
                tracing::warn!(
                    fallback = ?first_format,
                    "no non-sRGB surface format available; colours will be re-encoded"
                );
                first_format
            });

        let format_features = adapter.get_texture_format_features(surface_format);
        let mut sample_count = choose_sample_count(
            options.antialiasing,
            format_features.flags.supported_sample_counts(),
        );
        if sample_count > 1
            && !format_features
                .flags
                .contains(TextureFormatFeatureFlags::MULTISAMPLE_RESOLVE)
        {
            tracing::warn!(
                ?surface_format,
                "surface format does not support MSAA resolve; disabling MSAA"
            );
            sample_count = 1;
        }
        if is_software && sample_count > 1 {
            tracing::warn!(
                sample_count,
                "software rasterizer detected; disabling MSAA for performance"
            );
            sample_count = 1;
        }

        let mut required_features = wgpu::Features::empty();
        if sample_count > 4 {
            required_features |= wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES;
        }

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("bamboo device"),
            required_features,
            required_limits: limits.clone(),
            memory_hints: wgpu::MemoryHints::MemoryUsage,
            trace: wgpu::Trace::default(),
        }))
        .map_err(|err| CompositorError::graphics("failed to create GPU device", err))?;

        let present_mode = if surface_caps
            .present_modes
            .contains(&wgpu::PresentMode::Fifo)
        {
            wgpu::PresentMode::Fifo
        } else {
            surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo)
        };
        let alpha_mode = surface_caps
            .alpha_modes
            .iter()
            .copied()
            .find(|mode| *mode == wgpu::CompositeAlphaMode::Opaque)
            .or_else(|| surface_caps.alpha_modes.first().copied())
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        tracing::debug!(
            width,
            height,
            ?surface_format,
            ?present_mode,
            sample_count,
            "configured surface"
        );

        Ok(Self {
            _instance: instance,
            surface,
            device,
            queue,
            config,
            sample_count,
        })
    }

    pub(crate) fn pixel_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Reconfigures the swapchain to `requested`.
    ///
    /// Sizes over the device limit leave the current configuration untouched.
    pub(crate) fn resize(&mut self, requested: (u32, u32)) -> Result<(), FrameError> {
        let max_dimension = self.device.limits().max_texture_dimension_2d;
        let Some((width, height)) = plan_resize(self.pixel_size(), requested, max_dimension)?
        else {
            return Ok(());
        };
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        tracing::debug!(width, height, "reconfigured surface");
        Ok(())
    }

    pub(crate) fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }
}

/// Decides whether a swapchain of size `current` must be reconfigured.
///
/// Zero-sized and unchanged requests need no work.
pub(crate) fn plan_resize(
    current: (u32, u32),
    requested: (u32, u32),
    max_dimension: u32,
) -> Result<Option<(u32, u32)>, FrameError> {
    let (width, height) = requested;
    if width == 0 || height == 0 || requested == current {
        return Ok(None);
    }
    if width > max_dimension || height > max_dimension {
        return Err(FrameError::SurfaceTooLarge {
            width,
            height,
            max_dimension,
        });
    }
    Ok(Some(requested))
}

/// Resolves the requested policy against the sample counts a format supports.
pub(crate) fn choose_sample_count(antialiasing: Antialiasing, mut supported: Vec<u32>) -> u32 {
    if !supported.contains(&1) {
        supported.push(1);
    }
    supported.sort_unstable();
    supported.dedup();

    match antialiasing {
        Antialiasing::Auto => supported.last().copied().unwrap_or(1),
        Antialiasing::Off => 1,
        Antialiasing::Samples(requested) if supported.contains(&requested) => requested,
        Antialiasing::Samples(requested) => {
            let fallback = supported
                .iter()
                .copied()
                .filter(|&count| count <= requested)
                .max()
                .unwrap_or(1);
            tracing::warn!(
                requested,
                fallback,
                ?supported,
                "requested MSAA sample count not supported; falling back"
            );
            fallback
        }
    }
}
