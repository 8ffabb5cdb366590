//! Headless GPU context.

use pollster::FutureExt;

use voxsampler_core::{PowerPreference, SamplerOptions};

use crate::error::{RenderError, RenderResult};

/// A wgpu instance, adapter, device and queue owned by one sampler.
pub struct GpuContext {
    /// The wgpu instance.
    pub instance: wgpu::Instance,
    /// The wgpu adapter.
    pub adapter: wgpu::Adapter,
    /// The wgpu device.
    pub device: wgpu::Device,
    /// The wgpu queue.
    pub queue: wgpu::Queue,
    /// Whether GPU calls are logged verbosely.
    debug: bool,
}

impl GpuContext {
    /// Creates a headless context according to `options`.
    pub async fn new_headless(options: &SamplerOptions) -> RenderResult<Self> {
        let flags = if options.enable_debug {
            wgpu::InstanceFlags::debugging()
        } else {
            wgpu::InstanceFlags::from_build_config()
        };
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags,
            ..wgpu::InstanceDescriptor::default()
        });

        let power_preference = match options.power_preference {
            PowerPreference::HighPerformance => wgpu::PowerPreference::HighPerformance,
            PowerPreference::LowPower => wgpu::PowerPreference::LowPower,
        };

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: None,
                force_fallback_adapter: options.force_fallback_adapter,
            })
            .await?;

        // Volumes need the adapter's real 3D texture and buffer size limits,
        // not the conservative defaults.
        let required_limits = adapter.limits();
        log::debug!(
            "adapter limits: 3D texture {}, 2D texture {}, buffer {} bytes",
            required_limits.max_texture_dimension_3d,
            required_limits.max_texture_dimension_2d,
            required_limits.max_buffer_size
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("voxsampler device (headless)"),
                required_features: wgpu::Features::empty(),
                required_limits,
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
            })
            .await?;

        let info = adapter.get_info();
        log::info!(
            "created GPU context on {} ({:?}, {:?})",
            info.name,
            info.backend,
            info.device_type
        );

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            debug: options.enable_debug,
        })
    }

    /// Blocking variant of [`GpuContext::new_headless`].
    pub fn create(options: &SamplerOptions) -> RenderResult<Self> {
        Self::new_headless(options).block_on()
    }

    /// The limits the device was created with.
    pub fn limits(&self) -> wgpu::Limits {
        self.device.limits()
    }

    /// Logs a GPU call, at info level when debugging and trace otherwise.
    pub(crate) fn trace(&self, args: std::fmt::Arguments<'_>) {
        if self.debug {
            log::info!(target: "voxsampler::gpu", "{args}");
        } else {
            log::trace!(target: "voxsampler::gpu", "{args}");
        }
    }

    /// Runs `f` inside out-of-memory and validation error scopes.
    ///
    /// Any error captured by the scopes is returned instead of reaching the
    /// device's uncaptured error handler.
    pub(crate) fn scoped<T>(&self, what: &str, f: impl FnOnce(&Self) -> T) -> RenderResult<T> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = f(self);
        let validation = self.device.pop_error_scope().block_on();
        let out_of_memory = self.device.pop_error_scope().block_on();
        if out_of_memory.is_some() {
            return Err(RenderError::OutOfMemory(what.to_string()));
        }
        if let Some(err) = validation {
            return Err(RenderError::ValidationFailed(format!("{what}: {err}")));
        }
        Ok(value)
    }

    /// Blocks until all submitted work has finished.
    pub fn wait_idle(&self) -> RenderResult<()> {
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map(|_| ())
            .map_err(|_| RenderError::Timeout)
    }

    /// Destroys the device. Every resource created from it becomes invalid.
    pub fn destroy(self) {
        self.trace(format_args!("destroying device"));
        // Drain outstanding work before tearing the device down.
        let _ = self.wait_idle();
        self.device.destroy();
        log::info!("GPU context destroyed");
    }
}
