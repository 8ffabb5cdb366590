//! The sampler handle and its lifecycle.

use std::marker::PhantomData;

use voxsampler_core::{
    BackendKind, CpuSampler, Result, SampleRequest, SampledBlock, SamplerBackend, SamplerError,
    SamplerOptions, SamplerState, VolumeShape,
};
use voxsampler_render::GpuSampler;

/// Loads one volume at a time and extracts resampled sub-boxes from it.
///
/// Each sampler owns its own device and volume texture. Calls are strictly
/// sequential and a sampler never leaves the thread that created it:
///
/// ```compile_fail
/// fn assert_send<T: Send>() {}
/// assert_send::<voxsampler::Sampler>();
/// ```
///
/// ```compile_fail
/// fn assert_sync<T: Sync>() {}
/// assert_sync::<voxsampler::Sampler>();
/// ```
///
/// # Example
///
/// ```no_run
/// use voxsampler::*;
///
/// fn main() -> Result<()> {
///     let mut sampler = Sampler::new(false)?;
///     let volume = vec![0u8; 64 * 64 * 64];
///     sampler.load(&volume, 64, 64, 64)?;
///
///     let request = SampleRequest::new(UVec3::splat(32), Vec3::new(16.0, 16.0, 16.0), 0.5);
///     let block = sampler.sample(&request)?;
///     assert_eq!(block.len(), 32 * 32 * 32);
///
///     sampler.cleanup();
///     Ok(())
/// }
/// ```
pub struct Sampler {
    backend: Option<Box<dyn SamplerBackend>>,
    state: SamplerState,
    options: SamplerOptions,
    // Pins the sampler to its creating thread.
    _not_send: PhantomData<*const ()>,
}

impl Sampler {
    /// Creates a GPU sampler with default options.
    pub fn new(enable_debug: bool) -> Result<Self> {
        Self::with_options(SamplerOptions::new().with_debug(enable_debug))
    }

    /// Creates a sampler according to `options`.
    ///
    /// # Errors
    ///
    /// Returns [`SamplerError::Context`] if no suitable GPU adapter or device
    /// can be created.
    pub fn with_options(options: SamplerOptions) -> Result<Self> {
        if options.enable_debug {
            let _ = env_logger::try_init();
        }

        let backend: Box<dyn SamplerBackend> = match options.backend {
            BackendKind::Gpu => Box::new(GpuSampler::new(&options)?),
            BackendKind::Cpu => Box::new(CpuSampler::new()),
        };
        log::info!("{} sampler ready", backend.name());

        Ok(Self {
            backend: Some(backend),
            state: SamplerState::Ready,
            options,
            _not_send: PhantomData,
        })
    }

    /// Creates a sampler from a JSON options file.
    pub fn from_config_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Self::with_options(SamplerOptions::from_json_file(path)?)
    }

    /// Replaces the resident volume.
    ///
    /// `voxels` is x-fastest: voxel `(x, y, z)` lives at
    /// `(z * height + y) * width + x`.
    ///
    /// # Errors
    ///
    /// - [`SamplerError::InvalidState`] after [`Sampler::cleanup`]
    /// - [`SamplerError::InvalidRequest`] if any dimension is zero
    /// - [`SamplerError::Shape`] if `voxels.len()` does not match
    /// - [`SamplerError::Resource`] if the device cannot hold the volume
    ///
    /// On error the previously loaded volume, if any, stays usable.
    pub fn load(&mut self, voxels: &[u8], width: u32, height: u32, depth: u32) -> Result<()> {
        self.state.ensure_alive("load")?;
        let shape = VolumeShape::new(width, height, depth)?;
        self.load_shape(voxels, shape)
    }

    /// Like [`Sampler::load`] with a prevalidated shape.
    pub fn load_shape(&mut self, voxels: &[u8], shape: VolumeShape) -> Result<()> {
        self.state.ensure_alive("load")?;
        shape.check_buffer(voxels.len())?;
        let backend = self.backend_mut("load")?;
        if let Err(err) = backend.upload(voxels, shape) {
            log::warn!("loading {shape} volume failed: {err}");
            return Err(err);
        }
        self.state = self.state.loaded(shape);
        log::info!("loaded {shape} volume");
        Ok(())
    }

    /// Resamples the loaded volume.
    ///
    /// Output voxel `(i, j, k)` is read at source position
    /// `origin + (i, j, k) / scale` with trilinear interpolation.
    ///
    /// # Errors
    ///
    /// In order of precedence:
    /// - [`SamplerError::InvalidState`] after [`Sampler::cleanup`]
    /// - [`SamplerError::InvalidRequest`] for zero dimensions, a
    ///   non-positive scale or non-finite coordinates
    /// - [`SamplerError::NotLoaded`] before the first successful load
    /// - [`SamplerError::InvalidRequest`] for out-of-bounds boxes under
    ///   [`BoundsPolicy::Strict`](voxsampler_core::BoundsPolicy::Strict)
    pub fn sample(&mut self, request: &SampleRequest) -> Result<SampledBlock> {
        self.state.ensure_alive("sample")?;
        request.validate()?;
        let shape = self.state.require_loaded()?;
        let transform = request.plan(shape, self.options.bounds_policy)?;
        log::debug!(
            "sampling {}x{}x{} at {} scale {}",
            request.output.x,
            request.output.y,
            request.output.z,
            request.origin,
            request.scale
        );
        self.backend_mut("sample")?.resample(&transform)
    }

    /// Resamples with plain integer arguments and returns the flat buffer.
    ///
    /// Negative output dimensions are reported as
    /// [`SamplerError::InvalidRequest`].
    #[allow(clippy::too_many_arguments)]
    pub fn sample_raw(
        &mut self,
        out_w: i64,
        out_h: i64,
        out_d: i64,
        origin_x: i64,
        origin_y: i64,
        origin_z: i64,
        scale: f32,
    ) -> Result<Vec<u8>> {
        self.state.ensure_alive("sample")?;
        let request =
            SampleRequest::from_signed([out_w, out_h, out_d], [origin_x, origin_y, origin_z], scale)?;
        self.sample(&request).map(Vec::from)
    }

    /// Releases the device, texture and pipeline. Safe to call repeatedly.
    pub fn cleanup(&mut self) {
        if let Some(backend) = self.backend.take() {
            let name = backend.name();
            backend.release();
            log::info!("{name} sampler cleaned up");
        }
        self.state = SamplerState::Destroyed;
    }

    pub fn state(&self) -> SamplerState {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.state.volume_shape().is_some()
    }

    pub fn volume_shape(&self) -> Option<VolumeShape> {
        self.state.volume_shape()
    }

    /// Name of the active backend, `None` after cleanup.
    pub fn backend_name(&self) -> Option<&'static str> {
        self.backend.as_ref().map(|b| b.name())
    }

    pub fn options(&self) -> &SamplerOptions {
        &self.options
    }

    fn backend_mut(&mut self, operation: &str) -> Result<&mut (dyn SamplerBackend + 'static)> {
        self.backend.as_deref_mut().ok_or_else(|| {
            SamplerError::InvalidState(format!("{operation} called after cleanup"))
        })
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.cleanup();
    }
}

impl std::fmt::Debug for Sampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sampler")
            .field("backend", &self.backend_name())
            .field("state", &self.state)
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxsampler_core::{UVec3, Vec3};

    fn cpu_sampler() -> Sampler {
        Sampler::with_options(SamplerOptions::new().with_backend(BackendKind::Cpu)).unwrap()
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let mut sampler = cpu_sampler();
        assert_eq!(sampler.backend_name(), Some("cpu"));
        sampler.cleanup();
        sampler.cleanup();
        assert!(sampler.state().is_destroyed());
        assert_eq!(sampler.backend_name(), None);
    }

    #[test]
    fn test_invalid_state_wins_over_invalid_request() {
        let mut sampler = cpu_sampler();
        sampler.cleanup();
        let bad = SampleRequest::new(UVec3::ZERO, Vec3::ZERO, -1.0);
        assert!(matches!(
            sampler.sample(&bad),
            Err(SamplerError::InvalidState(_))
        ));
        assert!(matches!(
            sampler.sample_raw(-1, 1, 1, 0, 0, 0, 1.0),
            Err(SamplerError::InvalidState(_))
        ));
    }

    #[test]
    fn test_invalid_request_wins_over_not_loaded() {
        let mut sampler = cpu_sampler();
        assert!(matches!(
            sampler.sample_raw(0, 4, 4, 0, 0, 0, 1.0),
            Err(SamplerError::InvalidRequest(_))
        ));
        assert!(matches!(
            sampler.sample_raw(4, 4, 4, 0, 0, 0, 1.0),
            Err(SamplerError::NotLoaded)
        ));
    }
}
