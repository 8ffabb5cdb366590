//! The GPU sampling engine.

mod context;
mod readback;

pub use context::GpuContext;
pub use readback::{aligned_bytes_per_row, strip_row_padding, SliceTarget, TARGET_FORMAT};

use voxsampler_core::{
    Result, SampledBlock, SamplerBackend, SamplerError, SamplerOptions, SamplingTransform,
    VolumeShape,
};

use crate::error::RenderError;
use crate::resample_pass::ResamplePass;
use crate::volume_texture::VolumeTexture;

/// Samples volumes on the GPU through hardware trilinear filtering.
///
/// Owns its device outright: dropping or releasing the sampler frees the
/// volume texture, the slice target and the device itself.
pub struct GpuSampler {
    ctx: GpuContext,
    pass: ResamplePass,
    volume: Option<VolumeTexture>,
    target: Option<SliceTarget>,
}

impl GpuSampler {
    /// Creates a context and the resampling pipeline.
    pub fn new(options: &SamplerOptions) -> Result<Self> {
        let ctx = GpuContext::create(options)?;
        let pass = match ResamplePass::new(&ctx) {
            Ok(pass) => pass,
            Err(err) => {
                ctx.destroy();
                return Err(err.into());
            }
        };
        Ok(Self {
            ctx,
            pass,
            volume: None,
            target: None,
        })
    }

    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    /// Shape of the resident volume, if any.
    pub fn volume_shape(&self) -> Option<VolumeShape> {
        self.volume.as_ref().map(VolumeTexture::shape)
    }

    /// Makes sure a slice target for `dims` exists, reusing the cached one
    /// when the output size has not changed.
    fn ensure_target(&mut self, dims: glam::UVec3) -> Result<()> {
        if self.target.as_ref().is_some_and(|t| t.dims() != dims) {
            self.discard_target();
        }
        if self.target.is_none() {
            self.target = Some(SliceTarget::new(&self.ctx, dims)?);
        }
        Ok(())
    }

    /// Drops the cached slice target so the next sample allocates afresh.
    fn discard_target(&mut self) {
        if let Some(target) = self.target.take() {
            target.destroy();
        }
    }
}

impl SamplerBackend for GpuSampler {
    fn name(&self) -> &'static str {
        "gpu"
    }

    fn upload(&mut self, voxels: &[u8], shape: VolumeShape) -> Result<()> {
        shape.check_buffer(voxels.len())?;
        // The old texture stays resident until the new one is complete.
        let texture = VolumeTexture::upload(&self.ctx, voxels, shape)?;
        if let Some(old) = self.volume.replace(texture) {
            self.ctx.trace(format_args!(
                "releasing {} volume texture ({} bytes)",
                old.shape(),
                old.size_in_bytes()
            ));
            old.destroy();
            // Lets the device reclaim the old allocation before the next
            // load. The new volume is already in place either way.
            if let Err(err) = self.ctx.wait_idle() {
                log::warn!("waiting after volume replacement failed: {err}");
            }
        }
        Ok(())
    }

    fn resample(&mut self, transform: &SamplingTransform) -> Result<SampledBlock> {
        if self.volume.is_none() {
            return Err(SamplerError::NotLoaded);
        }
        let dims = transform.output();
        self.ensure_target(dims)?;

        let (Some(volume), Some(target)) = (self.volume.as_ref(), self.target.as_ref()) else {
            return Err(SamplerError::NotLoaded);
        };

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Resample Encoder"),
            });
        self.pass
            .encode_block(&self.ctx, &mut encoder, volume, target, transform)?;

        self.ctx.scoped("submitting resample", |ctx| {
            ctx.queue.submit(std::iter::once(encoder.finish()));
        })?;

        let data = match target.read_back(&self.ctx) {
            Ok(data) => data,
            Err(err) => {
                // The staging buffer may still have a map pending.
                self.discard_target();
                return Err(err.into());
            }
        };
        let expected = dims.x as usize * dims.y as usize * dims.z as usize;
        if data.len() != expected {
            return Err(RenderError::BufferMapFailed(format!(
                "read back {} bytes, expected {expected}",
                data.len()
            ))
            .into());
        }
        SampledBlock::new(dims, data)
    }

    fn release(self: Box<Self>) {
        let Self {
            ctx,
            pass,
            volume,
            target,
        } = *self;
        if let Some(volume) = volume {
            volume.destroy();
        }
        if let Some(target) = target {
            target.destroy();
        }
        pass.destroy();
        ctx.destroy();
    }
}
