//! GPU-resident volume texture.

use voxsampler_core::VolumeShape;

use crate::engine::GpuContext;
use crate::error::{RenderError, RenderResult};

/// Format of the volume texture: one normalized byte per voxel.
pub const VOLUME_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R8Unorm;

/// A 3D texture holding one volume, plus the sampler used to read it.
pub struct VolumeTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    shape: VolumeShape,
}

impl VolumeTexture {
    /// Allocates a texture for `shape` and uploads `voxels` into it.
    ///
    /// Fails without touching any other resource if the shape exceeds the
    /// device limits or the allocation fails.
    pub fn upload(ctx: &GpuContext, voxels: &[u8], shape: VolumeShape) -> RenderResult<Self> {
        let limit = ctx.limits().max_texture_dimension_3d;
        if shape.max_axis() > limit {
            return Err(RenderError::LimitExceeded {
                what: "3D texture dimension",
                requested: u64::from(shape.max_axis()),
                limit: u64::from(limit),
            });
        }

        let size = wgpu::Extent3d {
            width: shape.width(),
            height: shape.height(),
            depth_or_array_layers: shape.depth(),
        };

        ctx.trace(format_args!("creating {shape} volume texture"));
        let texture = ctx.scoped("allocating volume texture", |ctx| {
            ctx.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("Volume Texture"),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D3,
                format: VOLUME_FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            })
        })?;

        ctx.trace(format_args!("uploading {} bytes", voxels.len()));
        let uploaded = ctx.scoped("uploading volume", |ctx| {
            ctx.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                voxels,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(shape.width()),
                    rows_per_image: Some(shape.height()),
                },
                size,
            );
        });
        if let Err(err) = uploaded {
            texture.destroy();
            return Err(err);
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Volume Texture View"),
            dimension: Some(wgpu::TextureViewDimension::D3),
            ..Default::default()
        });

        // Trilinear filtering; coordinates outside [0, 1] read the edge voxel.
        let sampler = ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Volume Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Ok(Self {
            texture,
            view,
            sampler,
            shape,
        })
    }

    pub fn shape(&self) -> VolumeShape {
        self.shape
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    /// Device memory held by the texture, in bytes.
    pub fn size_in_bytes(&self) -> usize {
        self.shape.voxel_count()
    }

    /// Frees the device memory immediately rather than when the last
    /// reference is dropped.
    pub fn destroy(self) {
        self.texture.destroy();
    }
}
