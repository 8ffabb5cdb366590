//! Off-screen slice target and host readback.

use glam::UVec3;

use super::GpuContext;
use crate::error::{RenderError, RenderResult};

/// Format of the slice render target.
pub const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R8Unorm;

/// Calculates bytes per row with proper alignment for wgpu buffer copies.
pub fn aligned_bytes_per_row(width: u32) -> u32 {
    let bytes_per_texel = 1u32; // R8
    let unaligned = width * bytes_per_texel;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unaligned.div_ceil(align) * align
}

/// Removes row padding from a readback of `dims` voxels.
pub fn strip_row_padding(padded: &[u8], dims: UVec3, bytes_per_row: u32) -> Vec<u8> {
    let row_bytes = dims.x as usize;
    let mut result = Vec::with_capacity(row_bytes * dims.y as usize * dims.z as usize);
    for row in padded
        .chunks_exact(bytes_per_row as usize)
        .take(dims.y as usize * dims.z as usize)
    {
        result.extend_from_slice(&row[..row_bytes]);
    }
    result
}

/// A 2D render target for one output slice and a staging buffer for the
/// whole output block.
pub struct SliceTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    staging: wgpu::Buffer,
    dims: UVec3,
    bytes_per_row: u32,
}

impl SliceTarget {
    /// Creates a target for blocks of `dims` voxels.
    pub fn new(ctx: &GpuContext, dims: UVec3) -> RenderResult<Self> {
        let limits = ctx.limits();
        let max_2d = limits.max_texture_dimension_2d;
        if dims.x.max(dims.y) > max_2d {
            return Err(RenderError::LimitExceeded {
                what: "output slice dimension",
                requested: u64::from(dims.x.max(dims.y)),
                limit: u64::from(max_2d),
            });
        }

        let bytes_per_row = aligned_bytes_per_row(dims.x);
        let staging_size = u64::from(bytes_per_row) * u64::from(dims.y) * u64::from(dims.z);
        if staging_size > limits.max_buffer_size {
            return Err(RenderError::LimitExceeded {
                what: "readback buffer size",
                requested: staging_size,
                limit: limits.max_buffer_size,
            });
        }

        ctx.trace(format_args!(
            "creating {}x{} slice target, {staging_size} byte staging buffer",
            dims.x, dims.y
        ));
        let (texture, staging) = ctx.scoped("allocating slice target", |ctx| {
            let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("Slice Target Texture"),
                size: wgpu::Extent3d {
                    width: dims.x,
                    height: dims.y,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: TARGET_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
                view_formats: &[],
            });
            let staging = ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Slice Readback Buffer"),
                size: staging_size,
                usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                mapped_at_creation: false,
            });
            (texture, staging)
        })?;

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Self {
            texture,
            view,
            staging,
            dims,
            bytes_per_row,
        })
    }

    pub fn dims(&self) -> UVec3 {
        self.dims
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Copies the current contents of the slice texture into the staging
    /// buffer at the position of slice `z`.
    pub fn encode_copy(&self, encoder: &mut wgpu::CommandEncoder, z: u32) {
        let offset = u64::from(self.bytes_per_row) * u64::from(self.dims.y) * u64::from(z);
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset,
                    bytes_per_row: Some(self.bytes_per_row),
                    rows_per_image: Some(self.dims.y),
                },
            },
            wgpu::Extent3d {
                width: self.dims.x,
                height: self.dims.y,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Waits for submitted work and reads the staging buffer back.
    ///
    /// Returns the block without row padding, x-fastest.
    pub fn read_back(&self, ctx: &GpuContext) -> RenderResult<Vec<u8>> {
        let buffer_slice = self.staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        // The map callback only fires once the copies before it are done.
        ctx.wait_idle()?;
        rx.recv()
            .map_err(|e| RenderError::BufferMapFailed(e.to_string()))?
            .map_err(|e| RenderError::BufferMapFailed(e.to_string()))?;

        let data = buffer_slice.get_mapped_range();
        let result = strip_row_padding(&data, self.dims, self.bytes_per_row);
        drop(data);
        self.staging.unmap();

        ctx.trace(format_args!("read back {} bytes", result.len()));
        Ok(result)
    }

    /// Frees the texture and staging buffer immediately.
    pub fn destroy(self) {
        self.texture.destroy();
        self.staging.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_aligned_bytes_per_row() {
        assert_eq!(aligned_bytes_per_row(1), 256);
        assert_eq!(aligned_bytes_per_row(256), 256);
        assert_eq!(aligned_bytes_per_row(257), 512);
        assert_eq!(aligned_bytes_per_row(512), 512);
    }

    #[test]
    fn test_strip_row_padding() {
        let dims = UVec3::new(3, 2, 2);
        let bytes_per_row = 8;
        let mut padded = vec![0xEEu8; 8 * 4];
        for row in 0..4u8 {
            for x in 0..3u8 {
                padded[row as usize * 8 + x as usize] = row * 10 + x;
            }
        }
        let stripped = strip_row_padding(&padded, dims, bytes_per_row);
        assert_eq!(stripped, vec![0, 1, 2, 10, 11, 12, 20, 21, 22, 30, 31, 32]);
    }

    proptest! {
        #[test]
        fn prop_strip_row_padding_keeps_every_voxel(
            w in 1u32..300, h in 1u32..6, d in 1u32..4
        ) {
            let dims = UVec3::new(w, h, d);
            let bytes_per_row = aligned_bytes_per_row(w);
            let rows = (h * d) as usize;
            let mut padded = vec![0u8; bytes_per_row as usize * rows];
            let mut expected = Vec::new();
            for row in 0..rows {
                for x in 0..w as usize {
                    let value = ((row * 7 + x) % 251) as u8;
                    padded[row * bytes_per_row as usize + x] = value;
                    expected.push(value);
                }
            }
            prop_assert_eq!(strip_row_padding(&padded, dims, bytes_per_row), expected);
        }
    }
}
