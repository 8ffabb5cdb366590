//! Dense resampled output blocks.

use glam::UVec3;

use crate::error::{Result, SamplerError};

/// A freshly allocated block of resampled voxels.
///
/// Data is x-fastest like the source volume and owns its storage, so it stays
/// valid after the volume it came from is replaced or the sampler is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampledBlock {
    dims: UVec3,
    data: Vec<u8>,
}

impl SampledBlock {
    /// Wraps `data` as a block of `dims` voxels.
    pub fn new(dims: UVec3, data: Vec<u8>) -> Result<Self> {
        let expected = dims.x as usize * dims.y as usize * dims.z as usize;
        if data.len() != expected {
            return Err(SamplerError::Shape {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { dims, data })
    }

    pub fn dims(&self) -> UVec3 {
        self.dims
    }

    pub fn width(&self) -> u32 {
        self.dims.x
    }

    pub fn height(&self) -> u32 {
        self.dims.y
    }

    pub fn depth(&self) -> u32 {
        self.dims.z
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the block and returns the flat byte buffer.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Voxel at `(x, y, z)`, or `None` when out of range.
    pub fn get(&self, x: u32, y: u32, z: u32) -> Option<u8> {
        if x >= self.dims.x || y >= self.dims.y || z >= self.dims.z {
            return None;
        }
        let index = (z as usize * self.dims.y as usize + y as usize) * self.dims.x as usize
            + x as usize;
        self.data.get(index).copied()
    }

    /// One z-slice as a row-major `width * height` slice.
    pub fn slice(&self, z: u32) -> Option<&[u8]> {
        if z >= self.dims.z {
            return None;
        }
        let len = self.dims.x as usize * self.dims.y as usize;
        let start = z as usize * len;
        self.data.get(start..start + len)
    }

    /// Iterates over the z-slices in order.
    pub fn slices(&self) -> impl Iterator<Item = &[u8]> {
        let len = (self.dims.x as usize * self.dims.y as usize).max(1);
        self.data.chunks_exact(len)
    }
}

impl AsRef<[u8]> for SampledBlock {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl From<SampledBlock> for Vec<u8> {
    fn from(block: SampledBlock) -> Self {
        block.data
    }
}
