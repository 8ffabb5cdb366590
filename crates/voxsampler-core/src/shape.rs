//! Volume dimensions and buffer validation.

use glam::{UVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SamplerError};

/// Dimensions of a voxel volume, in voxels.
///
/// Volumes are stored x-fastest: the voxel at `(x, y, z)` lives at
/// `(z * height + y) * width + x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VolumeShape {
    width: u32,
    height: u32,
    depth: u32,
}

impl VolumeShape {
    /// Creates a shape, rejecting zero-sized axes.
    pub fn new(width: u32, height: u32, depth: u32) -> Result<Self> {
        if width == 0 || height == 0 || depth == 0 {
            return Err(SamplerError::InvalidRequest(format!(
                "volume dimensions must be positive, got {width}x{height}x{depth}"
            )));
        }
        let shape = Self {
            width,
            height,
            depth,
        };
        shape.checked_voxel_count().ok_or_else(|| {
            SamplerError::Resource(format!(
                "volume {width}x{height}x{depth} does not fit in host memory"
            ))
        })?;
        Ok(shape)
    }

    /// Creates a cube-shaped volume.
    pub fn cube(size: u32) -> Result<Self> {
        Self::new(size, size, size)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Dimensions as a vector.
    pub fn extent(&self) -> UVec3 {
        UVec3::new(self.width, self.height, self.depth)
    }

    /// Dimensions as a float vector.
    pub fn extent_f32(&self) -> Vec3 {
        self.extent().as_vec3()
    }

    /// The largest axis length.
    pub fn max_axis(&self) -> u32 {
        self.width.max(self.height).max(self.depth)
    }

    fn checked_voxel_count(&self) -> Option<usize> {
        usize::try_from(self.width)
            .ok()?
            .checked_mul(usize::try_from(self.height).ok()?)?
            .checked_mul(usize::try_from(self.depth).ok()?)
    }

    /// Total number of voxels (and bytes) in the volume.
    pub fn voxel_count(&self) -> usize {
        // Overflow is ruled out in `new`.
        self.checked_voxel_count().unwrap_or(usize::MAX)
    }

    /// Checks that a flat buffer holds exactly one byte per voxel.
    pub fn check_buffer(&self, len: usize) -> Result<()> {
        let expected = self.voxel_count();
        if len == expected {
            Ok(())
        } else {
            Err(SamplerError::Shape {
                expected,
                actual: len,
            })
        }
    }

    /// Flat index of voxel `(x, y, z)`. Coordinates must be in range.
    pub fn index(&self, x: u32, y: u32, z: u32) -> usize {
        (z as usize * self.height as usize + y as usize) * self.width as usize + x as usize
    }
}

impl std::fmt::Display for VolumeShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}", self.width, self.height, self.depth)
    }
}
