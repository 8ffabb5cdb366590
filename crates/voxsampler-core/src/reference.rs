//! Software trilinear sampler.
//!
//! Follows the same conventions as the GPU pass: normalized texture
//! coordinates, texel centers at `(i + 0.5) / dim`, clamp-to-edge addressing
//! and round-to-nearest conversion back to bytes. It serves as the test
//! oracle for the GPU backend and as a backend of its own.

use glam::{UVec3, Vec3};

use crate::backend::SamplerBackend;
use crate::block::SampledBlock;
use crate::error::{Result, SamplerError};
use crate::request::SamplingTransform;
use crate::shape::VolumeShape;

/// Trilinear sample of `voxels` at normalized texture coordinate `texcoord`.
///
/// Returns the interpolated value in byte units (`0.0..=255.0`).
pub fn sample_trilinear(voxels: &[u8], shape: VolumeShape, texcoord: Vec3) -> f32 {
    let extent = shape.extent_f32();
    // Texel space, clamped so the outermost samples read the edge voxel.
    let p = (texcoord * extent - Vec3::splat(0.5)).clamp(Vec3::ZERO, extent - Vec3::ONE);
    let base = p.floor();
    let frac = p - base;
    let last = shape.extent() - UVec3::ONE;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let lo = UVec3::new(base.x as u32, base.y as u32, base.z as u32).min(last);
    let hi = (lo + UVec3::ONE).min(last);

    let at = |x: u32, y: u32, z: u32| f32::from(voxels[shape.index(x, y, z)]);
    let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;

    let c00 = lerp(at(lo.x, lo.y, lo.z), at(hi.x, lo.y, lo.z), frac.x);
    let c10 = lerp(at(lo.x, hi.y, lo.z), at(hi.x, hi.y, lo.z), frac.x);
    let c01 = lerp(at(lo.x, lo.y, hi.z), at(hi.x, lo.y, hi.z), frac.x);
    let c11 = lerp(at(lo.x, hi.y, hi.z), at(hi.x, hi.y, hi.z), frac.x);
    let c0 = lerp(c00, c10, frac.y);
    let c1 = lerp(c01, c11, frac.y);
    lerp(c0, c1, frac.z)
}

/// Converts an interpolated value to a byte the way unorm targets do.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn quantize(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Resamples `voxels` through `transform` into a new block.
pub fn resample(voxels: &[u8], transform: &SamplingTransform) -> Result<SampledBlock> {
    let shape = transform.shape();
    let out = transform.output();
    let len = out.x as usize * out.y as usize * out.z as usize;
    let mut data = Vec::new();
    data.try_reserve_exact(len).map_err(|e| {
        SamplerError::Resource(format!(
            "cannot allocate {}x{}x{} output block: {e}",
            out.x, out.y, out.z
        ))
    })?;
    let index_to_texcoord = transform.index_to_texcoord();
    for k in 0..out.z {
        for j in 0..out.y {
            for i in 0..out.x {
                let texcoord = index_to_texcoord.transform_point3(UVec3::new(i, j, k).as_vec3());
                data.push(quantize(sample_trilinear(voxels, shape, texcoord)));
            }
        }
    }
    SampledBlock::new(out, data)
}

/// Backend that keeps the volume in host memory and samples in software.
#[derive(Debug, Default)]
pub struct CpuSampler {
    volume: Option<(VolumeShape, Vec<u8>)>,
}

impl CpuSampler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SamplerBackend for CpuSampler {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn upload(&mut self, voxels: &[u8], shape: VolumeShape) -> Result<()> {
        shape.check_buffer(voxels.len())?;
        let mut copy = Vec::new();
        copy.try_reserve_exact(voxels.len()).map_err(|e| {
            SamplerError::Resource(format!("cannot allocate {shape} volume copy: {e}"))
        })?;
        copy.extend_from_slice(voxels);
        self.volume = Some((shape, copy));
        log::trace!("cpu backend holds {shape} volume");
        Ok(())
    }

    fn resample(&mut self, transform: &SamplingTransform) -> Result<SampledBlock> {
        let (shape, voxels) = self.volume.as_ref().ok_or(SamplerError::NotLoaded)?;
        debug_assert_eq!(*shape, transform.shape());
        resample(voxels, transform)
    }

    fn release(self: Box<Self>) {
        log::trace!("cpu backend released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::BoundsPolicy;
    use crate::request::SampleRequest;
    use proptest::prelude::*;

    fn ramp_volume(shape: VolumeShape) -> Vec<u8> {
        (0..shape.voxel_count()).map(|i| (i % 251) as u8).collect()
    }

    fn plan(request: SampleRequest, shape: VolumeShape) -> SamplingTransform {
        request.plan(shape, BoundsPolicy::Clamp).unwrap()
    }

    #[test]
    fn test_identity_reproduces_source() {
        let shape = VolumeShape::new(5, 4, 3).unwrap();
        let voxels = ramp_volume(shape);
        let t = plan(SampleRequest::identity(UVec3::new(5, 4, 3)), shape);
        assert_eq!(resample(&voxels, &t).unwrap().as_slice(), voxels.as_slice());
    }

    #[test]
    fn test_sub_box_offsets() {
        let shape = VolumeShape::cube(6).unwrap();
        let voxels = ramp_volume(shape);
        let request = SampleRequest::new(UVec3::new(2, 2, 2), Vec3::new(3.0, 1.0, 2.0), 1.0);
        let block = resample(&voxels, &plan(request, shape)).unwrap();
        assert_eq!(block.get(0, 0, 0), Some(voxels[shape.index(3, 1, 2)]));
        assert_eq!(block.get(1, 1, 1), Some(voxels[shape.index(4, 2, 3)]));
    }

    #[test]
    fn test_midpoint_interpolates() {
        let shape = VolumeShape::new(2, 1, 1).unwrap();
        let voxels = [10u8, 30];
        let request = SampleRequest::new(UVec3::new(3, 1, 1), Vec3::ZERO, 2.0);
        let block = resample(&voxels, &plan(request, shape)).unwrap();
        assert_eq!(block.as_slice(), &[10, 20, 30]);
    }

    #[test]
    fn test_out_of_bounds_clamps_to_edge() {
        let shape = VolumeShape::cube(4).unwrap();
        let voxels = ramp_volume(shape);
        let request = SampleRequest::new(UVec3::splat(2), Vec3::new(10.0, 0.0, 0.0), 1.0);
        let block = resample(&voxels, &plan(request, shape)).unwrap();
        for z in 0..2 {
            for y in 0..2 {
                for x in 0..2 {
                    assert_eq!(block.get(x, y, z), Some(voxels[shape.index(3, y, z)]));
                }
            }
        }
    }

    #[test]
    fn test_cpu_backend_requires_upload() {
        let shape = VolumeShape::cube(2).unwrap();
        let mut backend = CpuSampler::new();
        let t = plan(SampleRequest::identity(UVec3::splat(2)), shape);
        assert!(matches!(backend.resample(&t), Err(SamplerError::NotLoaded)));
        backend.upload(&[1u8; 8], shape).unwrap();
        assert_eq!(backend.resample(&t).unwrap().as_slice(), &[1u8; 8]);
        Box::new(backend).release();
    }

    #[test]
    fn test_unallocatable_block_is_resource_error() {
        // 2^60 bytes fits usize but exceeds any address space.
        let shape = VolumeShape::cube(2).unwrap();
        let request = SampleRequest::new(UVec3::splat(1 << 20), Vec3::ZERO, 1.0);
        let t = plan(request, shape);
        assert!(matches!(
            resample(&[0u8; 8], &t),
            Err(SamplerError::Resource(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_trilinear_stays_within_neighbors(
            voxels in proptest::collection::vec(any::<u8>(), 27),
            u in 0.0f32..1.0, v in 0.0f32..1.0, w in 0.0f32..1.0,
        ) {
            let shape = VolumeShape::cube(3).unwrap();
            let value = sample_trilinear(&voxels, shape, Vec3::new(u, v, w));
            let min = f32::from(*voxels.iter().min().unwrap());
            let max = f32::from(*voxels.iter().max().unwrap());
            prop_assert!(value >= min - 1e-3 && value <= max + 1e-3);
        }

        #[test]
        fn prop_constant_volume_is_constant(fill in any::<u8>(), scale in 0.1f32..10.0) {
            let shape = VolumeShape::new(4, 3, 2).unwrap();
            let voxels = vec![fill; shape.voxel_count()];
            let request = SampleRequest::new(UVec3::new(3, 3, 3), Vec3::new(-1.0, 0.5, 7.0), scale);
            let block = resample(&voxels, &plan(request, shape)).unwrap();
            prop_assert!(block.as_slice().iter().all(|&v| v == fill));
        }
    }
}
