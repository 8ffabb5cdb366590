//! Sample requests and the index-to-texture sampling transform.
//!
//! Source coordinates are expressed in voxel units with integer values at
//! voxel centers. Output voxel `(i, j, k)` of an axis-aligned request maps to
//! source coordinate `origin + (i, j, k) / scale`, which becomes the
//! normalized texture coordinate `(source + 0.5) / dims`.

use glam::{Mat4, UVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SamplerError};
use crate::options::BoundsPolicy;
use crate::shape::VolumeShape;

/// Slack for the strict bounds check, in voxels.
const BOUNDS_EPSILON: f32 = 1e-3;

/// Rotation of the sampling grid about the center of the requested box.
///
/// The rotation axis is given in spherical coordinates: `polar` is the angle
/// from +z and `azimuth` the angle from +x in the xy-plane. `angle` is the
/// rotation about that axis. All values are radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation {
    pub polar: f32,
    pub azimuth: f32,
    pub angle: f32,
}

impl Rotation {
    /// No rotation.
    pub const NONE: Self = Self {
        polar: 0.0,
        azimuth: 0.0,
        angle: 0.0,
    };

    /// Creates a rotation from axis angles and a rotation angle.
    pub fn new(polar: f32, azimuth: f32, angle: f32) -> Self {
        Self {
            polar,
            azimuth,
            angle,
        }
    }

    /// Unit rotation axis.
    pub fn axis(&self) -> Vec3 {
        let (sin_p, cos_p) = self.polar.sin_cos();
        let (sin_a, cos_a) = self.azimuth.sin_cos();
        Vec3::new(sin_p * cos_a, sin_p * sin_a, cos_p)
    }

    pub fn is_identity(&self) -> bool {
        self.angle == 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.polar.is_finite() && self.azimuth.is_finite() && self.angle.is_finite()
    }

    /// The rotation as a matrix.
    pub fn to_matrix(&self) -> Mat4 {
        if self.is_identity() {
            Mat4::IDENTITY
        } else {
            Mat4::from_axis_angle(self.axis(), self.angle)
        }
    }
}

/// A request for a resampled block of the loaded volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleRequest {
    /// Output block dimensions (width, height, depth).
    pub output: UVec3,
    /// Lower corner of the source box, in voxels.
    pub origin: Vec3,
    /// Output voxels per source voxel.
    pub scale: f32,
    /// Optional rotation about the box center.
    #[serde(default)]
    pub rotation: Rotation,
}

impl SampleRequest {
    /// Creates an axis-aligned request.
    pub fn new(output: UVec3, origin: Vec3, scale: f32) -> Self {
        Self {
            output,
            origin,
            scale,
            rotation: Rotation::NONE,
        }
    }

    /// Creates a scale-1 request of `output` voxels starting at the volume origin.
    pub fn identity(output: UVec3) -> Self {
        Self::new(output, Vec3::ZERO, 1.0)
    }

    /// Creates a request from signed integers, as passed over a binding layer.
    ///
    /// Negative or zero output dimensions are rejected here since they
    /// cannot be represented by [`UVec3`].
    pub fn from_signed(output: [i64; 3], origin: [i64; 3], scale: f32) -> Result<Self> {
        let mut dims = [0u32; 3];
        let axes = ["width", "height", "depth"];
        for (dst, (axis, &value)) in dims.iter_mut().zip(axes.iter().zip(&output)) {
            *dst = u32::try_from(value)
                .ok()
                .filter(|&v| v > 0)
                .ok_or_else(|| {
                    SamplerError::InvalidRequest(format!(
                        "output {axis} must be a positive 32-bit value, got {value}"
                    ))
                })?;
        }
        #[allow(clippy::cast_precision_loss)]
        let origin = Vec3::new(origin[0] as f32, origin[1] as f32, origin[2] as f32);
        let request = Self::new(UVec3::from(dims), origin, scale);
        request.validate()?;
        Ok(request)
    }

    /// Sets the rotation.
    #[must_use]
    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Number of voxels in the output block.
    pub fn output_len(&self) -> Option<usize> {
        usize::try_from(self.output.x)
            .ok()?
            .checked_mul(usize::try_from(self.output.y).ok()?)?
            .checked_mul(usize::try_from(self.output.z).ok()?)
    }

    /// Checks the request on its own, without reference to a volume.
    pub fn validate(&self) -> Result<()> {
        if self.output.min_element() == 0 {
            return Err(SamplerError::InvalidRequest(format!(
                "output dimensions must be positive, got {}x{}x{}",
                self.output.x, self.output.y, self.output.z
            )));
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(SamplerError::InvalidRequest(format!(
                "scale must be positive and finite, got {}",
                self.scale
            )));
        }
        if !self.origin.is_finite() {
            return Err(SamplerError::InvalidRequest(format!(
                "origin must be finite, got {}",
                self.origin
            )));
        }
        if !self.rotation.is_finite() {
            return Err(SamplerError::InvalidRequest(
                "rotation angles must be finite".into(),
            ));
        }
        if self.output_len().is_none() {
            return Err(SamplerError::InvalidRequest(format!(
                "output block {}x{}x{} is too large",
                self.output.x, self.output.y, self.output.z
            )));
        }
        Ok(())
    }

    /// Validates the request against a volume and builds its sampling transform.
    pub fn plan(&self, shape: VolumeShape, policy: BoundsPolicy) -> Result<SamplingTransform> {
        self.validate()?;
        let transform = SamplingTransform::new(self, shape);
        if policy == BoundsPolicy::Strict {
            transform.check_bounds()?;
        }
        Ok(transform)
    }
}

/// Maps output voxel indices to source voxel and texture coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingTransform {
    output: UVec3,
    shape: VolumeShape,
    index_to_voxel: Mat4,
    index_to_texcoord: Mat4,
}

impl SamplingTransform {
    /// Builds the transform for a request. The request is assumed valid.
    pub fn new(request: &SampleRequest, shape: VolumeShape) -> Self {
        let inv_scale = 1.0 / request.scale;
        // Rotate about the center of the output box.
        let center = (request.output.as_vec3() - Vec3::ONE) * 0.5;
        let index_to_voxel = Mat4::from_translation(request.origin + center * inv_scale)
            * request.rotation.to_matrix()
            * Mat4::from_scale(Vec3::splat(inv_scale))
            * Mat4::from_translation(-center);
        let index_to_texcoord = Mat4::from_scale(shape.extent_f32().recip())
            * Mat4::from_translation(Vec3::splat(0.5))
            * index_to_voxel;
        Self {
            output: request.output,
            shape,
            index_to_voxel,
            index_to_texcoord,
        }
    }

    pub fn output(&self) -> UVec3 {
        self.output
    }

    pub fn shape(&self) -> VolumeShape {
        self.shape
    }

    /// Output index to source voxel coordinate.
    pub fn index_to_voxel(&self) -> Mat4 {
        self.index_to_voxel
    }

    /// Output index to normalized texture coordinate.
    pub fn index_to_texcoord(&self) -> Mat4 {
        self.index_to_texcoord
    }

    /// Source voxel coordinate sampled for output voxel `(i, j, k)`.
    pub fn voxel_at(&self, index: UVec3) -> Vec3 {
        self.index_to_voxel.transform_point3(index.as_vec3())
    }

    /// Normalized texture coordinate sampled for output voxel `(i, j, k)`.
    pub fn texcoord_at(&self, index: UVec3) -> Vec3 {
        self.index_to_texcoord.transform_point3(index.as_vec3())
    }

    /// Axis-aligned bounds of all sampled source coordinates.
    pub fn source_bounds(&self) -> (Vec3, Vec3) {
        let last = self.output - UVec3::ONE;
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for corner in 0..8u32 {
            let index = UVec3::new(
                if corner & 1 == 0 { 0 } else { last.x },
                if corner & 2 == 0 { 0 } else { last.y },
                if corner & 4 == 0 { 0 } else { last.z },
            );
            let p = self.voxel_at(index);
            min = min.min(p);
            max = max.max(p);
        }
        (min, max)
    }

    /// Fails if any sampled coordinate falls outside the volume.
    pub fn check_bounds(&self) -> Result<()> {
        let (min, max) = self.source_bounds();
        let limit = self.shape.extent_f32() - Vec3::ONE;
        if min.cmplt(Vec3::splat(-BOUNDS_EPSILON)).any()
            || max.cmpgt(limit + Vec3::splat(BOUNDS_EPSILON)).any()
        {
            return Err(SamplerError::InvalidRequest(format!(
                "source box [{min}, {max}] exceeds volume {}",
                self.shape
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn shape(size: u32) -> VolumeShape {
        VolumeShape::cube(size).unwrap()
    }

    #[test]
    fn test_identity_hits_voxel_centers() {
        let request = SampleRequest::identity(UVec3::splat(4));
        let t = SamplingTransform::new(&request, shape(8));
        assert!(t.voxel_at(UVec3::new(3, 1, 2)).abs_diff_eq(Vec3::new(3.0, 1.0, 2.0), 1e-5));
        assert!(t
            .texcoord_at(UVec3::ZERO)
            .abs_diff_eq(Vec3::splat(0.5 / 8.0), 1e-6));
    }

    #[test]
    fn test_scale_two_magnifies() {
        let request = SampleRequest::new(UVec3::splat(8), Vec3::new(2.0, 0.0, 0.0), 2.0);
        let t = SamplingTransform::new(&request, shape(16));
        assert!(t.voxel_at(UVec3::new(4, 2, 0)).abs_diff_eq(Vec3::new(4.0, 1.0, 0.0), 1e-5));
        let (min, max) = t.source_bounds();
        assert!(min.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-5));
        assert!(max.abs_diff_eq(Vec3::new(5.5, 3.5, 3.5), 1e-5));
    }

    #[test]
    fn test_rotation_keeps_box_center() {
        let request = SampleRequest::new(UVec3::splat(5), Vec3::splat(3.0), 1.0)
            .with_rotation(Rotation::new(0.0, 0.0, std::f32::consts::FRAC_PI_2));
        let t = SamplingTransform::new(&request, shape(16));
        assert!(t.voxel_at(UVec3::splat(2)).abs_diff_eq(Vec3::splat(5.0), 1e-5));
        // Quarter turn about +z maps +x onto +y.
        assert!(t
            .voxel_at(UVec3::new(3, 2, 2))
            .abs_diff_eq(Vec3::new(5.0, 6.0, 5.0), 1e-5));
    }

    #[test]
    fn test_rotation_axis() {
        let r = Rotation::new(std::f32::consts::FRAC_PI_2, 0.0, 1.0);
        assert!(r.axis().abs_diff_eq(Vec3::X, 1e-6));
        assert!(Rotation::NONE.is_identity());
    }

    #[test]
    fn test_validate_rejects_degenerate() {
        let ok = SampleRequest::identity(UVec3::splat(2));
        assert!(ok.validate().is_ok());
        let zero = SampleRequest::identity(UVec3::new(0, 2, 2));
        assert!(matches!(zero.validate(), Err(SamplerError::InvalidRequest(_))));
        for scale in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let bad = SampleRequest::new(UVec3::splat(2), Vec3::ZERO, scale);
            assert!(
                matches!(bad.validate(), Err(SamplerError::InvalidRequest(_))),
                "scale {scale} should be rejected"
            );
        }
        let nan_origin = SampleRequest::new(UVec3::splat(2), Vec3::new(f32::NAN, 0.0, 0.0), 1.0);
        assert!(nan_origin.validate().is_err());
    }

    #[test]
    fn test_from_signed() {
        let request = SampleRequest::from_signed([4, 5, 6], [1, 2, 3], 1.5).unwrap();
        assert_eq!(request.output, UVec3::new(4, 5, 6));
        assert_eq!(request.origin, Vec3::new(1.0, 2.0, 3.0));
        assert!(SampleRequest::from_signed([-1, 5, 6], [0, 0, 0], 1.0).is_err());
        assert!(SampleRequest::from_signed([4, 0, 6], [0, 0, 0], 1.0).is_err());
        assert!(SampleRequest::from_signed([4, 5, 6], [0, 0, 0], 0.0).is_err());
        assert!(SampleRequest::from_signed([1 << 40, 1, 1], [0, 0, 0], 1.0).is_err());
    }

    #[test]
    fn test_strict_policy_rejects_out_of_bounds() {
        let s = shape(512);
        let inside = SampleRequest::identity(UVec3::splat(256));
        assert!(inside.plan(s, BoundsPolicy::Strict).is_ok());

        let outside = SampleRequest::new(UVec3::splat(256), Vec3::new(600.0, 0.0, 0.0), 1.0);
        assert!(matches!(
            outside.plan(s, BoundsPolicy::Strict),
            Err(SamplerError::InvalidRequest(_))
        ));
        assert!(outside.plan(s, BoundsPolicy::Clamp).is_ok());

        // The last sample of a full-volume request sits on the last voxel center.
        let full = SampleRequest::identity(UVec3::splat(512));
        assert!(full.plan(s, BoundsPolicy::Strict).is_ok());
        let one_past = SampleRequest::new(UVec3::splat(512), Vec3::new(1.0, 0.0, 0.0), 1.0);
        assert!(one_past.plan(s, BoundsPolicy::Strict).is_err());
    }

    proptest! {
        #[test]
        fn prop_axis_aligned_mapping(
            i in 0u32..64, j in 0u32..64, k in 0u32..64,
            ox in -100.0f32..100.0, oy in -100.0f32..100.0, oz in -100.0f32..100.0,
            scale in 0.125f32..8.0,
        ) {
            let request = SampleRequest::new(UVec3::splat(64), Vec3::new(ox, oy, oz), scale);
            let t = SamplingTransform::new(&request, shape(128));
            let index = UVec3::new(i, j, k);
            let expected = request.origin + index.as_vec3() / scale;
            prop_assert!(t.voxel_at(index).abs_diff_eq(expected, 1e-3));
            let tex = (expected + Vec3::splat(0.5)) / 128.0;
            prop_assert!(t.texcoord_at(index).abs_diff_eq(tex, 1e-5));
        }

        #[test]
        fn prop_rotation_preserves_spacing(
            polar in 0.0f32..3.1, azimuth in 0.0f32..6.2, angle in -3.1f32..3.1,
            scale in 0.25f32..4.0,
        ) {
            let request = SampleRequest::new(UVec3::splat(9), Vec3::splat(10.0), scale)
                .with_rotation(Rotation::new(polar, azimuth, angle));
            let t = SamplingTransform::new(&request, shape(64));
            let a = t.voxel_at(UVec3::new(1, 4, 4));
            let b = t.voxel_at(UVec3::new(2, 4, 4));
            prop_assert!(((a - b).length() - 1.0 / scale).abs() < 1e-3);
        }
    }
}
