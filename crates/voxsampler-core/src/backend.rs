//! The seam between the lifecycle guard and sampling implementations.

use crate::block::SampledBlock;
use crate::error::Result;
use crate::request::SamplingTransform;
use crate::shape::VolumeShape;

/// A volume sampling implementation.
///
/// Callers validate shapes, requests and lifecycle state before reaching a
/// backend. A backend only has to hold one volume at a time and release its
/// resources when consumed.
pub trait SamplerBackend {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Replaces the resident volume with `voxels`.
    ///
    /// On failure the previously resident volume must stay usable.
    fn upload(&mut self, voxels: &[u8], shape: VolumeShape) -> Result<()>;

    /// Resamples the resident volume through `transform`.
    fn resample(&mut self, transform: &SamplingTransform) -> Result<SampledBlock>;

    /// Releases every resource held by the backend.
    fn release(self: Box<Self>);
}
