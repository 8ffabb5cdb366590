//! voxsampler: GPU-accelerated sub-volume extraction from 3D byte volumes.
//!
//! A [`Sampler`] uploads a volume of `u8` voxels into a 3D texture once and
//! then extracts resampled blocks from it: each output voxel `(i, j, k)` is
//! read at `origin + (i, j, k) / scale` with hardware trilinear filtering.
//!
//! # Quick Start
//!
//! ```no_run
//! use voxsampler::*;
//!
//! fn main() -> Result<()> {
//!     let mut sampler = Sampler::new(false)?;
//!
//!     let (w, h, d) = (128, 128, 64);
//!     let volume: Vec<u8> = (0..w * h * d).map(|i| (i % 256) as u8).collect();
//!     sampler.load(&volume, w as u32, h as u32, d as u32)?;
//!
//!     // Downsample the whole volume by two.
//!     let block = sampler.sample_raw(64, 64, 32, 0, 0, 0, 0.5)?;
//!     assert_eq!(block.len(), 64 * 64 * 32);
//!
//!     sampler.cleanup();
//!     Ok(())
//! }
//! ```
//!
//! # Backends
//!
//! - [`GpuSampler`] - wgpu, one headless device per sampler (default)
//! - [`CpuSampler`] - software trilinear reference with the same conventions
//!
//! Select a backend, bounds policy and adapter preferences through
//! [`SamplerOptions`], which can also be read from JSON.

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

mod sampler;

pub use sampler::Sampler;

// Re-export core types
pub use voxsampler_core::{
    BackendKind, BoundsPolicy, CpuSampler, PowerPreference, Result, Rotation, SampleRequest,
    SampledBlock, SamplerBackend, SamplerError, SamplerOptions, SamplerState, SamplingTransform,
    VolumeShape,
};
pub use voxsampler_core::{Mat4, UVec3, Vec3};

// Re-export render types
pub use voxsampler_render::{save_slice, GpuContext, GpuSampler, SnapshotError};
