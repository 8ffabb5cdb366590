//! GPU backend for voxsampler.
//!
//! This crate provides the wgpu implementation of
//! [`SamplerBackend`](voxsampler_core::SamplerBackend), including:
//! - a headless device owned by each sampler ([`GpuContext`])
//! - the resident 3D volume texture ([`VolumeTexture`])
//! - the slice-by-slice resampling pass ([`ResamplePass`])
//! - slice targets and host readback ([`SliceTarget`])
//! - grayscale slice snapshots ([`save_slice`])

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
// Byte counts move between u64 (wgpu) and usize (host)
#![allow(clippy::cast_possible_truncation)]

pub mod buffer;
pub mod engine;
pub mod error;
pub mod resample_pass;
pub mod snapshot;
pub mod volume_texture;

pub use engine::{GpuContext, GpuSampler, SliceTarget, TARGET_FORMAT};
pub use error::{RenderError, RenderResult};
pub use resample_pass::{ResamplePass, SliceUniforms};
pub use snapshot::{save_slice, slice_image, slice_to_png, SnapshotError};
pub use volume_texture::{VolumeTexture, VOLUME_FORMAT};
