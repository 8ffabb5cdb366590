//! Core abstractions for voxsampler.
//!
//! This crate provides the backend-independent pieces of the sampler:
//! - [`SamplerError`] and the crate [`Result`] alias
//! - [`VolumeShape`] validation of volume buffers
//! - [`SampleRequest`] and the [`SamplingTransform`] it produces
//! - [`SamplerOptions`] configuration
//! - [`SamplerState`] lifecycle tracking
//! - the [`SamplerBackend`] trait and the software [`CpuSampler`]

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Voxel indices are u32 on the GPU side and usize on the host side
#![allow(clippy::cast_possible_truncation)]

pub mod backend;
pub mod block;
pub mod error;
pub mod lifecycle;
pub mod options;
pub mod reference;
pub mod request;
pub mod shape;

pub use backend::SamplerBackend;
pub use block::SampledBlock;
pub use error::{Result, SamplerError};
pub use lifecycle::SamplerState;
pub use options::{BackendKind, BoundsPolicy, PowerPreference, SamplerOptions};
pub use reference::CpuSampler;
pub use request::{Rotation, SampleRequest, SamplingTransform};
pub use shape::VolumeShape;

// Re-export glam types for convenience
pub use glam::{Mat4, UVec3, Vec3};
