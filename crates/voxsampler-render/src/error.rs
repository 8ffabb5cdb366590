//! Rendering error types.

use thiserror::Error;
use voxsampler_core::SamplerError;

/// Errors that can occur during GPU operations.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Failed to create wgpu adapter.
    #[error("failed to create graphics adapter: {0}")]
    AdapterCreationFailed(#[from] wgpu::RequestAdapterError),

    /// Failed to create wgpu device.
    #[error("failed to create graphics device: {0}")]
    DeviceCreationFailed(#[from] wgpu::RequestDeviceError),

    /// A request exceeds a device limit.
    #[error("{what} of {requested} exceeds the device limit of {limit}")]
    LimitExceeded {
        what: &'static str,
        requested: u64,
        limit: u64,
    },

    /// A GPU call failed validation.
    #[error("GPU validation failed while {0}")]
    ValidationFailed(String),

    /// Out of memory.
    #[error("out of device memory while {0}")]
    OutOfMemory(String),

    /// Mapping the readback buffer failed.
    #[error("GPU buffer mapping failed: {0}")]
    BufferMapFailed(String),

    /// Timeout waiting for GPU.
    #[error("timeout waiting for GPU")]
    Timeout,
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;

impl From<RenderError> for SamplerError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::AdapterCreationFailed(_) | RenderError::DeviceCreationFailed(_) => {
                SamplerError::Context(err.to_string())
            }
            _ => SamplerError::Resource(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_failures_map_to_resource_error() {
        let err: SamplerError = RenderError::OutOfMemory("uploading volume".into()).into();
        assert!(matches!(err, SamplerError::Resource(_)));

        let err: SamplerError = RenderError::LimitExceeded {
            what: "3D texture dimension",
            requested: 4096,
            limit: 2048,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "GPU resource error: 3D texture dimension of 4096 exceeds the device limit of 2048"
        );
    }
}
