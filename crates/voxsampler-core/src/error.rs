//! Error types for voxsampler.

use thiserror::Error;

/// The main error type for voxsampler operations.
#[derive(Error, Debug)]
pub enum SamplerError {
    /// No usable GPU context could be created.
    #[error("no usable GPU context: {0}")]
    Context(String),

    /// A device allocation, upload or readback failed.
    #[error("GPU resource error: {0}")]
    Resource(String),

    /// The volume buffer length does not match the declared dimensions.
    #[error("volume buffer length mismatch: expected {expected} bytes, got {actual}")]
    Shape { expected: usize, actual: usize },

    /// The operation needs a loaded volume and none is loaded.
    #[error("no volume loaded - call load() first")]
    NotLoaded,

    /// The sample request is degenerate or out of bounds.
    #[error("invalid sample request: {0}")]
    InvalidRequest(String),

    /// The sampler has been cleaned up.
    #[error("invalid sampler state: {0}")]
    InvalidState(String),

    /// I/O error while reading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

impl SamplerError {
    /// Returns true if the instance remains usable after this error.
    ///
    /// Only a context failure is fatal; every other error leaves the sampler
    /// in the state it had before the failing call.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Context(_))
    }
}

/// A specialized Result type for voxsampler operations.
pub type Result<T> = std::result::Result<T, SamplerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_error_message() {
        let err = SamplerError::Shape {
            expected: 8,
            actual: 7,
        };
        assert_eq!(
            err.to_string(),
            "volume buffer length mismatch: expected 8 bytes, got 7"
        );
    }

    #[test]
    fn test_only_context_errors_are_fatal() {
        assert!(!SamplerError::Context("no adapter".into()).is_recoverable());
        assert!(SamplerError::NotLoaded.is_recoverable());
        assert!(SamplerError::Resource("oom".into()).is_recoverable());
        assert!(SamplerError::InvalidState("destroyed".into()).is_recoverable());
    }
}
