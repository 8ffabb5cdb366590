//! Sampler lifecycle state.
//!
//! ```text
//! Ready --load--> Loaded --load--> Loaded
//!   |               |  ^
//!   |               +--+ sample
//!   +---cleanup-----+--> Destroyed
//! ```
//!
//! Construction either produces a `Ready` sampler or fails, so there is no
//! observable uninitialized state.

use crate::error::{Result, SamplerError};
use crate::shape::VolumeShape;

/// Where a sampler is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplerState {
    /// Context created, no volume yet.
    #[default]
    Ready,
    /// A volume of the given shape is resident.
    Loaded(VolumeShape),
    /// Resources released; terminal.
    Destroyed,
}

impl SamplerState {
    pub fn is_destroyed(&self) -> bool {
        matches!(self, Self::Destroyed)
    }

    /// Shape of the loaded volume, if any.
    pub fn volume_shape(&self) -> Option<VolumeShape> {
        match self {
            Self::Loaded(shape) => Some(*shape),
            _ => None,
        }
    }

    /// Fails once the sampler has been cleaned up.
    pub fn ensure_alive(&self, operation: &str) -> Result<()> {
        if self.is_destroyed() {
            Err(SamplerError::InvalidState(format!(
                "{operation} called after cleanup"
            )))
        } else {
            Ok(())
        }
    }

    /// Shape of the loaded volume, or the error sampling would hit.
    pub fn require_loaded(&self) -> Result<VolumeShape> {
        match self {
            Self::Loaded(shape) => Ok(*shape),
            Self::Ready => Err(SamplerError::NotLoaded),
            Self::Destroyed => Err(SamplerError::InvalidState(
                "sample called after cleanup".into(),
            )),
        }
    }

    /// State after a successful load.
    #[must_use]
    pub fn loaded(self, shape: VolumeShape) -> Self {
        debug_assert!(!self.is_destroyed());
        Self::Loaded(shape)
    }
}

impl std::fmt::Display for SamplerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready => write!(f, "ready"),
            Self::Loaded(shape) => write!(f, "loaded ({shape})"),
            Self::Destroyed => write!(f, "destroyed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_requires_load() {
        let state = SamplerState::default();
        assert!(state.ensure_alive("load").is_ok());
        assert!(matches!(state.require_loaded(), Err(SamplerError::NotLoaded)));
    }

    #[test]
    fn test_load_transitions() {
        let shape = VolumeShape::cube(4).unwrap();
        let state = SamplerState::Ready.loaded(shape);
        assert_eq!(state.require_loaded().unwrap(), shape);

        let other = VolumeShape::new(2, 3, 4).unwrap();
        let state = state.loaded(other);
        assert_eq!(state.volume_shape(), Some(other));
    }

    #[test]
    fn test_destroyed_is_invalid_state() {
        let state = SamplerState::Destroyed;
        assert!(matches!(
            state.ensure_alive("load"),
            Err(SamplerError::InvalidState(_))
        ));
        assert!(matches!(
            state.require_loaded(),
            Err(SamplerError::InvalidState(_))
        ));
        assert_eq!(state.to_string(), "destroyed");
    }
}
