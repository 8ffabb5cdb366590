//! Configuration options for a sampler.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Options controlling how a sampler is constructed and how it samples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerOptions {
    /// Verbose logging of GPU calls and validation layers.
    pub enable_debug: bool,

    /// Which sampling backend to use.
    pub backend: BackendKind,

    /// Adapter selection preference.
    pub power_preference: PowerPreference,

    /// Whether to force the software fallback adapter.
    pub force_fallback_adapter: bool,

    /// How requests reaching outside the volume are handled.
    pub bounds_policy: BoundsPolicy,
}

impl Default for SamplerOptions {
    fn default() -> Self {
        Self {
            enable_debug: false,
            backend: BackendKind::Gpu,
            power_preference: PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            bounds_policy: BoundsPolicy::Clamp,
        }
    }
}

impl SamplerOptions {
    /// Creates options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables debug logging.
    #[must_use]
    pub fn with_debug(mut self, enable_debug: bool) -> Self {
        self.enable_debug = enable_debug;
        self
    }

    /// Sets the backend.
    #[must_use]
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Sets the adapter power preference.
    #[must_use]
    pub fn with_power_preference(mut self, power_preference: PowerPreference) -> Self {
        self.power_preference = power_preference;
        self
    }

    /// Forces the software fallback adapter.
    #[must_use]
    pub fn with_fallback_adapter(mut self, force: bool) -> Self {
        self.force_fallback_adapter = force;
        self
    }

    /// Sets the bounds policy.
    #[must_use]
    pub fn with_bounds_policy(mut self, bounds_policy: BoundsPolicy) -> Self {
        self.bounds_policy = bounds_policy;
        self
    }

    /// Parses options from JSON. Missing fields take their default values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads options from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let options = Self::from_json_str(&text)?;
        log::debug!("loaded sampler options from {}", path.as_ref().display());
        Ok(options)
    }

    /// Serializes options to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Sampling backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Hardware trilinear sampling through wgpu.
    #[default]
    Gpu,
    /// Software trilinear sampling on the calling thread.
    Cpu,
}

/// Adapter power preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PowerPreference {
    /// Prefer a discrete GPU.
    #[default]
    HighPerformance,
    /// Prefer an integrated GPU.
    LowPower,
}

/// Handling of requests whose source box leaves the volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BoundsPolicy {
    /// Out-of-range coordinates read the nearest boundary voxel.
    #[default]
    Clamp,
    /// Out-of-range requests fail with an invalid request error.
    Strict,
}
