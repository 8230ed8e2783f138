//! Error types for the replay harness.

use odomtrail_core::ConfigError;
use thiserror::Error;

/// Errors raised while setting up or exporting a replay.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Publish rate must be positive and finite, got {0}")]
    InvalidRate(f64),

    #[error("Duration must be non-negative and finite, got {0}")]
    InvalidDuration(f64),

    #[error("Invalid noise parameter: {0}")]
    InvalidNoise(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Export failed: {0}")]
    Export(#[from] std::io::Error),

    #[error("Export serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("Visualization unavailable: {0}")]
    Visualization(String),
}

impl From<rand_distr::NormalError> for ReplayError {
    fn from(e: rand_distr::NormalError) -> Self {
        Self::InvalidNoise(e.to_string())
    }
}
