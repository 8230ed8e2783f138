//! Error types for the odomtrail environment abstraction.

use thiserror::Error;

/// Errors a transform service can report when re-expressing a pose.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// The frame is not known to the transform service
    #[error("Unknown frame: {0}")]
    UnknownFrame(String),

    /// Both frames are known but no chain of transforms links them
    #[error("No transform path from '{source_frame}' to '{target_frame}'")]
    Disconnected {
        source_frame: String,
        target_frame: String,
    },

    /// Requested time is outside the buffered transform history
    #[error("Extrapolation into the {direction} for frame '{frame}'")]
    Extrapolation { frame: String, direction: String },

    /// Any other lookup failure reported by the service
    #[error("Transform lookup failed: {0}")]
    Lookup(String),
}

impl TransformError {
    /// Creates an unknown-frame error.
    pub fn unknown(frame: impl Into<String>) -> Self {
        Self::UnknownFrame(frame.into())
    }

    /// Creates a disconnected-frames error.
    pub fn disconnected(source_frame: impl Into<String>, target_frame: impl Into<String>) -> Self {
        Self::Disconnected {
            source_frame: source_frame.into(),
            target_frame: target_frame.into(),
        }
    }
}
