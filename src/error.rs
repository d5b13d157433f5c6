//! Error types for the face sensor.
//!
//! None of these are fatal: the perception sampler turns them into a
//! diagnostic status and the game keeps running on the last known target.

use thiserror::Error;

/// Why a detector call produced no usable position.
///
/// A camera that is off or a model still loading is a readiness state
/// ([`SensorReadiness`](crate::perception::SensorReadiness)), checked before
/// any call is made.
#[derive(Debug, Error)]
pub enum SensorError {
    #[error("face detection failed: {0}")]
    Detection(String),

    #[error("face detection timed out after {waited_ms:.0} ms")]
    Timeout { waited_ms: f64 },

    #[error("malformed detector result: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl SensorError {
    /// Transient errors are expected to clear up on their own (retry next sample)
    pub fn is_transient(&self) -> bool {
        matches!(self, SensorError::Timeout { .. } | SensorError::Detection(_))
    }
}
