//! # Playback Error Types
//!
//! Error types for the adapter contract, segment playback and fades.

use crate::traits::Capability;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Contract Errors
    // ========================================================================
    /// The adapter does not provide a required capability.
    #[error("Adapter contract violation: missing capability `{capability}`")]
    ContractViolation { capability: Capability },

    /// Adapter was used before `init` or after its device was released.
    #[error("Playback adapter not initialized")]
    AdapterNotInitialized,

    // ========================================================================
    // Input Errors
    // ========================================================================
    /// Time is negative or not finite.
    #[error("Invalid time: {0} (must be finite and non-negative)")]
    InvalidTime(f64),

    /// Segment bounds do not satisfy `0 <= start < end`.
    #[error("Invalid segment: [{start}, {end})")]
    InvalidSegment { start: f64, end: f64 },

    /// Invalid volume value (must be in range [0.0, 1.0]).
    #[error("Invalid volume: {0} (must be between 0.0 and 1.0)")]
    InvalidVolume(f32),

    // ========================================================================
    // Device Errors
    // ========================================================================
    /// Playback operation failed.
    #[error("Playback operation failed: {0}")]
    PlaybackFailed(String),

    /// Platform audio device encountered an error.
    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    /// The player was destroyed.
    #[error("Player destroyed")]
    Destroyed,

    // ========================================================================
    // Wrapped Errors
    // ========================================================================
    /// Runtime configuration error.
    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),
}

impl PlaybackError {
    /// Returns `true` for rejected caller input, which is logged and
    /// swallowed rather than propagated.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            PlaybackError::InvalidTime(_)
                | PlaybackError::InvalidSegment { .. }
                | PlaybackError::InvalidVolume(_)
        )
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
