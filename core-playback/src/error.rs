//! # Playback Error Types

use bridge_traits::BridgeError;
use core_transfer::TransferError;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlayerError {
    // ========================================================================
    // Source Errors
    // ========================================================================
    /// Streaming the remote source to local storage failed (or was cancelled).
    #[error("Transfer failed: {0}")]
    Transfer(#[from] TransferError),

    /// The resolver has no playable URL for the track.
    #[error("No playable URL for track: {0}")]
    UnresolvedTrack(String),

    /// A bridge collaborator (resolver, duration probe) failed internally.
    #[error("Bridge failure: {0}")]
    Bridge(#[from] BridgeError),

    // ========================================================================
    // Format/Device Errors
    // ========================================================================
    /// The output device rejected the file at open time.
    #[error("Unsupported or invalid audio format: {0}")]
    UnsupportedFormat(String),

    /// The output device failed mid-operation; the engine has forced a stop.
    #[error("Audio device error: {0}")]
    Device(String),

    // ========================================================================
    // Control Errors
    // ========================================================================
    /// The requested operation is meaningless in the current state
    /// (e.g. `play` or `seek` with nothing loaded).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Volume outside `[0.0, 1.0]` that cannot be clamped (non-finite).
    #[error("Invalid volume: {0}")]
    InvalidVolume(f32),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Local I/O failed (temp file create/delete, local open).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlayerError {
    /// Returns `true` when the failure came from the network layer and a
    /// retry of the whole load may succeed.
    pub fn is_network_error(&self) -> bool {
        matches!(
            self,
            PlayerError::Transfer(TransferError::Network(_))
                | PlayerError::Transfer(TransferError::Http(_))
        )
    }

    /// Returns `true` when the load was cancelled by a competing `stop` or
    /// `load` rather than failing outright.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PlayerError::Transfer(TransferError::Cancelled))
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlayerError>;
