use bridge_traits::BridgeError;
use core_transfer::TransferError;
use thiserror::Error;

/// Errors raised by the download manager.
///
/// Per-item failures are recorded on the item itself as `Failed(reason)`
/// and never halt the queue; these errors surface only from `enqueue` (an
/// uncreatable destination directory) and internal worker plumbing.
#[derive(Error, Debug)]
pub enum DownloadError {
    /// The resolver has no playable URL for the track.
    #[error("No playable URL for track: {0}")]
    UnresolvedTrack(String),

    /// The streaming transfer failed or was cancelled.
    #[error("Transfer failed: {0}")]
    Transfer(#[from] TransferError),

    /// A bridge collaborator failed internally.
    #[error("Bridge failure: {0}")]
    Bridge(#[from] BridgeError),

    /// Local I/O failed (destination directory or file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DownloadError>;
