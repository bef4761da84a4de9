use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors terminating a single streaming transfer.
///
/// All variants are terminal for that fetch; the fetcher performs no
/// automatic retries.
#[derive(Error, Debug)]
pub enum TransferError {
    /// Connection, TLS, timeout, or mid-body transport failure.
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP error: status {0}")]
    Http(u16),

    /// Writing to the local sink failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The caller cancelled the transfer; the sink holds a partial payload.
    #[error("Transfer cancelled")]
    Cancelled,
}

impl From<BridgeError> for TransferError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::Io(io) => TransferError::Io(io),
            BridgeError::Timeout(msg) => TransferError::Network(format!("timeout: {msg}")),
            other => TransferError::Network(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransferError>;
