//! The streaming fetcher.

use bridge_traits::http::{HttpClient, HttpRequest};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Result, TransferError};
use crate::sink::TransferSink;

/// Progress callback: `(bytes_downloaded, total_bytes_if_known)`.
///
/// Invoked after each chunk lands in the sink. `bytes_downloaded` is
/// non-decreasing across one fetch; the total is `None` when the server
/// omitted Content-Length and callers must treat progress as indeterminate.
pub type ProgressFn = dyn Fn(u64, Option<u64>) + Send + Sync;

/// Streams a remote resource into a local sink.
///
/// One `TransferFetcher` is cheap to clone around (it only holds the shared
/// HTTP client); each [`fetch`](TransferFetcher::fetch) call is an
/// independent single-shot transfer.
#[derive(Clone)]
pub struct TransferFetcher {
    http: Arc<dyn HttpClient>,
    timeout: Duration,
    chunk_size: usize,
}

/// Default write/progress granularity: 8 KiB.
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

impl TransferFetcher {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self {
            http,
            timeout: Duration::from_secs(30),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the write/progress chunk granularity.
    ///
    /// Network reads larger than this are split before hitting the sink, so
    /// progress and cancellation stay at a bounded granularity no matter how
    /// the transport coalesces the body.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Stream the response body of `request` into `sink`.
    ///
    /// Returns the number of bytes written. The cancellation token is
    /// checked before the fetch and between chunks; on cancellation the sink
    /// is flushed (partial output stays consistent, the caller owns deleting
    /// it) and [`TransferError::Cancelled`] is returned.
    ///
    /// # Errors
    ///
    /// - [`TransferError::Http`] for a non-2xx status
    /// - [`TransferError::Network`] for connect/timeout/body failures
    /// - [`TransferError::Io`] when the sink rejects a write
    /// - [`TransferError::Cancelled`] when the token fires
    pub async fn fetch(
        &self,
        request: HttpRequest,
        sink: &mut dyn TransferSink,
        progress: Option<&ProgressFn>,
        cancel: &CancellationToken,
    ) -> Result<u64> {
        if cancel.is_cancelled() {
            return Err(TransferError::Cancelled);
        }

        let url = request.url.clone();
        let request = request.timeout(self.timeout);

        debug!(url = %url, "opening streaming transfer");
        let mut stream = self.http.fetch_stream(request).await?;

        let status = stream.status();
        if !(200..300).contains(&status) {
            warn!(url = %url, status, "transfer rejected by server");
            return Err(TransferError::Http(status));
        }

        let total = stream.content_length();
        if total.is_none() {
            debug!(url = %url, "no Content-Length; progress is indeterminate");
        }

        let mut downloaded: u64 = 0;
        loop {
            if cancel.is_cancelled() {
                sink.flush().await?;
                info!(url = %url, downloaded, "transfer cancelled");
                return Err(TransferError::Cancelled);
            }

            match stream.next_chunk().await {
                Ok(Some(chunk)) => {
                    if chunk.is_empty() {
                        continue;
                    }
                    for piece in chunk.chunks(self.chunk_size) {
                        sink.write_chunk(piece).await?;
                        downloaded += piece.len() as u64;
                        if let Some(progress) = progress {
                            progress(downloaded, total);
                        }
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(url = %url, downloaded, error = %e, "transfer failed mid-body");
                    return Err(TransferError::Network(e.to_string()));
                }
            }
        }

        sink.flush().await?;
        info!(url = %url, downloaded, total = ?total, "transfer complete");
        Ok(downloaded)
    }
}
