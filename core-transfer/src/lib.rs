//! # Transfer Core
//!
//! Streaming HTTP-to-sink transfers with progress reporting and cooperative
//! cancellation.
//!
//! ## Overview
//!
//! The [`TransferFetcher`] is the single component that moves remote audio
//! bytes onto the local machine. The playback engine uses it to materialize
//! a temp file before playback; the download manager uses it to stream
//! queued tracks to their destination files. Both get the same guarantees:
//!
//! - bytes are written through to the sink chunk by chunk, never buffered
//!   whole in memory;
//! - progress callbacks are monotonically non-decreasing in downloaded
//!   bytes, with the total reported only when the server sent one;
//! - the cancellation token is checked between chunks, so cancellation
//!   takes effect with sub-second latency and is surfaced as
//!   [`TransferError::Cancelled`] rather than a truncated success.
//!
//! The fetcher never retries; retry policy belongs to the caller.

pub mod error;
pub mod fetcher;
pub mod sink;

pub use error::{Result, TransferError};
pub use fetcher::{ProgressFn, TransferFetcher, DEFAULT_CHUNK_SIZE};
pub use sink::{BufferSink, FileSink, TransferSink};
