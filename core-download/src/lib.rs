//! # Download Core
//!
//! FIFO download queue processed by a single sequential worker.
//!
//! ## Overview
//!
//! [`DownloadManager`] accepts download requests (`enqueue`), streams them
//! one at a time to collision-free destination files, and reports throttled
//! progress with derived speed estimates through the
//! [`EventBus`](core_runtime::events::EventBus). Terminal items - completed
//! or failed - move to an append-only history; a single item's failure never
//! halts the queue. `dequeue` removes still-waiting items and `cancel_all`
//! clears the queue plus stops the in-flight transfer at its next chunk
//! checkpoint.

pub mod error;
pub mod item;
pub mod manager;

pub use error::{DownloadError, Result};
pub use item::{DownloadId, DownloadItem, DownloadStatus};
pub use manager::DownloadManager;
