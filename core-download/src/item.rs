//! Download items and their lifecycle.
//!
//! An item is created `Queued`, picked up by the worker (`Downloading`), and
//! ends `Completed` or `Failed(reason)`. Terminal items move to the
//! append-only history and are never mutated again; everything handed to
//! external callers is a clone.

use bridge_traits::track::{AudioQuality, TrackRef, TrackSource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Type-safe download identifier.
///
/// Assigned at enqueue so two queued downloads of the same track stay
/// individually addressable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DownloadId(Uuid);

impl DownloadId {
    /// Create a new random download id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the string representation.
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for DownloadId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DownloadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Download lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DownloadStatus {
    /// Waiting in the queue.
    Queued,
    /// The worker is streaming this item.
    Downloading,
    /// Finished successfully; terminal.
    Completed,
    /// Finished with the recorded reason; terminal.
    Failed(String),
}

impl DownloadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Downloading => "downloading",
            Self::Completed => "completed",
            Self::Failed(_) => "failed",
        }
    }

    /// Check if the status is terminal (completed or failed).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_))
    }
}

/// One download request and its observable state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadItem {
    /// Queue-scoped identifier.
    pub id: DownloadId,
    /// The track being downloaded.
    pub track: TrackRef,
    /// Provider to download from.
    pub source: TrackSource,
    /// Requested quality tier.
    pub quality: AudioQuality,
    /// Current status.
    pub status: DownloadStatus,
    /// Progress percentage in `[0, 100]`; stays 0 while the total size is
    /// unknown.
    pub progress: f32,
    /// Smoothed transfer speed in bytes per second. Derived, not
    /// authoritative.
    pub speed_bps: u64,
    /// Destination path, assigned once when the worker picks the item up.
    pub file_path: Option<PathBuf>,
    /// Total payload size, when the server reported one.
    pub total_bytes: Option<u64>,
    /// Bytes written so far.
    pub downloaded_bytes: u64,
    /// When the item was enqueued.
    pub created_at: DateTime<Utc>,
    /// When the worker picked it up.
    pub started_at: Option<DateTime<Utc>>,
    /// When it reached a terminal status.
    pub finished_at: Option<DateTime<Utc>>,
}

impl DownloadItem {
    /// Create a new queued item.
    pub fn new(track: TrackRef, source: TrackSource, quality: AudioQuality) -> Self {
        Self {
            id: DownloadId::new(),
            track,
            source,
            quality,
            status: DownloadStatus::Queued,
            progress: 0.0,
            speed_bps: 0,
            file_path: None,
            total_bytes: None,
            downloaded_bytes: 0,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    /// Mark the item as picked up by the worker.
    pub(crate) fn start(&mut self, file_path: PathBuf) {
        self.status = DownloadStatus::Downloading;
        self.file_path = Some(file_path);
        self.started_at = Some(Utc::now());
    }

    /// Mark the item completed with its final size.
    pub(crate) fn complete(&mut self, total_bytes: u64) {
        self.status = DownloadStatus::Completed;
        self.progress = 100.0;
        self.downloaded_bytes = total_bytes;
        self.total_bytes = Some(total_bytes);
        self.finished_at = Some(Utc::now());
    }

    /// Mark the item failed with a reason.
    pub(crate) fn fail(&mut self, reason: impl Into<String>) {
        self.status = DownloadStatus::Failed(reason.into());
        self.finished_at = Some(Utc::now());
    }
}
