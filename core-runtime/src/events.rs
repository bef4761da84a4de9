//! # Event Bus System
//!
//! Event-driven notification layer built on `tokio::sync::broadcast`. The
//! playback engine, playlist controller, and download manager publish typed
//! events here; any number of foreground consumers subscribe independently.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐     emit      ┌───────────┐
//! │ Playback Engine  ├──────────────>│           │
//! └──────────────────┘               │           │
//! ┌──────────────────┐     emit      │ EventBus  │    subscribe    ┌────────────┐
//! │ Playlist Control ├──────────────>│ (broadcast├────────────────>│ Subscriber │
//! └──────────────────┘               │  channel) │                 └────────────┘
//! ┌──────────────────┐     emit      │           │    subscribe    ┌────────────┐
//! │ Download Manager ├──────────────>│           ├────────────────>│ Subscriber │
//! └──────────────────┘               └───────────┘                 └────────────┘
//! ```
//!
//! Delivery is channel-based: producers never invoke subscriber code inline,
//! so a subscriber may call back into the producing component (e.g. `stop()`
//! from a position-change handler) without re-entrancy or deadlock. UI
//! toolkits that require single-threaded access drain their receiver on
//! their own thread.
//!
//! ## Error Handling
//!
//! `tokio::sync::broadcast` produces two receive errors:
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events. Non-fatal;
//!   it keeps receiving new events.
//! - **`RecvError::Closed`**: all senders dropped; treat as shutdown.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Position and progress events arrive at roughly 10–20 Hz apiece, so this
/// gives slow subscribers several seconds of headroom before lagging.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 256;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Playback-engine events
    Playback(PlaybackEvent),
    /// Playlist-controller events
    Playlist(PlaylistEvent),
    /// Download-manager events
    Download(DownloadEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Playback(e) => e.description(),
            CoreEvent::Playlist(e) => e.description(),
            CoreEvent::Download(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(PlaybackEvent::Error { .. }) => EventSeverity::Error,
            CoreEvent::Download(DownloadEvent::Failed { .. }) => EventSeverity::Error,
            CoreEvent::Playback(PlaybackEvent::Started { .. }) => EventSeverity::Info,
            CoreEvent::Playback(PlaybackEvent::Completed { .. }) => EventSeverity::Info,
            CoreEvent::Download(DownloadEvent::Completed { .. }) => EventSeverity::Info,
            CoreEvent::Playlist(PlaylistEvent::EndReached) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Playback Events
// ============================================================================

/// Events emitted by the playback engine.
///
/// Position notifications for one playback session are non-decreasing in
/// `position_ms` between seeks; a seek emits a fresh baseline immediately.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// Playback started from stopped (possibly at a pending seek target).
    Started {
        /// Provider id of the track, empty for local files.
        track_id: String,
        /// Display title.
        title: String,
    },
    /// Playback paused.
    Paused {
        /// Position when paused (milliseconds).
        position_ms: u64,
    },
    /// Playback resumed after a pause.
    Resumed {
        /// Position when resumed (milliseconds).
        position_ms: u64,
    },
    /// Playback stopped and position reset.
    Stopped,
    /// Track finished playing naturally.
    Completed {
        /// Provider id of the finished track.
        track_id: String,
    },
    /// Playback position changed (tracker tick or seek).
    PositionChanged {
        /// Current position (milliseconds).
        position_ms: u64,
        /// Track duration (milliseconds).
        duration_ms: u64,
    },
    /// Playback error occurred; the engine has already forced a stop.
    Error {
        /// Provider id of the affected track, if one was loaded.
        track_id: Option<String>,
        /// Human-readable error message.
        message: String,
    },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::Started { .. } => "Playback started",
            PlaybackEvent::Paused { .. } => "Playback paused",
            PlaybackEvent::Resumed { .. } => "Playback resumed",
            PlaybackEvent::Stopped => "Playback stopped",
            PlaybackEvent::Completed { .. } => "Track completed",
            PlaybackEvent::PositionChanged { .. } => "Playback position changed",
            PlaybackEvent::Error { .. } => "Playback error",
        }
    }
}

// ============================================================================
// Playlist Events
// ============================================================================

/// Events emitted by the playlist controller.
///
/// The controller never plays anything itself; `TrackSelected` tells the
/// host which entry to load and play next.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaylistEvent {
    /// The cursor moved to an entry that should now be played.
    TrackSelected {
        /// Index of the selected entry.
        index: usize,
        /// Provider id of the selected track, empty for local files.
        track_id: String,
        /// Display title of the selected track.
        title: String,
    },
    /// `next()` was called at the last entry; the cursor did not move.
    EndReached,
}

impl PlaylistEvent {
    fn description(&self) -> &str {
        match self {
            PlaylistEvent::TrackSelected { .. } => "Playlist track selected",
            PlaylistEvent::EndReached => "Playlist end reached",
        }
    }
}

// ============================================================================
// Download Events
// ============================================================================

/// Events emitted by the download manager.
///
/// Progress notifications for one item are monotonically non-decreasing in
/// `downloaded_bytes` and throttled to roughly 20 per second.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum DownloadEvent {
    /// The worker picked the item up and resolved its destination path.
    Started {
        /// Queue-scoped download id.
        download_id: String,
        /// Display title of the track being downloaded.
        title: String,
        /// Destination file path.
        file_path: String,
    },
    /// Transfer progress update.
    Progress {
        /// Queue-scoped download id.
        download_id: String,
        /// Whole-number percentage; 0 while the total size is unknown.
        percent: u8,
        /// Bytes written so far.
        downloaded_bytes: u64,
        /// Total size when the server reported one; progress is
        /// indeterminate otherwise.
        total_bytes: Option<u64>,
        /// Smoothed transfer speed estimate in bytes per second.
        speed_bps: u64,
    },
    /// The item finished and moved to history.
    Completed {
        /// Queue-scoped download id.
        download_id: String,
        /// Destination file path.
        file_path: String,
        /// Final size in bytes.
        total_bytes: u64,
    },
    /// The item failed and moved to history; the worker continues.
    Failed {
        /// Queue-scoped download id.
        download_id: String,
        /// Human-readable failure reason.
        reason: String,
    },
}

impl DownloadEvent {
    fn description(&self) -> &str {
        match self {
            DownloadEvent::Started { .. } => "Download started",
            DownloadEvent::Progress { .. } => "Download progress",
            DownloadEvent::Completed { .. } => "Download completed",
            DownloadEvent::Failed { .. } => "Download failed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned for each subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events buffered per subscriber.
    ///   A subscriber falling behind by more than this receives
    ///   `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error when there are none. Producers normally ignore the result: an
    /// event with no listeners is not a failure.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber receiving all future events.
    ///
    /// Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emit_reaches_every_subscriber() {
        let bus = EventBus::new(16);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        let event = CoreEvent::Playback(PlaybackEvent::Stopped);
        let delivered = bus.emit(event.clone()).unwrap();
        assert_eq!(delivered, 2);

        assert_eq!(first.recv().await.unwrap(), event);
        assert_eq!(second.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn emit_without_subscribers_is_an_error_not_a_panic() {
        let bus = EventBus::new(16);
        assert!(bus
            .emit(CoreEvent::Playlist(PlaylistEvent::EndReached))
            .is_err());
    }

    #[test]
    fn severity_classification() {
        let error = CoreEvent::Playback(PlaybackEvent::Error {
            track_id: None,
            message: "device gone".to_string(),
        });
        assert_eq!(error.severity(), EventSeverity::Error);

        let tick = CoreEvent::Playback(PlaybackEvent::PositionChanged {
            position_ms: 1000,
            duration_ms: 10_000,
        });
        assert_eq!(tick.severity(), EventSeverity::Debug);

        let done = CoreEvent::Download(DownloadEvent::Completed {
            download_id: "d1".to_string(),
            file_path: "/tmp/a.mp3".to_string(),
            total_bytes: 1000,
        });
        assert_eq!(done.severity(), EventSeverity::Info);
    }

    #[test]
    fn events_serialize_with_tagged_envelope() {
        let event = CoreEvent::Download(DownloadEvent::Failed {
            download_id: "d2".to_string(),
            reason: "no playable URL".to_string(),
        });
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"Download\""));
        let back: CoreEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
