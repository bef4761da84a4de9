//! Playback session state.
//!
//! The session is the single mutable record of what is loaded and where
//! playback stands. It is owned by the engine behind one async mutex; the
//! outside world only ever sees [`PlaybackSnapshot`] copies.

use bridge_traits::track::TrackRef;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Playback lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Nothing playing; initial state and the target of `stop`.
    Stopped,
    /// The device is producing audio.
    Playing,
    /// Playback suspended, position retained.
    Paused,
}

/// The audio file currently backing the session.
#[derive(Debug, Clone)]
pub(crate) struct LoadedMedia {
    /// Local path the device was opened with.
    pub path: PathBuf,
    /// Whether the file is an engine-owned temp file (deleted on stop or on
    /// the next load) as opposed to a user file.
    pub temp: bool,
}

/// Mutable state of the active playback session.
#[derive(Debug)]
pub(crate) struct PlaybackSession {
    pub state: PlaybackState,
    /// Elapsed playback time; `0 <= position <= duration` always.
    pub position: Duration,
    /// Resolved track duration (exact or estimated).
    pub duration: Duration,
    /// Volume in `[0.0, 1.0]`.
    pub volume: f32,
    /// The track the loaded media belongs to.
    pub track: Option<TrackRef>,
    /// The loaded media file, when a load has completed.
    pub media: Option<LoadedMedia>,
    /// Seek target consumed by the next `play` from `Stopped`.
    pub pending_seek: Option<Duration>,
    /// Wall-clock baseline while `Playing`: `now - started_at` is the
    /// fallback position when the device exposes no clock.
    pub started_at: Option<Instant>,
}

impl PlaybackSession {
    pub fn new() -> Self {
        Self {
            state: PlaybackState::Stopped,
            position: Duration::ZERO,
            duration: Duration::ZERO,
            volume: 0.5,
            track: None,
            media: None,
            pending_seek: None,
            started_at: None,
        }
    }

    /// Provider id of the loaded track, empty when none is loaded.
    pub fn track_id(&self) -> String {
        self.track.as_ref().map(|t| t.id.clone()).unwrap_or_default()
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            state: self.state,
            position: self.position,
            duration: self.duration,
            volume: self.volume,
            track: self.track.clone(),
        }
    }
}

/// Read-only copy of the session handed to external callers.
#[derive(Debug, Clone)]
pub struct PlaybackSnapshot {
    pub state: PlaybackState,
    pub position: Duration,
    pub duration: Duration,
    pub volume: f32,
    pub track: Option<TrackRef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_stopped_at_zero() {
        let session = PlaybackSession::new();
        assert_eq!(session.state, PlaybackState::Stopped);
        assert_eq!(session.position, Duration::ZERO);
        assert!(session.track.is_none());
        assert!(session.media.is_none());
        assert!(session.pending_seek.is_none());
    }

    #[test]
    fn snapshot_copies_fields() {
        let mut session = PlaybackSession::new();
        session.duration = Duration::from_secs(240);
        session.position = Duration::from_secs(42);
        session.volume = 0.8;

        let snapshot = session.snapshot();
        assert_eq!(snapshot.state, PlaybackState::Stopped);
        assert_eq!(snapshot.position, Duration::from_secs(42));
        assert_eq!(snapshot.duration, Duration::from_secs(240));
        assert_eq!(snapshot.volume, 0.8);
    }
}
