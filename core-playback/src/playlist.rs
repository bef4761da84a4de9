//! # Playlist Controller
//!
//! Ordered, mutable sequence of track references with a current-index
//! cursor. The controller owns the list exclusively; external readers get
//! snapshots, and `next`/`previous` only compute the target index and emit a
//! [`PlaylistEvent::TrackSelected`] - actually loading and playing the entry
//! is the host's job, keeping this controller decoupled from the engine.

use bridge_traits::track::TrackRef;
use core_runtime::events::{CoreEvent, EventBus, PlaylistEvent};
use tracing::{debug, info};

struct PlaylistState {
    tracks: Vec<TrackRef>,
    /// Cursor into `tracks`; `None` when nothing is selected.
    current: Option<usize>,
}

/// Ordered playlist with a cursor.
pub struct PlaylistController {
    state: parking_lot::Mutex<PlaylistState>,
    events: EventBus,
}

impl PlaylistController {
    pub fn new(events: EventBus) -> Self {
        Self {
            state: parking_lot::Mutex::new(PlaylistState {
                tracks: Vec::new(),
                current: None,
            }),
            events,
        }
    }

    fn emit(&self, event: PlaylistEvent) {
        let _ = self.events.emit(CoreEvent::Playlist(event));
    }

    /// `true` when `candidate` duplicates an entry already in `tracks`.
    ///
    /// Only non-empty ids deduplicate; local files legitimately share the
    /// empty id and are compared by path instead.
    fn is_duplicate(tracks: &[TrackRef], candidate: &TrackRef) -> bool {
        if !candidate.id.is_empty() {
            tracks.iter().any(|t| t.id == candidate.id)
        } else if let Some(path) = &candidate.local_path {
            tracks.iter().any(|t| t.local_path.as_ref() == Some(path))
        } else {
            false
        }
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Replace the playlist, dropping duplicates while preserving order.
    /// Clears the cursor.
    pub fn set(&self, tracks: Vec<TrackRef>) {
        let mut state = self.state.lock();
        let mut deduped: Vec<TrackRef> = Vec::with_capacity(tracks.len());
        for track in tracks {
            if !Self::is_duplicate(&deduped, &track) {
                deduped.push(track);
            }
        }
        info!(count = deduped.len(), "playlist replaced");
        state.tracks = deduped;
        state.current = None;
    }

    /// Append a track. Returns `false` (and leaves the list unchanged) when
    /// an entry with the same id is already present.
    pub fn add(&self, track: TrackRef) -> bool {
        let mut state = self.state.lock();
        if Self::is_duplicate(&state.tracks, &track) {
            debug!(title = %track.title, "duplicate track rejected");
            return false;
        }
        state.tracks.push(track);
        true
    }

    /// Remove every track and clear the cursor.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.tracks.clear();
        state.current = None;
        info!("playlist cleared");
    }

    /// Remove the entries at `indices` (out-of-range indices are ignored).
    ///
    /// Removal runs highest-to-lowest so earlier removals cannot shift later
    /// targets. The cursor shifts down for every removed entry before it and
    /// is invalidated when the current entry itself is removed - whether
    /// that should also stop playback is the host's decision.
    pub fn remove(&self, indices: &[usize]) {
        let mut state = self.state.lock();

        let mut sorted: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| i < state.tracks.len())
            .collect();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        sorted.dedup();

        for index in sorted {
            state.tracks.remove(index);
            state.current = match state.current {
                Some(current) if index == current => None,
                Some(current) if index < current => Some(current - 1),
                other => other,
            };
        }
        debug!(remaining = state.tracks.len(), cursor = ?state.current, "tracks removed");
    }

    /// Select `track` for playback: move the cursor to its entry, appending
    /// the track first when it is not in the list. Returns the selected
    /// index and emits [`PlaylistEvent::TrackSelected`].
    pub fn play_specific(&self, track: &TrackRef) -> usize {
        let mut state = self.state.lock();

        let found = state.tracks.iter().position(|t| {
            if !track.id.is_empty() {
                t.id == track.id
            } else {
                t.local_path.is_some() && t.local_path == track.local_path
            }
        });

        let index = match found {
            Some(index) => index,
            None => {
                state.tracks.push(track.clone());
                state.tracks.len() - 1
            }
        };
        state.current = Some(index);

        let selected = state.tracks[index].clone();
        drop(state);

        info!(index, title = %selected.title, "track selected");
        self.emit(PlaylistEvent::TrackSelected {
            index,
            track_id: selected.id,
            title: selected.title,
        });
        index
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Advance the cursor and emit [`PlaylistEvent::TrackSelected`] for the
    /// new entry. At the last entry (or on an empty list past the start)
    /// nothing moves; reaching the end emits [`PlaylistEvent::EndReached`]
    /// instead. Never plays anything itself.
    pub fn next(&self) -> Option<usize> {
        let mut state = self.state.lock();
        if state.tracks.is_empty() {
            return None;
        }

        let candidate = match state.current {
            None => 0,
            Some(current) if current + 1 < state.tracks.len() => current + 1,
            Some(_) => {
                drop(state);
                info!("playlist end reached");
                self.emit(PlaylistEvent::EndReached);
                return None;
            }
        };

        state.current = Some(candidate);
        let selected = state.tracks[candidate].clone();
        drop(state);

        debug!(index = candidate, title = %selected.title, "advanced to next track");
        self.emit(PlaylistEvent::TrackSelected {
            index: candidate,
            track_id: selected.id,
            title: selected.title,
        });
        Some(candidate)
    }

    /// Step the cursor back and emit [`PlaylistEvent::TrackSelected`].
    /// A silent no-op at index 0 or with no selection.
    pub fn previous(&self) -> Option<usize> {
        let mut state = self.state.lock();
        let candidate = match state.current {
            Some(current) if current > 0 => current - 1,
            _ => return None,
        };

        state.current = Some(candidate);
        let selected = state.tracks[candidate].clone();
        drop(state);

        debug!(index = candidate, title = %selected.title, "stepped to previous track");
        self.emit(PlaylistEvent::TrackSelected {
            index: candidate,
            track_id: selected.id,
            title: selected.title,
        });
        Some(candidate)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Snapshot of the playlist contents.
    pub fn tracks(&self) -> Vec<TrackRef> {
        self.state.lock().tracks.clone()
    }

    /// Current cursor, when something is selected.
    pub fn current_index(&self) -> Option<usize> {
        self.state.lock().current
    }

    /// Copy of the entry under the cursor.
    pub fn current_track(&self) -> Option<TrackRef> {
        let state = self.state.lock();
        state.current.and_then(|i| state.tracks.get(i).cloned())
    }

    /// Copy of the entry at `index`.
    pub fn track_at(&self, index: usize) -> Option<TrackRef> {
        self.state.lock().tracks.get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().tracks.is_empty()
    }
}
