//! # Playback Engine
//!
//! Owns the one active playback session: loading (local open or streamed
//! temp file), the play/pause/resume/stop/seek/volume surface, and the
//! background position tracker.
//!
//! ## Concurrency model
//!
//! Every session-state transition serializes through a single async mutex,
//! so a `seek` issued concurrently with an in-flight end-of-track event
//! resolves in a defined order instead of racing. The position tracker is a
//! dedicated spawned loop carrying a generation number: bumping the
//! generation (on stop, pause, seek, or a new play) retires the old loop,
//! and a retired generation re-checks itself *under the session lock* before
//! every write, so a stale tracker can never emit a position after a newer
//! baseline. No code path joins the tracker thread; calling `stop` from an
//! event subscriber cannot deadlock because event delivery is channel-based.
//!
//! ## Media lifecycle
//!
//! Remote loads stream to exactly one engine-owned temp file, deleted on
//! `stop` and replaced by the next `load`. Local loads open the user's file
//! directly and never delete it.

use bridge_traits::audio::{AudioOutput, DurationResolver};
use bridge_traits::http::{HttpClient, HttpRequest};
use bridge_traits::resolver::TrackResolver;
use bridge_traits::track::{AudioQuality, TrackRef};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use core_transfer::{FileSink, TransferFetcher};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{PlayerError, Result};
use crate::session::{LoadedMedia, PlaybackSession, PlaybackSnapshot, PlaybackState};

/// The streaming playback engine.
///
/// Cheap to clone; all clones share the same session.
#[derive(Clone)]
pub struct PlayerEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    session: Mutex<PlaybackSession>,
    device: Arc<dyn AudioOutput>,
    resolver: Arc<dyn TrackResolver>,
    durations: Arc<dyn DurationResolver>,
    fetcher: TransferFetcher,
    events: EventBus,
    config: CoreConfig,
    /// Generation of the currently authorized position tracker. A loop whose
    /// generation no longer matches must exit without touching the session.
    tracker_generation: AtomicU64,
    /// Cancellation for the in-flight load fetch, if any.
    fetch_cancel: parking_lot::Mutex<CancellationToken>,
}

impl EngineInner {
    fn next_generation(&self) -> u64 {
        self.tracker_generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    fn current_generation(&self) -> u64 {
        self.tracker_generation.load(Ordering::Acquire)
    }

    /// Replace the load-fetch token, returning the fresh one.
    fn reset_fetch_token(&self) -> CancellationToken {
        let mut guard = self.fetch_cancel.lock();
        *guard = CancellationToken::new();
        guard.clone()
    }

    fn emit(&self, event: PlaybackEvent) {
        // An event with no listeners is not a failure.
        let _ = self.events.emit(CoreEvent::Playback(event));
    }
}

fn ms(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

impl PlayerEngine {
    pub fn new(
        device: Arc<dyn AudioOutput>,
        resolver: Arc<dyn TrackResolver>,
        durations: Arc<dyn DurationResolver>,
        http: Arc<dyn HttpClient>,
        events: EventBus,
        config: CoreConfig,
    ) -> Self {
        let fetcher = TransferFetcher::new(http)
            .with_timeout(config.http_timeout)
            .with_chunk_size(config.chunk_size);
        Self {
            inner: Arc::new(EngineInner {
                session: Mutex::new(PlaybackSession::new()),
                device,
                resolver,
                durations,
                fetcher,
                events,
                config,
                tracker_generation: AtomicU64::new(0),
                fetch_cancel: parking_lot::Mutex::new(CancellationToken::new()),
            }),
        }
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Resolve `track` to a playable location and load it.
    ///
    /// Local tracks open directly; remote tracks go through the resolver and
    /// then stream to a temp file. Ends in `Stopped` with `position == 0`.
    pub async fn load_track(&self, track: &TrackRef, quality: AudioQuality) -> Result<()> {
        if track.is_local() {
            let path = track.local_path.clone().ok_or_else(|| {
                PlayerError::InvalidState("local track without a file path".to_string())
            })?;
            self.load_local(track.clone(), path).await
        } else {
            let resolved = self
                .inner
                .resolver
                .resolve(&track.id, &track.source, quality)
                .await?;
            match resolved {
                Some(source) => self.load_remote(track.clone(), &source.url).await,
                None => Err(PlayerError::UnresolvedTrack(track.title.clone())),
            }
        }
    }

    /// Stream `url` to a temp file and load it for `track`.
    pub async fn load_remote(&self, track: TrackRef, url: &str) -> Result<()> {
        self.stop().await?;

        let token = self.inner.reset_fetch_token();
        let temp_path = self.temp_path_for(url);
        info!(title = %track.title, path = %temp_path.display(), "loading remote track");

        let fetched = self.fetch_to_temp(url, &temp_path, &token).await;
        let committed = match fetched {
            Ok(bytes) => {
                debug!(bytes, "remote payload materialized");
                self.commit_load(track, temp_path.clone(), true, &token).await
            }
            Err(e) => Err(e),
        };

        if committed.is_err() {
            // Never leave a partial temp file behind on a failed load.
            let _ = tokio::fs::remove_file(&temp_path).await;
        }
        committed
    }

    /// Load a local audio file for `track`.
    pub async fn load_local(&self, track: TrackRef, path: PathBuf) -> Result<()> {
        self.stop().await?;

        let token = self.inner.reset_fetch_token();
        tokio::fs::metadata(&path).await?;
        info!(title = %track.title, path = %path.display(), "loading local track");
        self.commit_load(track, path, false, &token).await
    }

    async fn fetch_to_temp(
        &self,
        url: &str,
        temp_path: &Path,
        token: &CancellationToken,
    ) -> Result<u64> {
        let mut sink = FileSink::create(temp_path).await?;

        let mut request = HttpRequest::get(url);
        if let Some(user_agent) = &self.inner.config.user_agent {
            request = request.header("User-Agent", user_agent.clone());
        }
        if let Some(referer) = &self.inner.config.referer {
            request = request.header("Referer", referer.clone());
        }

        Ok(self.inner.fetcher.fetch(request, &mut sink, None, token).await?)
    }

    async fn commit_load(
        &self,
        track: TrackRef,
        path: PathBuf,
        temp: bool,
        token: &CancellationToken,
    ) -> Result<()> {
        let duration = self.inner.durations.resolve(&path).await?;

        let mut session = self.inner.session.lock().await;

        // A stop() that raced the fetch wins: the load is abandoned.
        if token.is_cancelled() {
            return Err(PlayerError::Transfer(core_transfer::TransferError::Cancelled));
        }

        self.inner
            .device
            .open(&path)
            .await
            .map_err(|e| PlayerError::UnsupportedFormat(e.to_string()))?;
        if let Err(e) = self.inner.device.set_volume(session.volume).await {
            warn!(error = %e, "device rejected volume at load");
        }

        info!(
            title = %track.title,
            duration_secs = duration.duration().as_secs_f64(),
            exact = duration.is_exact(),
            "track loaded"
        );

        session.track = Some(track);
        session.media = Some(LoadedMedia { path, temp });
        session.duration = duration.duration();
        session.position = Duration::ZERO;
        session.pending_seek = None;
        session.started_at = None;
        session.state = PlaybackState::Stopped;
        Ok(())
    }

    fn temp_path_for(&self, url: &str) -> PathBuf {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        url.hash(&mut hasher);
        let digest = hasher.finish();

        let extension = url
            .split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit('.').next())
            .filter(|ext| ext.len() <= 4 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("mp3")
            .to_ascii_lowercase();

        self.inner
            .config
            .temp_dir
            .join(format!("aria_stream_{digest:016x}.{extension}"))
    }

    // ========================================================================
    // Transport controls
    // ========================================================================

    /// Start playback from `Stopped` (honoring a pending seek target) or
    /// resume from `Paused`. No-op while already `Playing`.
    pub async fn play(&self) -> Result<()> {
        let mut session = self.inner.session.lock().await;
        if session.media.is_none() {
            return Err(PlayerError::InvalidState("no track loaded".to_string()));
        }

        match session.state {
            PlaybackState::Playing => Ok(()),
            PlaybackState::Paused => {
                if let Err(e) = self.inner.device.resume().await {
                    return Err(self.force_stop_after_device_failure(&mut session, "resume", e).await);
                }
                session.state = PlaybackState::Playing;
                session.started_at = Instant::now().checked_sub(session.position);
                let generation = self.inner.next_generation();
                spawn_tracker(Arc::clone(&self.inner), generation);
                self.inner.emit(PlaybackEvent::Resumed {
                    position_ms: ms(session.position),
                });
                debug!(position_secs = session.position.as_secs_f64(), "resumed");
                Ok(())
            }
            PlaybackState::Stopped => {
                let start = session.pending_seek.take().unwrap_or(Duration::ZERO);
                if let Err(e) = self.inner.device.play(Some(start)).await {
                    return Err(self.force_stop_after_device_failure(&mut session, "play", e).await);
                }
                session.position = start;
                session.state = PlaybackState::Playing;
                session.started_at = Instant::now().checked_sub(start);
                let generation = self.inner.next_generation();
                spawn_tracker(Arc::clone(&self.inner), generation);

                let (track_id, title) = session
                    .track
                    .as_ref()
                    .map(|t| (t.id.clone(), t.title.clone()))
                    .unwrap_or_default();
                self.inner.emit(PlaybackEvent::Started { track_id, title });
                info!(
                    start_secs = start.as_secs_f64(),
                    duration_secs = session.duration.as_secs_f64(),
                    "playback started"
                );
                Ok(())
            }
        }
    }

    /// Pause playback. No-op unless `Playing`.
    pub async fn pause(&self) -> Result<()> {
        let mut session = self.inner.session.lock().await;
        if session.state != PlaybackState::Playing {
            return Ok(());
        }

        // Freeze the position before the tracker is retired.
        let device_pos = self.inner.device.playback_clock().await;
        let raw = device_pos
            .or_else(|| session.started_at.map(|s| s.elapsed()))
            .unwrap_or(session.position);
        session.position = raw.clamp(session.position, session.duration);

        self.inner.next_generation();
        if let Err(e) = self.inner.device.pause().await {
            return Err(self.force_stop_after_device_failure(&mut session, "pause", e).await);
        }
        session.state = PlaybackState::Paused;
        session.started_at = None;
        self.inner.emit(PlaybackEvent::Paused {
            position_ms: ms(session.position),
        });
        debug!(position_secs = session.position.as_secs_f64(), "paused");
        Ok(())
    }

    /// Resume playback after a pause. Alias for [`play`](Self::play).
    pub async fn resume(&self) -> Result<()> {
        self.play().await
    }

    /// Pause when playing, otherwise play.
    pub async fn toggle_play(&self) -> Result<()> {
        let state = self.state().await;
        match state {
            PlaybackState::Playing => self.pause().await,
            _ => self.play().await,
        }
    }

    /// Stop playback from any state: halts the device, retires the tracker,
    /// resets the position, and deletes the engine-owned temp file.
    ///
    /// Safe to call from an event-subscriber context and idempotent: a
    /// second call is a no-op.
    pub async fn stop(&self) -> Result<()> {
        // Cancel any in-flight load first so a loading task releases the
        // session lock promptly instead of finishing its fetch.
        self.inner.fetch_cancel.lock().cancel();
        self.inner.next_generation();

        let mut session = self.inner.session.lock().await;
        self.stop_locked(&mut session).await;
        Ok(())
    }

    async fn stop_locked(&self, session: &mut PlaybackSession) {
        let has_temp = session.media.as_ref().map(|m| m.temp).unwrap_or(false);
        if session.state == PlaybackState::Stopped && session.position.is_zero() && !has_temp {
            return;
        }

        if let Err(e) = self.inner.device.stop().await {
            warn!(error = %e, "device stop failed during teardown");
        }

        session.state = PlaybackState::Stopped;
        session.position = Duration::ZERO;
        session.pending_seek = None;
        session.started_at = None;

        if has_temp {
            if let Some(media) = session.media.take() {
                match tokio::fs::remove_file(&media.path).await {
                    Ok(()) => debug!(path = %media.path.display(), "temp file removed"),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => warn!(path = %media.path.display(), error = %e, "temp file cleanup failed"),
                }
            }
        }

        self.inner.emit(PlaybackEvent::Stopped);
        info!("playback stopped");
    }

    /// Seek to `target`, clamped to `[0, duration]`.
    ///
    /// Preserves the caller-visible state: seeking while `Playing` keeps
    /// playing from the target, while `Paused` stays paused there, and while
    /// `Stopped` records the target for the next `play`. Emits an immediate
    /// position notification establishing the new baseline.
    pub async fn seek(&self, target: Duration) -> Result<()> {
        let mut session = self.inner.session.lock().await;
        if session.media.is_none() {
            return Err(PlayerError::InvalidState(
                "seek with nothing loaded".to_string(),
            ));
        }

        let target = target.min(session.duration);
        let duration = session.duration;

        match session.state {
            PlaybackState::Stopped => {
                session.pending_seek = Some(target);
                session.position = target;
            }
            PlaybackState::Playing | PlaybackState::Paused => {
                let was_playing = session.state == PlaybackState::Playing;

                // Retire the tracker before repositioning so no tick computed
                // against the old baseline can land after our notification.
                self.inner.next_generation();

                if let Err(e) = self.inner.device.stop().await {
                    return Err(self.force_stop_after_device_failure(&mut session, "seek", e).await);
                }
                if let Err(e) = self.inner.device.play(Some(target)).await {
                    return Err(self.force_stop_after_device_failure(&mut session, "seek", e).await);
                }
                if !was_playing {
                    if let Err(e) = self.inner.device.pause().await {
                        return Err(self
                            .force_stop_after_device_failure(&mut session, "seek", e)
                            .await);
                    }
                }

                session.position = target;
                session.pending_seek = None;
                if was_playing {
                    session.started_at = Instant::now().checked_sub(target);
                    let generation = self.inner.next_generation();
                    spawn_tracker(Arc::clone(&self.inner), generation);
                } else {
                    session.started_at = None;
                }
            }
        }

        self.inner.emit(PlaybackEvent::PositionChanged {
            position_ms: ms(target),
            duration_ms: ms(duration),
        });
        info!(target_secs = target.as_secs_f64(), state = ?session.state, "seek complete");
        Ok(())
    }

    /// Set the output volume, clamped to `[0.0, 1.0]`. Applies immediately
    /// regardless of state.
    pub async fn set_volume(&self, volume: f32) -> Result<()> {
        if !volume.is_finite() {
            return Err(PlayerError::InvalidVolume(volume));
        }
        let volume = volume.clamp(0.0, 1.0);

        let mut session = self.inner.session.lock().await;
        session.volume = volume;
        if let Err(e) = self.inner.device.set_volume(volume).await {
            warn!(error = %e, volume, "device rejected volume");
        }
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Copy of the current session state.
    pub async fn snapshot(&self) -> PlaybackSnapshot {
        self.inner.session.lock().await.snapshot()
    }

    pub async fn state(&self) -> PlaybackState {
        self.inner.session.lock().await.state
    }

    pub async fn position(&self) -> Duration {
        self.inner.session.lock().await.position
    }

    pub async fn duration(&self) -> Duration {
        self.inner.session.lock().await.duration
    }

    pub async fn volume(&self) -> f32 {
        self.inner.session.lock().await.volume
    }

    pub async fn current_track(&self) -> Option<TrackRef> {
        self.inner.session.lock().await.track.clone()
    }

    // ========================================================================
    // Failure handling
    // ========================================================================

    /// A device call failed: log it, force the session to `Stopped`, surface
    /// the failure through the event bus, and hand back the typed error.
    async fn force_stop_after_device_failure(
        &self,
        session: &mut PlaybackSession,
        context: &str,
        cause: bridge_traits::BridgeError,
    ) -> PlayerError {
        error!(context, error = %cause, "audio device failure, forcing stop");
        self.inner.next_generation();

        let track_id = session.track.as_ref().map(|t| t.id.clone());
        self.inner.emit(PlaybackEvent::Error {
            track_id,
            message: format!("{context}: {cause}"),
        });

        self.stop_locked(session).await;
        PlayerError::Device(format!("{context}: {cause}"))
    }
}

// ============================================================================
// Position tracker
// ============================================================================

/// One tracker loop per authorized generation. The loop re-checks its
/// generation under the session lock before every write, so at most one
/// tracker observably updates the session at any time even if two loops
/// briefly coexist around a transition.
fn spawn_tracker(inner: Arc<EngineInner>, generation: u64) {
    tokio::spawn(async move {
        debug!(generation, "position tracker started");
        let poll = inner.config.position_poll_interval;
        let epsilon = inner.config.end_of_track_epsilon;

        loop {
            tokio::time::sleep(poll).await;
            if inner.current_generation() != generation {
                break;
            }

            // Sample the device before taking the lock; a slow device must
            // not stall control calls.
            let device_pos = inner.device.playback_clock().await;
            let device_busy = inner.device.is_busy().await;

            let mut session = inner.session.lock().await;
            if inner.current_generation() != generation {
                break;
            }
            if session.state != PlaybackState::Playing {
                break;
            }

            // Device clock when available, wall-clock delta otherwise -
            // never both, or positions would drift.
            let raw = device_pos
                .or_else(|| session.started_at.map(|s| s.elapsed()))
                .unwrap_or(session.position);
            let position = raw.clamp(session.position, session.duration);
            session.position = position;
            let duration = session.duration;

            inner.emit(PlaybackEvent::PositionChanged {
                position_ms: ms(position),
                duration_ms: ms(duration),
            });

            let finished =
                position >= duration || (!device_busy && position + epsilon >= duration);
            if finished {
                session.position = duration;
                session.state = PlaybackState::Stopped;
                session.started_at = None;
                let track_id = session.track_id();

                inner.emit(PlaybackEvent::PositionChanged {
                    position_ms: ms(duration),
                    duration_ms: ms(duration),
                });
                inner.emit(PlaybackEvent::Completed { track_id });
                info!(duration_secs = duration.as_secs_f64(), "track completed");
                break;
            }
        }
        debug!(generation, "position tracker exited");
    });
}
