//! # Download Queue Manager
//!
//! FIFO queue of download requests drained by one sequential worker.
//!
//! ## Worker model
//!
//! `enqueue` on an idle manager spawns the worker; `enqueue` while busy only
//! appends. The worker pops items one at a time, resolves a URL, streams the
//! payload to a collision-free destination file, and moves the item to the
//! append-only history as `Completed` or `Failed(reason)` - a single item's
//! failure never halts the queue. When the queue drains the worker exits;
//! the idle/running handoff happens under the state lock, so an enqueue can
//! never be lost between "queue empty" and "worker exited".
//!
//! ## Progress
//!
//! Raw transfer progress arrives per network chunk; the manager throttles
//! notifications to at most one per `progress_min_interval` (~20 Hz) and
//! augments them with a transfer-speed estimate recomputed over
//! `speed_sample_interval` windows to smooth jitter. Progress for one item
//! is monotonically non-decreasing in downloaded bytes.

use bridge_traits::http::{HttpClient, HttpRequest};
use bridge_traits::resolver::TrackResolver;
use bridge_traits::track::{AudioQuality, TrackRef, TrackSource};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, DownloadEvent, EventBus};
use core_transfer::{FileSink, TransferError, TransferFetcher};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{DownloadError, Result};
use crate::item::{DownloadId, DownloadItem};

/// Longest filename stem kept when sanitizing titles.
const MAX_FILENAME_LEN: usize = 100;

struct ManagerState {
    queue: VecDeque<DownloadItem>,
    history: Vec<DownloadItem>,
    worker_running: bool,
}

struct ManagerInner {
    state: parking_lot::Mutex<ManagerState>,
    resolver: Arc<dyn TrackResolver>,
    fetcher: TransferFetcher,
    events: EventBus,
    config: CoreConfig,
    /// Token the in-flight transfer checks; replaced after a `cancel_all`.
    cancel: parking_lot::Mutex<CancellationToken>,
}

impl ManagerInner {
    fn emit(&self, event: DownloadEvent) {
        let _ = self.events.emit(CoreEvent::Download(event));
    }
}

/// Sequential download queue with progress reporting and cancellation.
///
/// Cheap to clone; all clones share the same queue and worker.
#[derive(Clone)]
pub struct DownloadManager {
    inner: Arc<ManagerInner>,
}

impl DownloadManager {
    pub fn new(
        resolver: Arc<dyn TrackResolver>,
        http: Arc<dyn HttpClient>,
        events: EventBus,
        config: CoreConfig,
    ) -> Self {
        let fetcher = TransferFetcher::new(http)
            .with_timeout(config.http_timeout)
            .with_chunk_size(config.chunk_size);
        Self {
            inner: Arc::new(ManagerInner {
                state: parking_lot::Mutex::new(ManagerState {
                    queue: VecDeque::new(),
                    history: Vec::new(),
                    worker_running: false,
                }),
                resolver,
                fetcher,
                events,
                config,
                cancel: parking_lot::Mutex::new(CancellationToken::new()),
            }),
        }
    }

    // ========================================================================
    // Queue operations
    // ========================================================================

    /// Append a download request, starting the worker when idle.
    ///
    /// Returns a snapshot of the queued item. Fails only when the download
    /// directory cannot be created - that aborts this one enqueue, not the
    /// manager.
    pub async fn enqueue(
        &self,
        track: TrackRef,
        source: TrackSource,
        quality: AudioQuality,
    ) -> Result<DownloadItem> {
        tokio::fs::create_dir_all(&self.inner.config.download_dir).await?;

        let item = DownloadItem::new(track, source, quality);
        let snapshot = item.clone();
        info!(download_id = %item.id, title = %item.track.title, "enqueued download");

        let spawn_worker = {
            let mut state = self.inner.state.lock();
            state.queue.push_back(item);
            if state.worker_running {
                false
            } else {
                state.worker_running = true;
                true
            }
        };

        if spawn_worker {
            // A cancel_all leaves a fired token behind; the next batch
            // starts with a fresh one.
            {
                let mut token = self.inner.cancel.lock();
                if token.is_cancelled() {
                    *token = CancellationToken::new();
                }
            }
            let inner = Arc::clone(&self.inner);
            tokio::spawn(run_worker(inner));
        }

        Ok(snapshot)
    }

    /// Remove a still-queued item. Returns `false` when `id` is not in the
    /// waiting portion of the queue (already downloading, finished, or
    /// unknown).
    pub fn dequeue(&self, id: DownloadId) -> bool {
        let mut state = self.inner.state.lock();
        match state.queue.iter().position(|item| item.id == id) {
            Some(index) => {
                let removed = state.queue.remove(index);
                if let Some(item) = removed {
                    info!(download_id = %item.id, title = %item.track.title, "removed from queue");
                }
                true
            }
            None => false,
        }
    }

    /// Clear the waiting queue and signal the in-flight transfer (if any) to
    /// stop at its next cancellation checkpoint. The partially downloaded
    /// file is left on disk.
    pub fn cancel_all(&self) {
        let cleared = {
            let mut state = self.inner.state.lock();
            let cleared = state.queue.len();
            state.queue.clear();
            cleared
        };
        self.inner.cancel.lock().cancel();
        info!(cleared, "cancelled all downloads");
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Snapshot of the waiting queue.
    pub fn queue(&self) -> Vec<DownloadItem> {
        self.inner.state.lock().queue.iter().cloned().collect()
    }

    /// Snapshot of the append-only history.
    pub fn history(&self) -> Vec<DownloadItem> {
        self.inner.state.lock().history.clone()
    }

    /// Whether the worker is currently draining the queue.
    pub fn is_busy(&self) -> bool {
        self.inner.state.lock().worker_running
    }
}

// ============================================================================
// Worker
// ============================================================================

async fn run_worker(inner: Arc<ManagerInner>) {
    debug!("download worker started");
    loop {
        let next = {
            let mut state = inner.state.lock();
            match state.queue.pop_front() {
                Some(item) => Some(item),
                None => {
                    // Idle handoff under the lock: an enqueue observing
                    // worker_running == false will spawn a fresh worker.
                    state.worker_running = false;
                    None
                }
            }
        };

        let Some(mut item) = next else { break };
        process_item(&inner, &mut item).await;

        debug_assert!(item.status.is_terminal());
        inner.state.lock().history.push(item);
    }
    debug!("download worker exited");
}

async fn process_item(inner: &Arc<ManagerInner>, item: &mut DownloadItem) {
    let token = inner.cancel.lock().clone();
    info!(download_id = %item.id, title = %item.track.title, "processing download");

    // Resolve a playable URL first; no URL is a terminal per-item failure.
    let resolved = match inner
        .resolver
        .resolve(&item.track.id, &item.source, item.quality)
        .await
    {
        Ok(Some(resolved)) => resolved,
        Ok(None) => {
            let reason = DownloadError::UnresolvedTrack(item.track.title.clone()).to_string();
            fail_item(inner, item, reason);
            return;
        }
        Err(e) => {
            fail_item(inner, item, format!("resolver failure: {e}"));
            return;
        }
    };

    // Pin down a collision-free destination before the first byte arrives.
    let path = match destination_path(&inner.config.download_dir, item).await {
        Ok(path) => path,
        Err(e) => {
            fail_item(inner, item, format!("destination unavailable: {e}"));
            return;
        }
    };

    item.start(path.clone());
    if let Some(size) = resolved.size {
        item.total_bytes = Some(size);
    }
    inner.emit(DownloadEvent::Started {
        download_id: item.id.as_str(),
        title: item.track.title.clone(),
        file_path: path.display().to_string(),
    });

    let mut sink = match FileSink::create(&path).await {
        Ok(sink) => sink,
        Err(e) => {
            fail_item(inner, item, format!("cannot create file: {e}"));
            return;
        }
    };

    let mut request = HttpRequest::get(&resolved.url);
    if let Some(user_agent) = &inner.config.user_agent {
        request = request.header("User-Agent", user_agent.clone());
    }
    if let Some(referer) = &inner.config.referer {
        request = request.header("Referer", referer.clone());
    }

    let reporter = ProgressReporter::new(inner, item.id);
    let progress = {
        let reporter = reporter.clone();
        move |downloaded: u64, total: Option<u64>| reporter.observe(downloaded, total)
    };

    match inner
        .fetcher
        .fetch(request, &mut sink, Some(&progress), &token)
        .await
    {
        Ok(written) => {
            item.complete(written);
            item.speed_bps = reporter.last_speed();
            inner.emit(DownloadEvent::Progress {
                download_id: item.id.as_str(),
                percent: 100,
                downloaded_bytes: written,
                total_bytes: Some(written),
                speed_bps: item.speed_bps,
            });
            inner.emit(DownloadEvent::Completed {
                download_id: item.id.as_str(),
                file_path: path.display().to_string(),
                total_bytes: written,
            });
            info!(download_id = %item.id, bytes = written, path = %path.display(), "download completed");
        }
        Err(e @ TransferError::Cancelled) => {
            // Partial file intentionally left on disk.
            let (downloaded, _) = reporter.totals();
            item.downloaded_bytes = downloaded;
            fail_item(inner, item, e.to_string());
        }
        Err(e) => {
            let (downloaded, total) = reporter.totals();
            item.downloaded_bytes = downloaded;
            if total.is_some() {
                item.total_bytes = total;
            }
            fail_item(inner, item, e.to_string());
        }
    }
}

fn fail_item(inner: &Arc<ManagerInner>, item: &mut DownloadItem, reason: String) {
    warn!(download_id = %item.id, title = %item.track.title, reason = %reason, "download failed");
    item.fail(reason.clone());
    inner.emit(DownloadEvent::Failed {
        download_id: item.id.as_str(),
        reason,
    });
}

// ============================================================================
// Progress throttling & speed estimation
// ============================================================================

struct ProgressWindow {
    best_downloaded: u64,
    last_total: Option<u64>,
    last_emit: Option<Instant>,
    window_start: Instant,
    window_bytes: u64,
    speed_bps: u64,
}

/// Shared between the transfer callback and the worker.
#[derive(Clone)]
struct ProgressReporter {
    inner: Arc<ManagerInner>,
    id: DownloadId,
    window: Arc<parking_lot::Mutex<ProgressWindow>>,
}

impl ProgressReporter {
    fn new(inner: &Arc<ManagerInner>, id: DownloadId) -> Self {
        Self {
            inner: Arc::clone(inner),
            id,
            window: Arc::new(parking_lot::Mutex::new(ProgressWindow {
                best_downloaded: 0,
                last_total: None,
                last_emit: None,
                window_start: Instant::now(),
                window_bytes: 0,
                speed_bps: 0,
            })),
        }
    }

    fn observe(&self, downloaded: u64, total: Option<u64>) {
        let mut window = self.window.lock();

        // Per-item progress is monotone; drop anything out of order.
        if downloaded < window.best_downloaded {
            return;
        }
        window.best_downloaded = downloaded;
        window.last_total = total;

        let now = Instant::now();
        let window_elapsed = now.duration_since(window.window_start);
        if window_elapsed >= self.inner.config.speed_sample_interval {
            let delta = downloaded - window.window_bytes;
            window.speed_bps = (delta as f64 / window_elapsed.as_secs_f64()) as u64;
            window.window_start = now;
            window.window_bytes = downloaded;
        }

        // Throttle UI notifications; the first chunk always reports.
        if let Some(last) = window.last_emit {
            if now.duration_since(last) < self.inner.config.progress_min_interval {
                return;
            }
        }
        window.last_emit = Some(now);

        let percent = match total {
            Some(total) if total > 0 => ((downloaded * 100) / total).min(100) as u8,
            _ => 0,
        };
        let speed_bps = window.speed_bps;
        drop(window);

        self.inner.emit(DownloadEvent::Progress {
            download_id: self.id.as_str(),
            percent,
            downloaded_bytes: downloaded,
            total_bytes: total,
            speed_bps,
        });
    }

    fn last_speed(&self) -> u64 {
        self.window.lock().speed_bps
    }

    fn totals(&self) -> (u64, Option<u64>) {
        let window = self.window.lock();
        (window.best_downloaded, window.last_total)
    }
}

// ============================================================================
// Destination naming
// ============================================================================

/// Strip characters that are illegal in filenames and bound the length.
fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            other => other,
        })
        .take(MAX_FILENAME_LEN)
        .collect();
    cleaned.trim().to_string()
}

/// File extension by provider and quality tier.
fn extension_for(source: &TrackSource, quality: AudioQuality) -> &'static str {
    match source {
        TrackSource::Remote(tag) => match tag.as_str() {
            "kuwo" | "joox" => "mp3",
            "netease" => {
                if quality.is_lossless() {
                    "flac"
                } else {
                    "mp3"
                }
            }
            _ => "mp3",
        },
        TrackSource::Local => "mp3",
    }
}

/// `Artist - Title (quality)` stem for the destination file.
fn filename_stem(item: &DownloadItem) -> String {
    let mut stem = sanitize_filename(&item.track.title);
    if stem.is_empty() {
        stem = "Unknown Track".to_string();
    }

    let artist = sanitize_filename(&item.track.artist.join(" "));
    if !artist.is_empty() {
        stem = format!("{artist} - {stem}");
    }

    format!("{stem} ({})", item.quality.filename_suffix())
}

/// Pick a destination path, appending ` (n)` until it does not collide.
async fn destination_path(dir: &Path, item: &DownloadItem) -> std::io::Result<PathBuf> {
    let stem = filename_stem(item);
    let extension = extension_for(&item.source, item.quality);

    let mut candidate = dir.join(format!("{stem}.{extension}"));
    let mut counter = 1u32;
    while tokio::fs::try_exists(&candidate).await? {
        candidate = dir.join(format!("{stem} ({counter}).{extension}"));
        counter += 1;
    }
    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::track::ArtistInfo;

    fn item_with(title: &str, artists: &[&str], source: &str, quality: AudioQuality) -> DownloadItem {
        let track = TrackRef::remote("1", title, source)
            .with_artist(ArtistInfo::normalize(
                artists.iter().map(|a| a.to_string()).collect(),
            ));
        DownloadItem::new(track, TrackSource::Remote(source.to_string()), quality)
    }

    #[test]
    fn sanitize_replaces_illegal_characters() {
        assert_eq!(sanitize_filename("a/b\\c:d*e?f\"g<h>i|j"), "a_b_c_d_e_f_g_h_i_j");
        assert_eq!(sanitize_filename("  plain  "), "plain");
    }

    #[test]
    fn sanitize_bounds_length() {
        let long = "x".repeat(500);
        assert_eq!(sanitize_filename(&long).len(), MAX_FILENAME_LEN);
    }

    #[test]
    fn extension_table() {
        let netease = TrackSource::Remote("netease".into());
        assert_eq!(extension_for(&netease, AudioQuality::Kbps320), "mp3");
        assert_eq!(extension_for(&netease, AudioQuality::Lossless), "flac");
        assert_eq!(extension_for(&netease, AudioQuality::HiRes), "flac");

        let kuwo = TrackSource::Remote("kuwo".into());
        assert_eq!(extension_for(&kuwo, AudioQuality::HiRes), "mp3");
        let unknown = TrackSource::Remote("somewhere".into());
        assert_eq!(extension_for(&unknown, AudioQuality::Kbps128), "mp3");
    }

    #[test]
    fn stem_includes_artist_and_quality() {
        let item = item_with("Song", &["Alice", "Bob"], "netease", AudioQuality::Kbps320);
        assert_eq!(filename_stem(&item), "Alice Bob - Song (320kbps)");

        let no_artist = item_with("Solo", &[], "netease", AudioQuality::HiRes);
        assert_eq!(filename_stem(&no_artist), "Solo (Hi-Res)");
    }

    #[tokio::test]
    async fn destination_appends_counter_on_collision() {
        let dir = tempfile::tempdir().unwrap();
        let item = item_with("Song", &["Artist"], "netease", AudioQuality::Kbps320);

        let first = destination_path(dir.path(), &item).await.unwrap();
        assert_eq!(
            first.file_name().unwrap().to_str().unwrap(),
            "Artist - Song (320kbps).mp3"
        );
        tokio::fs::write(&first, b"x").await.unwrap();

        let second = destination_path(dir.path(), &item).await.unwrap();
        assert_eq!(
            second.file_name().unwrap().to_str().unwrap(),
            "Artist - Song (320kbps) (1).mp3"
        );
        tokio::fs::write(&second, b"x").await.unwrap();

        let third = destination_path(dir.path(), &item).await.unwrap();
        assert_eq!(
            third.file_name().unwrap().to_str().unwrap(),
            "Artist - Song (320kbps) (2).mp3"
        );
    }
}
