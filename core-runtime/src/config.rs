//! # Core Configuration Module
//!
//! Shared settings for the playback, transfer, and download cores.
//!
//! ## Overview
//!
//! [`CoreConfig`] holds the tunable knobs the engine crates read: directory
//! layout, transfer chunking, notification cadence, and timing tolerances.
//! Construction uses `with_*` setters over [`CoreConfig::default`], and
//! [`CoreConfig::validate`] fails fast on values that would break an
//! invariant (zero chunk size, zero poll interval, inverted throttles)
//! instead of letting them surface as stalls at runtime.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::config::CoreConfig;
//! use std::time::Duration;
//!
//! let config = CoreConfig::default()
//!     .with_download_dir("downloads")
//!     .with_position_poll_interval(Duration::from_millis(100));
//! config.validate().expect("invalid core configuration");
//! ```

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default streaming chunk size: 8 KiB.
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Default position tracker poll interval.
pub const DEFAULT_POSITION_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default floor between download progress notifications (~20 Hz).
pub const DEFAULT_PROGRESS_MIN_INTERVAL: Duration = Duration::from_millis(50);

/// Default window over which transfer speed is recomputed.
pub const DEFAULT_SPEED_SAMPLE_INTERVAL: Duration = Duration::from_millis(500);

/// Shared configuration for the playback and download cores.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Directory completed downloads land in.
    pub download_dir: PathBuf,

    /// Directory for the playback engine's temporary audio files.
    pub temp_dir: PathBuf,

    /// Nominal chunk size for streaming transfers, in bytes.
    pub chunk_size: usize,

    /// Interval between position tracker ticks.
    pub position_poll_interval: Duration,

    /// Minimum interval between download progress notifications.
    pub progress_min_interval: Duration,

    /// Minimum window over which transfer speed is recomputed; shorter
    /// windows jitter.
    pub speed_sample_interval: Duration,

    /// Timeout applied to streaming HTTP requests.
    pub http_timeout: Duration,

    /// How close to the duration the position must get (with an idle
    /// device) before a track counts as finished.
    pub end_of_track_epsilon: Duration,

    /// User-Agent header sent with provider requests, when set.
    pub user_agent: Option<String>,

    /// Referer header sent with provider requests, when set.
    pub referer: Option<String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("downloads"),
            temp_dir: std::env::temp_dir(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            position_poll_interval: DEFAULT_POSITION_POLL_INTERVAL,
            progress_min_interval: DEFAULT_PROGRESS_MIN_INTERVAL,
            speed_sample_interval: DEFAULT_SPEED_SAMPLE_INTERVAL,
            http_timeout: Duration::from_secs(30),
            end_of_track_epsilon: Duration::from_secs(1),
            user_agent: Some(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
            ),
            referer: None,
        }
    }
}

impl CoreConfig {
    /// Set the download directory.
    pub fn with_download_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.download_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the temp directory used for streamed playback files.
    pub fn with_temp_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.temp_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the streaming chunk size in bytes.
    pub fn with_chunk_size(mut self, bytes: usize) -> Self {
        self.chunk_size = bytes;
        self
    }

    /// Set the position tracker poll interval.
    pub fn with_position_poll_interval(mut self, interval: Duration) -> Self {
        self.position_poll_interval = interval;
        self
    }

    /// Set the floor between download progress notifications.
    pub fn with_progress_min_interval(mut self, interval: Duration) -> Self {
        self.progress_min_interval = interval;
        self
    }

    /// Set the transfer speed sampling window.
    pub fn with_speed_sample_interval(mut self, interval: Duration) -> Self {
        self.speed_sample_interval = interval;
        self
    }

    /// Set the streaming HTTP timeout.
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Set the end-of-track detection epsilon.
    pub fn with_end_of_track_epsilon(mut self, epsilon: Duration) -> Self {
        self.end_of_track_epsilon = epsilon;
        self
    }

    /// Set the User-Agent header for provider requests.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the Referer header for provider requests.
    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    /// Validate the configuration, failing fast on unusable values.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be non-zero".to_string()));
        }
        if self.position_poll_interval.is_zero() {
            return Err(Error::Config(
                "position_poll_interval must be non-zero".to_string(),
            ));
        }
        if self.speed_sample_interval < self.progress_min_interval {
            return Err(Error::Config(format!(
                "speed_sample_interval ({:?}) must not be shorter than progress_min_interval ({:?})",
                self.speed_sample_interval, self.progress_min_interval
            )));
        }
        if self.http_timeout.is_zero() {
            return Err(Error::Config("http_timeout must be non-zero".to_string()));
        }
        Ok(())
    }
}
