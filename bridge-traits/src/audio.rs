//! Audio output and duration-probing abstractions.
//!
//! The playback engine drives a platform decode/output device through
//! [`AudioOutput`] and never touches decoding itself. Track length comes
//! from a [`DurationResolver`], which may only be able to estimate it.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::error::Result;

/// Platform decode/output device driven by the playback engine.
///
/// One device instance plays at most one file at a time; `open` replaces any
/// previously opened file. Implementations own all codec work.
#[async_trait]
pub trait AudioOutput: Send + Sync {
    /// Load an audio file into the device, replacing the current one.
    async fn open(&self, path: &Path) -> Result<()>;

    /// Start playback from the given offset (start of file when `None`).
    async fn play(&self, start: Option<Duration>) -> Result<()>;

    /// Pause playback without losing position.
    async fn pause(&self) -> Result<()>;

    /// Resume playback after a pause.
    async fn resume(&self) -> Result<()>;

    /// Halt playback and release the decoded stream.
    async fn stop(&self) -> Result<()>;

    /// Set output volume, normalized to `0.0..=1.0`.
    async fn set_volume(&self, volume: f32) -> Result<()>;

    /// Whether the device is currently producing audio.
    async fn is_busy(&self) -> bool;

    /// The device's own playback clock, when it exposes one.
    ///
    /// Devices that cannot report elapsed time return `None`; the engine then
    /// falls back to wall-clock tracking.
    async fn playback_clock(&self) -> Option<Duration>;
}

/// A resolved track duration, flagged by how trustworthy it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationEstimate {
    /// Parsed from container metadata.
    Exact(Duration),
    /// Derived from byte size and an assumed bitrate. Approximate only;
    /// callers must not treat it as authoritative.
    Estimated(Duration),
}

impl DurationEstimate {
    pub fn duration(&self) -> Duration {
        match self {
            DurationEstimate::Exact(d) | DurationEstimate::Estimated(d) => *d,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, DurationEstimate::Exact(_))
    }
}

/// Resolves the duration of a local audio file.
#[async_trait]
pub trait DurationResolver: Send + Sync {
    /// Probe `path` and return its duration.
    ///
    /// Implementations should prefer container metadata and fall back to a
    /// size/bitrate estimate rather than failing on unparseable containers.
    async fn resolve(&self, path: &Path) -> Result<DurationEstimate>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_estimate_accessors() {
        let exact = DurationEstimate::Exact(Duration::from_secs(240));
        assert!(exact.is_exact());
        assert_eq!(exact.duration(), Duration::from_secs(240));

        let estimated = DurationEstimate::Estimated(Duration::from_secs(180));
        assert!(!estimated.is_exact());
        assert_eq!(estimated.duration(), Duration::from_secs(180));
    }
}
