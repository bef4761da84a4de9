//! Track duration probing via `lofty`.
//!
//! Container metadata is authoritative when it parses. When it does not, the
//! duration is estimated from the file size and an assumed bitrate for the
//! extension, clamped to a plausible track length. Estimates are flagged as
//! such so callers never mistake them for exact values.

use async_trait::async_trait;
use bridge_traits::audio::{DurationEstimate, DurationResolver};
use bridge_traits::error::{BridgeError, Result};
use lofty::config::ParseOptions;
use lofty::file::AudioFile;
use lofty::probe::Probe;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, warn};

/// Shortest duration an estimate may claim, in seconds.
const MIN_ESTIMATED_SECS: u64 = 60;
/// Longest duration an estimate may claim, in seconds.
const MAX_ESTIMATED_SECS: u64 = 600;
/// Estimate used when even the file size is unreadable, in seconds.
const FALLBACK_SECS: u64 = 180;

/// Duration resolver backed by `lofty` container parsing.
#[derive(Debug, Default)]
pub struct LoftyDurationResolver;

impl LoftyDurationResolver {
    pub fn new() -> Self {
        Self
    }

    /// Assumed stream bitrate for an extension, in bits per second.
    fn assumed_bitrate(extension: &str) -> u64 {
        match extension {
            "flac" => 900_000,
            "m4a" | "aac" => 256_000,
            "wav" => 1_411_200,
            _ => 320_000,
        }
    }

    async fn estimate_from_size(&self, path: &Path) -> DurationEstimate {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let seconds = match fs::metadata(path).await {
            Ok(metadata) => {
                let bits = metadata.len().saturating_mul(8);
                (bits / Self::assumed_bitrate(&extension))
                    .clamp(MIN_ESTIMATED_SECS, MAX_ESTIMATED_SECS)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "file size unavailable, using fallback duration");
                FALLBACK_SECS
            }
        };

        DurationEstimate::Estimated(Duration::from_secs(seconds))
    }
}

#[async_trait]
impl DurationResolver for LoftyDurationResolver {
    async fn resolve(&self, path: &Path) -> Result<DurationEstimate> {
        let file_data = fs::read(path)
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to read file: {e}")))?;

        // lofty parsing is synchronous CPU work; keep it off the runtime.
        let parsed = tokio::task::spawn_blocking(move || {
            Probe::new(std::io::Cursor::new(&file_data))
                .options(ParseOptions::new())
                .guess_file_type()
                .map_err(lofty::error::LoftyError::from)
                .and_then(|probe| probe.read())
                .map(|tagged_file| tagged_file.properties().duration())
        })
        .await
        .map_err(|e| BridgeError::OperationFailed(format!("probe task failed: {e}")))?;

        match parsed {
            Ok(duration) if !duration.is_zero() => {
                debug!(path = %path.display(), ?duration, "duration from container metadata");
                Ok(DurationEstimate::Exact(duration))
            }
            Ok(_) => {
                debug!(path = %path.display(), "container reported zero duration, estimating");
                Ok(self.estimate_from_size(path).await)
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "container unparseable, estimating");
                Ok(self.estimate_from_size(path).await)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unparseable_file_gets_a_clamped_estimate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.mp3");
        // 1 MiB of non-audio bytes: 8_388_608 bits / 320_000 bps ≈ 26 s,
        // clamped up to the minimum.
        tokio::fs::write(&path, vec![0u8; 1024 * 1024]).await.unwrap();

        let resolver = LoftyDurationResolver::new();
        let estimate = resolver.resolve(&path).await.unwrap();

        assert!(!estimate.is_exact());
        assert_eq!(estimate.duration(), Duration::from_secs(MIN_ESTIMATED_SECS));
    }

    #[tokio::test]
    async fn huge_unparseable_file_clamps_to_maximum() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.wav");
        // Sparse-ish large file: 200 MiB at WAV bitrate would be ~1189 s.
        let file = tokio::fs::File::create(&path).await.unwrap();
        file.set_len(200 * 1024 * 1024).await.unwrap();

        let resolver = LoftyDurationResolver::new();
        let estimate = resolver.resolve(&path).await.unwrap();

        assert!(!estimate.is_exact());
        assert_eq!(estimate.duration(), Duration::from_secs(MAX_ESTIMATED_SECS));
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let resolver = LoftyDurationResolver::new();
        let result = resolver.resolve(Path::new("/nonexistent/track.mp3")).await;
        assert!(result.is_err());
    }

    #[test]
    fn bitrate_table_matches_extensions() {
        assert_eq!(LoftyDurationResolver::assumed_bitrate("flac"), 900_000);
        assert_eq!(LoftyDurationResolver::assumed_bitrate("wav"), 1_411_200);
        assert_eq!(LoftyDurationResolver::assumed_bitrate("mp3"), 320_000);
        assert_eq!(LoftyDurationResolver::assumed_bitrate("ogg"), 320_000);
    }
}
