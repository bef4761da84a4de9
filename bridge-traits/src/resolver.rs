//! Track URL resolution.
//!
//! Remote tracks carry only a provider-scoped id; a [`TrackResolver`] turns
//! that id into a playable URL on demand.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::track::{AudioQuality, TrackSource};

/// A playable location returned by a resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSource {
    /// Direct URL of the audio payload.
    pub url: String,
    /// Actual bitrate the provider granted, in kbps, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u32>,
    /// Payload size in bytes, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl ResolvedSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            bitrate: None,
            size: None,
        }
    }
}

/// Maps a provider track id to a playable URL.
///
/// "The provider has no URL for this track" is an expected outcome and is
/// reported as `Ok(None)`, never as an error. Errors are reserved for
/// transport or provider failures.
#[async_trait]
pub trait TrackResolver: Send + Sync {
    async fn resolve(
        &self,
        track_id: &str,
        source: &TrackSource,
        quality: AudioQuality,
    ) -> Result<Option<ResolvedSource>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_source_serde() {
        let resolved = ResolvedSource {
            url: "https://cdn.example.com/a.mp3".to_string(),
            bitrate: Some(320),
            size: Some(9_000_000),
        };
        let json = serde_json::to_string(&resolved).unwrap();
        let back: ResolvedSource = serde_json::from_str(&json).unwrap();
        assert_eq!(back, resolved);
    }
}
