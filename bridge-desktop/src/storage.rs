//! JSON file implementation of track-list persistence.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::storage::TrackListStore;
use bridge_traits::track::TrackRef;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Stores each named track list as `<data_dir>/<name>.json`.
///
/// Lists are plain JSON arrays of track references, human-readable and
/// order-preserving. A missing file reads as an empty list.
pub struct JsonTrackListStore {
    data_dir: PathBuf,
}

impl JsonTrackListStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{name}.json"))
    }
}

#[async_trait]
impl TrackListStore for JsonTrackListStore {
    async fn load(&self, name: &str) -> Result<Vec<TrackRef>> {
        let path = self.path_for(name);
        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(list = name, path = %path.display(), "no saved list, returning empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(BridgeError::Io(e)),
        };

        let tracks: Vec<TrackRef> = serde_json::from_slice(&raw).map_err(|e| {
            BridgeError::OperationFailed(format!("corrupt track list {name}: {e}"))
        })?;
        info!(list = name, count = tracks.len(), "loaded track list");
        Ok(tracks)
    }

    async fn save(&self, name: &str, tracks: &[TrackRef]) -> Result<()> {
        fs::create_dir_all(&self.data_dir).await?;

        let json = serde_json::to_vec_pretty(tracks).map_err(|e| {
            BridgeError::OperationFailed(format!("serialize track list {name}: {e}"))
        })?;
        fs::write(self.path_for(name), json).await?;
        info!(list = name, count = tracks.len(), "saved track list");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::track::ArtistInfo;

    #[tokio::test]
    async fn save_then_load_preserves_order_and_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonTrackListStore::new(dir.path());

        let tracks = vec![
            TrackRef::remote("1", "First", "netease")
                .with_artist(ArtistInfo::Single("A".into())),
            TrackRef::remote("2", "Second", "kuwo")
                .with_artist(ArtistInfo::Multiple(vec!["B".into(), "C".into()])),
            TrackRef::local("/music/third.flac", "Third"),
        ];

        store.save("playlist", &tracks).await.unwrap();
        let loaded = store.load("playlist").await.unwrap();
        assert_eq!(loaded, tracks);
    }

    #[tokio::test]
    async fn missing_list_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonTrackListStore::new(dir.path());
        assert!(store.load("favorites").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_list_is_an_error_not_a_silent_reset() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("playlist.json"), b"{not json")
            .await
            .unwrap();

        let store = JsonTrackListStore::new(dir.path());
        assert!(store.load("playlist").await.is_err());
    }
}
