//! Track-list persistence.
//!
//! Hosts persist ordered lists of [`TrackRef`]s (the playlist, favorites)
//! through this trait; the cores themselves never touch the serialized form.

use async_trait::async_trait;

use crate::error::Result;
use crate::track::TrackRef;

/// Named, ordered track-list storage.
#[async_trait]
pub trait TrackListStore: Send + Sync {
    /// Load the list saved under `name`, or an empty list when none exists.
    async fn load(&self, name: &str) -> Result<Vec<TrackRef>>;

    /// Replace the list saved under `name`.
    async fn save(&self, name: &str, tracks: &[TrackRef]) -> Result<()>;
}
