//! Shared track model used across the playback and download cores.
//!
//! A [`TrackRef`] identifies one playable item. Remote tracks carry a
//! provider-scoped id that a [`TrackResolver`](crate::resolver::TrackResolver)
//! turns into a URL at play time; local tracks carry a filesystem path and may
//! have an empty id. Exactly one of the two is meaningful for any given track.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;

/// Artist credit for a track.
///
/// Provider payloads deliver artists either as a single display string or as
/// an ordered list of names. The variant is fixed once at ingestion via
/// [`ArtistInfo::normalize`]; downstream code only ever iterates or joins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArtistInfo {
    /// One credited artist.
    Single(String),
    /// Zero or more credited artists, in display order.
    Multiple(Vec<String>),
}

impl ArtistInfo {
    /// Normalize a list of artist names into the canonical variant.
    ///
    /// Empty names are dropped; a one-element list collapses to
    /// [`ArtistInfo::Single`].
    pub fn normalize(names: Vec<String>) -> Self {
        let mut names: Vec<String> = names
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();

        if names.len() == 1 {
            ArtistInfo::Single(names.remove(0))
        } else {
            ArtistInfo::Multiple(names)
        }
    }

    /// Returns `true` when no artist is credited.
    pub fn is_empty(&self) -> bool {
        match self {
            ArtistInfo::Single(name) => name.is_empty(),
            ArtistInfo::Multiple(names) => names.is_empty(),
        }
    }

    /// Credited names in display order.
    pub fn names(&self) -> Vec<&str> {
        match self {
            ArtistInfo::Single(name) => vec![name.as_str()],
            ArtistInfo::Multiple(names) => names.iter().map(String::as_str).collect(),
        }
    }

    /// Join all credited names with the given separator.
    pub fn join(&self, separator: &str) -> String {
        match self {
            ArtistInfo::Single(name) => name.clone(),
            ArtistInfo::Multiple(names) => names.join(separator),
        }
    }
}

impl Default for ArtistInfo {
    fn default() -> Self {
        ArtistInfo::Multiple(Vec::new())
    }
}

impl fmt::Display for ArtistInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.join(" / "))
    }
}

/// Origin of a track: a remote streaming provider or the local filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TrackSource {
    /// A remote provider, identified by its tag (e.g. `"netease"`, `"kuwo"`).
    Remote(String),
    /// A file on the local machine.
    Local,
}

impl TrackSource {
    /// Parse a source tag; `"local"` maps to [`TrackSource::Local`].
    pub fn from_tag(tag: &str) -> Self {
        if tag.eq_ignore_ascii_case("local") {
            TrackSource::Local
        } else {
            TrackSource::Remote(tag.to_string())
        }
    }

    /// The wire/persistence tag for this source.
    pub fn as_tag(&self) -> &str {
        match self {
            TrackSource::Remote(tag) => tag.as_str(),
            TrackSource::Local => "local",
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, TrackSource::Local)
    }
}

impl Default for TrackSource {
    fn default() -> Self {
        TrackSource::Local
    }
}

impl fmt::Display for TrackSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_tag())
    }
}

impl Serialize for TrackSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_tag())
    }
}

impl<'de> Deserialize<'de> for TrackSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(TrackSource::from_tag(&tag))
    }
}

/// Requested audio quality, expressed as the provider bitrate ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AudioQuality {
    #[serde(rename = "128")]
    Kbps128,
    #[serde(rename = "192")]
    Kbps192,
    #[default]
    #[serde(rename = "320")]
    Kbps320,
    #[serde(rename = "740")]
    Lossless,
    #[serde(rename = "999")]
    HiRes,
}

impl AudioQuality {
    /// The bitrate tag providers expect in URL-resolution requests.
    pub fn bitrate_tag(&self) -> &'static str {
        match self {
            AudioQuality::Kbps128 => "128",
            AudioQuality::Kbps192 => "192",
            AudioQuality::Kbps320 => "320",
            AudioQuality::Lossless => "740",
            AudioQuality::HiRes => "999",
        }
    }

    /// Human-readable suffix appended to downloaded filenames.
    pub fn filename_suffix(&self) -> &'static str {
        match self {
            AudioQuality::Kbps128 => "128kbps",
            AudioQuality::Kbps192 => "192kbps",
            AudioQuality::Kbps320 => "320kbps",
            AudioQuality::Lossless => "Lossless",
            AudioQuality::HiRes => "Hi-Res",
        }
    }

    /// Whether this tier is delivered in a lossless container by providers.
    pub fn is_lossless(&self) -> bool {
        matches!(self, AudioQuality::Lossless | AudioQuality::HiRes)
    }
}

impl fmt::Display for AudioQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.filename_suffix())
    }
}

/// Metadata and locator identifying one playable audio item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRef {
    /// Provider-scoped id; empty for local files.
    #[serde(default)]
    pub id: String,
    /// Display title.
    pub title: String,
    /// Credited artists.
    #[serde(default)]
    pub artist: ArtistInfo,
    /// Album or collection name.
    #[serde(default)]
    pub album: String,
    /// Where the track comes from.
    #[serde(default)]
    pub source: TrackSource,
    /// Path for local tracks; `None` for remote tracks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
}

impl TrackRef {
    /// Construct a remote track reference.
    pub fn remote(
        id: impl Into<String>,
        title: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: ArtistInfo::default(),
            album: String::new(),
            source: TrackSource::Remote(provider.into()),
            local_path: None,
        }
    }

    /// Construct a local track reference.
    pub fn local(path: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            artist: ArtistInfo::default(),
            album: String::new(),
            source: TrackSource::Local,
            local_path: Some(path.into()),
        }
    }

    /// Attach the artist credit.
    pub fn with_artist(mut self, artist: ArtistInfo) -> Self {
        self.artist = artist;
        self
    }

    /// Attach the album name.
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = album.into();
        self
    }

    /// `true` when the track plays from a local file rather than a resolved URL.
    pub fn is_local(&self) -> bool {
        self.source.is_local()
    }
}
