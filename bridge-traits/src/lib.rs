//! # Host Bridge Traits
//!
//! Collaborator contracts that the playback and download cores consume but
//! do not implement themselves.
//!
//! ## Overview
//!
//! This crate defines the boundary between the engine crates and everything
//! platform- or provider-specific: HTTP transport, the audio output device,
//! the track/URL resolver of a streaming provider, duration probing of local
//! audio files, and track-list persistence. Each trait represents a
//! capability the core requires but that a host wires in with a concrete
//! adapter (see `bridge-desktop` for the desktop set).
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async request/response plus chunked
//!   body streaming for large transfers
//! - [`AudioOutput`](audio::AudioOutput) - The decode/output device driven by
//!   the playback engine
//! - [`DurationResolver`](audio::DurationResolver) - Exact-or-estimated track
//!   duration for a local audio file
//! - [`TrackResolver`](resolver::TrackResolver) - Maps a provider track id to
//!   a playable URL
//! - [`TrackListStore`](storage::TrackListStore) - Ordered track-list
//!   persistence (playlist, favorites)
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Adapters should
//! convert platform-specific errors into it and keep messages actionable.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so implementations can be shared
//! across async tasks behind `Arc`.

pub mod audio;
pub mod error;
pub mod http;
pub mod resolver;
pub mod storage;
pub mod track;

pub use error::BridgeError;

// Re-export commonly used types
pub use audio::{AudioOutput, DurationEstimate, DurationResolver};
pub use http::{ByteStream, HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use resolver::{ResolvedSource, TrackResolver};
pub use storage::TrackListStore;
pub use track::{ArtistInfo, AudioQuality, TrackRef, TrackSource};
