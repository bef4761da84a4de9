//! # Playback Core
//!
//! The streaming playback engine and the playlist controller.
//!
//! ## Overview
//!
//! [`PlayerEngine`] owns one active playback session. `load` materializes
//! the audio (local open, or a streamed temp file for remote tracks),
//! resolves the duration, and lands in `Stopped`; the transport surface
//! (`play`/`pause`/`resume`/`stop`/`seek`/`set_volume`) then drives an
//! abstract [`AudioOutput`](bridge_traits::audio::AudioOutput) device while
//! a background tracker keeps `position` honest independent of the device's
//! imprecise reporting. State, position, and completion notifications flow
//! through the [`EventBus`](core_runtime::events::EventBus).
//!
//! [`PlaylistController`] holds the ordered track sequence and its cursor.
//! It computes which entry plays next but never plays anything itself; the
//! host reacts to its `TrackSelected`/`EndReached` events, typically by
//! calling back into the engine. On natural end-of-track the engine emits
//! `Completed` and the host asks the controller for the next index - that
//! is the entire auto-advance protocol.

pub mod engine;
pub mod error;
pub mod playlist;
pub mod session;

pub use engine::PlayerEngine;
pub use error::{PlayerError, Result};
pub use playlist::PlaylistController;
pub use session::{PlaybackSnapshot, PlaybackState};
