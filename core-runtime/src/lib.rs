//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the playback and download cores:
//! - Logging and tracing setup
//! - Shared configuration
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the ambient utilities the engine crates depend on. It
//! establishes the logging conventions and the event broadcasting mechanism
//! used throughout the system; it contains no playback or download logic of
//! its own.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::CoreConfig;
pub use error::{Error, Result};
pub use events::{CoreEvent, DownloadEvent, EventBus, PlaybackEvent, PlaylistEvent};
