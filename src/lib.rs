//! Workspace facade crate.
//!
//! Host applications can depend on `aria-workspace` to pull in the whole
//! engine stack without wiring each crate individually: the bridge contracts
//! and desktop adapters, the runtime (events/config/logging), and the
//! transfer, playback, and download cores.

pub use bridge_desktop as desktop;
pub use bridge_traits as bridge;
pub use core_download as download;
pub use core_playback as playback;
pub use core_runtime as runtime;
pub use core_transfer as transfer;
