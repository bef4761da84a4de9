//! # Desktop Bridge Implementations
//!
//! Concrete desktop adapters for the bridge traits:
//!
//! - [`ReqwestHttpClient`](http::ReqwestHttpClient) - HTTP transport with
//!   pooling, retry for buffered requests, and chunked body streaming
//! - [`LoftyDurationResolver`](duration::LoftyDurationResolver) - container
//!   metadata duration with a size/bitrate fallback estimate
//! - [`JsonTrackListStore`](storage::JsonTrackListStore) - playlist and
//!   favorites persistence as JSON files
//!
//! The audio output device is intentionally absent here: hosts bring their
//! own `AudioOutput` bound to whatever audio stack they ship.

pub mod duration;
pub mod http;
pub mod storage;

pub use duration::LoftyDurationResolver;
pub use http::ReqwestHttpClient;
pub use storage::JsonTrackListStore;
