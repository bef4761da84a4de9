//! HTTP Client Abstraction
//!
//! Async request/response operations plus chunked body streaming for large
//! audio transfers.

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{BridgeError, Result};

/// HTTP method types used by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Head,
}

/// HTTP request builder.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            timeout: None,
        }
    }

    /// Shorthand for a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Append a URL-encoded query parameter.
    pub fn query(mut self, key: &str, value: &str) -> Self {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        self.url
            .push_str(&format!("{separator}{}={}", urlencode(key), urlencode(value)));
        self
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }
}

fn urlencode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// A fully buffered HTTP response.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    /// Parse the response body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            BridgeError::OperationFailed(format!("JSON deserialization failed: {e}"))
        })
    }

    /// The response body as a UTF-8 string.
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| BridgeError::OperationFailed(format!("Invalid UTF-8: {e}")))
    }

    /// Check if the response status is successful (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Retry policy configuration for buffered requests.
///
/// Streaming fetches are never retried by the transport; retry policy for
/// them belongs to the caller.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts.
    pub max_attempts: u32,
    /// Base delay between retries.
    pub base_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Whether to use exponential backoff.
    pub use_exponential_backoff: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            use_exponential_backoff: true,
        }
    }
}

impl RetryPolicy {
    /// A policy that performs the request exactly once.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }
}

/// An in-flight streaming response body.
///
/// Chunks arrive in network-delivered sizes; `None` signals end of stream.
/// `content_length` is `None` when the server omitted Content-Length, in
/// which case consumers must treat progress as indeterminate.
#[async_trait]
pub trait ByteStream: Send {
    /// HTTP status of the underlying response.
    fn status(&self) -> u16;

    /// Total body size when the server reported one.
    fn content_length(&self) -> Option<u64>;

    /// Pull the next chunk of the body.
    async fn next_chunk(&mut self) -> Result<Option<Bytes>>;
}

/// Async HTTP client trait.
///
/// Implementations should handle connection pooling, TLS, and timeouts.
/// Buffered requests may retry per the supplied [`RetryPolicy`]; streaming
/// fetches are single-shot.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Execute a buffered request.
    ///
    /// # Errors
    ///
    /// Returns an error when the connection fails, TLS validation fails, or
    /// the request times out. Non-2xx statuses are NOT errors at this layer;
    /// callers inspect [`HttpResponse::status`].
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Execute a buffered request with a custom retry policy.
    async fn execute_with_retry(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse> {
        let _ = policy;
        self.execute(request).await
    }

    /// Open a streaming response for a (typically large) body.
    ///
    /// The response headers are consumed eagerly so `status` and
    /// `content_length` are available before the first chunk.
    async fn fetch_stream(&self, request: HttpRequest) -> Result<Box<dyn ByteStream>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder_sets_headers_and_timeout() {
        let request = HttpRequest::get("https://example.com")
            .header("User-Agent", "test")
            .timeout(Duration::from_secs(30));

        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.url, "https://example.com");
        assert_eq!(request.headers.get("User-Agent"), Some(&"test".to_string()));
        assert_eq!(request.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn query_parameters_are_encoded_and_appended() {
        let request = HttpRequest::get("https://api.example.com/api.php")
            .query("types", "url")
            .query("name", "a b&c");

        assert_eq!(
            request.url,
            "https://api.example.com/api.php?types=url&name=a%20b%26c"
        );
    }

    #[test]
    fn response_status_checks() {
        let response = HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from_static(b"{\"ok\":true}"),
        };

        assert!(response.is_success());
        assert_eq!(response.text().unwrap(), "{\"ok\":true}");
    }

    #[test]
    fn retry_policy_none_is_single_attempt() {
        assert_eq!(RetryPolicy::none().max_attempts, 1);
        assert_eq!(RetryPolicy::default().max_attempts, 3);
    }
}
