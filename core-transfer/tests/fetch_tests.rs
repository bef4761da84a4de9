//! Behavioral tests for the streaming fetcher against a scripted HTTP client.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{ByteStream, HttpClient, HttpRequest, HttpResponse};
use bytes::Bytes;
use core_transfer::{BufferSink, TransferError, TransferFetcher};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// One scripted step of a fake response body.
#[derive(Clone)]
enum Step {
    Chunk(Vec<u8>),
    Fail(String),
}

struct ScriptedStream {
    status: u16,
    content_length: Option<u64>,
    steps: VecDeque<Step>,
    cancel_after_chunk: Option<CancellationToken>,
}

#[async_trait]
impl ByteStream for ScriptedStream {
    fn status(&self) -> u16 {
        self.status
    }

    fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    async fn next_chunk(&mut self) -> BridgeResult<Option<Bytes>> {
        match self.steps.pop_front() {
            Some(Step::Chunk(data)) => {
                if let Some(token) = &self.cancel_after_chunk {
                    token.cancel();
                }
                Ok(Some(Bytes::from(data)))
            }
            Some(Step::Fail(message)) => Err(BridgeError::OperationFailed(message)),
            None => Ok(None),
        }
    }
}

/// Fake HTTP client replaying a fixed body script on every fetch.
struct FakeHttpClient {
    status: u16,
    content_length: Option<u64>,
    steps: Vec<Step>,
    cancel_after_chunk: Option<CancellationToken>,
}

impl FakeHttpClient {
    fn body(chunks: &[&[u8]]) -> Self {
        let total: u64 = chunks.iter().map(|c| c.len() as u64).sum();
        Self {
            status: 200,
            content_length: Some(total),
            steps: chunks.iter().map(|c| Step::Chunk(c.to_vec())).collect(),
            cancel_after_chunk: None,
        }
    }
}

#[async_trait]
impl HttpClient for FakeHttpClient {
    async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
        Err(BridgeError::NotAvailable("buffered requests unused".into()))
    }

    async fn fetch_stream(&self, _request: HttpRequest) -> BridgeResult<Box<dyn ByteStream>> {
        Ok(Box::new(ScriptedStream {
            status: self.status,
            content_length: self.content_length,
            steps: self.steps.iter().cloned().collect(),
            cancel_after_chunk: self.cancel_after_chunk.clone(),
        }))
    }
}

fn request() -> HttpRequest {
    HttpRequest::get("https://cdn.example.com/track.mp3")
}

#[tokio::test]
async fn complete_fetch_writes_all_bytes_with_monotonic_progress() {
    let client = FakeHttpClient::body(&[&[1u8; 400], &[2u8; 400], &[3u8; 200]]);
    let fetcher = TransferFetcher::new(Arc::new(client));

    let observed: Arc<Mutex<Vec<(u64, Option<u64>)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink_observed = Arc::clone(&observed);
    let on_progress = move |downloaded: u64, total: Option<u64>| {
        sink_observed.lock().unwrap().push((downloaded, total));
    };

    let mut sink = BufferSink::new();
    let written = fetcher
        .fetch(request(), &mut sink, Some(&on_progress), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(written, 1000);
    assert_eq!(sink.as_slice().len(), 1000);
    assert_eq!(&sink.as_slice()[..400], &[1u8; 400][..]);

    let observed = observed.lock().unwrap();
    assert_eq!(observed.len(), 3);
    assert!(observed.windows(2).all(|w| w[0].0 <= w[1].0));
    assert_eq!(*observed.last().unwrap(), (1000, Some(1000)));
}

#[tokio::test]
async fn missing_content_length_reports_indeterminate_total() {
    let mut client = FakeHttpClient::body(&[b"abc", b"def"]);
    client.content_length = None;
    let fetcher = TransferFetcher::new(Arc::new(client));

    let totals: Arc<Mutex<Vec<Option<u64>>>> = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&totals);
    let on_progress = move |_downloaded: u64, total: Option<u64>| {
        captured.lock().unwrap().push(total);
    };

    let mut sink = BufferSink::new();
    let written = fetcher
        .fetch(request(), &mut sink, Some(&on_progress), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(written, 6);
    assert!(totals.lock().unwrap().iter().all(Option::is_none));
}

#[tokio::test]
async fn non_success_status_maps_to_http_error() {
    let mut client = FakeHttpClient::body(&[b"ignored"]);
    client.status = 404;
    let fetcher = TransferFetcher::new(Arc::new(client));

    let mut sink = BufferSink::new();
    let result = fetcher
        .fetch(request(), &mut sink, None, &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(TransferError::Http(404))));
    assert!(sink.as_slice().is_empty());
}

#[tokio::test]
async fn cancellation_stops_at_the_next_chunk_boundary() {
    let token = CancellationToken::new();
    let mut client = FakeHttpClient::body(&[&[7u8; 100], &[8u8; 100], &[9u8; 100]]);
    client.cancel_after_chunk = Some(token.clone());
    let fetcher = TransferFetcher::new(Arc::new(client));

    let mut sink = BufferSink::new();
    let result = fetcher.fetch(request(), &mut sink, None, &token).await;

    assert!(matches!(result, Err(TransferError::Cancelled)));
    // Exactly the chunk delivered before the token fired.
    assert_eq!(sink.as_slice(), &[7u8; 100][..]);
}

#[tokio::test]
async fn pre_cancelled_token_short_circuits() {
    let token = CancellationToken::new();
    token.cancel();

    let fetcher = TransferFetcher::new(Arc::new(FakeHttpClient::body(&[b"data"])));
    let mut sink = BufferSink::new();
    let result = fetcher.fetch(request(), &mut sink, None, &token).await;

    assert!(matches!(result, Err(TransferError::Cancelled)));
    assert!(sink.as_slice().is_empty());
}

#[tokio::test]
async fn oversized_network_chunks_are_split_to_the_configured_granularity() {
    let client = FakeHttpClient::body(&[&[6u8; 250]]);
    let fetcher = TransferFetcher::new(Arc::new(client)).with_chunk_size(100);

    let observed: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&observed);
    let on_progress = move |downloaded: u64, _total: Option<u64>| {
        captured.lock().unwrap().push(downloaded);
    };

    let mut sink = BufferSink::new();
    let written = fetcher
        .fetch(request(), &mut sink, Some(&on_progress), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(written, 250);
    assert_eq!(*observed.lock().unwrap(), vec![100, 200, 250]);
}

#[tokio::test]
async fn mid_body_failure_surfaces_as_network_error() {
    let client = FakeHttpClient {
        status: 200,
        content_length: Some(200),
        steps: vec![
            Step::Chunk(vec![1u8; 100]),
            Step::Fail("connection reset".to_string()),
        ],
        cancel_after_chunk: None,
    };
    let fetcher = TransferFetcher::new(Arc::new(client));

    let mut sink = BufferSink::new();
    let result = fetcher
        .fetch(request(), &mut sink, None, &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(TransferError::Network(_))));
    assert_eq!(sink.as_slice().len(), 100);
}
