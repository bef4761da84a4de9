//! Transfer sinks: where streamed bytes land.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Destination for a streaming transfer.
///
/// The fetcher writes chunks in arrival order and flushes once at the end
/// (or on cancellation, so partial output is at least consistent on disk).
#[async_trait]
pub trait TransferSink: Send {
    /// Append one chunk.
    async fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()>;

    /// Flush buffered bytes through to the backing store.
    async fn flush(&mut self) -> io::Result<()>;
}

/// Sink writing to a file on disk.
///
/// The fetcher never deletes the file; the caller owns cleanup of partial
/// output after a cancellation or failure.
pub struct FileSink {
    file: File,
    path: PathBuf,
}

impl FileSink {
    /// Create (or truncate) the file at `path`.
    pub async fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).await?;
        Ok(Self { file, path })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TransferSink for FileSink {
    async fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.file.write_all(chunk).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.file.flush().await?;
        self.file.sync_data().await
    }
}

/// Sink accumulating into a growable in-memory buffer.
#[derive(Debug, Default)]
pub struct BufferSink {
    data: Vec<u8>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes received so far.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Consume the sink, yielding the accumulated bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

#[async_trait]
impl TransferSink for BufferSink {
    async fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.data.extend_from_slice(chunk);
        Ok(())
    }

    async fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn buffer_sink_accumulates_in_order() {
        let mut sink = BufferSink::new();
        sink.write_chunk(b"hello ").await.unwrap();
        sink.write_chunk(b"world").await.unwrap();
        sink.flush().await.unwrap();
        assert_eq!(sink.into_bytes(), b"hello world");
    }

    #[tokio::test]
    async fn file_sink_writes_through_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.bin");

        let mut sink = FileSink::create(&path).await.unwrap();
        sink.write_chunk(&[1, 2, 3]).await.unwrap();
        sink.write_chunk(&[4, 5]).await.unwrap();
        sink.flush().await.unwrap();
        assert_eq!(sink.path(), path.as_path());

        let written = tokio::fs::read(&path).await.unwrap();
        assert_eq!(written, vec![1, 2, 3, 4, 5]);
    }
}
