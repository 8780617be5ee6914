//! Serialized writer for the local output channel.
//!
//! Replies from `POST /message`, push-channel `message` events and error
//! envelopes all go to the same stdout. Each unit is one newline-terminated
//! line written under a `Mutex`, so lines from different tasks never
//! interleave.

use std::pin::Pin;
use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

type BoxedWriter = Pin<Box<dyn AsyncWrite + Send>>;

/// Shared handle to the local output stream.
#[derive(Clone)]
pub struct OutputSink {
    writer: Arc<Mutex<BoxedWriter>>,
}

impl OutputSink {
    /// Wrap any async writer.
    pub fn new<W>(writer: W) -> Self
    where
        W: AsyncWrite + Send + 'static,
    {
        Self {
            writer: Arc::new(Mutex::new(Box::pin(writer))),
        }
    }

    /// Sink writing to the process's stdout.
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }

    /// Write `payload` followed by exactly one `\n`, then flush.
    ///
    /// The payload and terminator go out in a single `write_all` while the
    /// lock is held.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the write or flush fails.
    pub async fn write_line(&self, payload: &[u8]) -> std::io::Result<()> {
        let mut unit = Vec::with_capacity(payload.len() + 1);
        unit.extend_from_slice(payload);
        unit.push(b'\n');

        let mut guard = self.writer.lock().await;
        guard.write_all(&unit).await?;
        guard.flush().await
    }
}

impl std::fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputSink").finish_non_exhaustive()
    }
}
