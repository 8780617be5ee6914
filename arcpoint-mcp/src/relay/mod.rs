//! Stdio ↔ HTTP relay.
//!
//! Two concurrent tasks share one [`OutputSink`] and one [`SessionRegistry`]:
//!
//! - the stdin reader posts each input line to `{base}/message`, and writes
//!   synchronous replies and translated faults to local output;
//! - the event stream supervisor holds `GET /sse` open (reconnecting as
//!   needed), records the session from `endpoint` events and writes
//!   `message` events to local output.
//!
//! In synchronous mode only the stdin reader runs, and input EOF ends the
//! relay. In streaming mode input EOF only stops the reader: replies to
//! messages already accepted with `202` still arrive on the push channel, so
//! the supervisor keeps running until shutdown is signalled.

mod event_stream;
mod helpers;
mod shutdown;
mod stdin_reader;
mod supervisor;

use std::sync::Arc;

use tokio::io::AsyncRead;
use tokio::sync::watch;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use arcpoint_mcp_core::transport::{UpstreamSender, error_chain};
use arcpoint_mcp_core::{OutputSink, RelayConfig, SessionRegistry};

use crate::error::RelayError;

pub use event_stream::EventStream;
pub use shutdown::install_signal_handlers;
pub use stdin_reader::read_stdin;
pub use supervisor::{ConnectionState, supervise};

// ─────────────────────────────────────────────────────────────────────────────
// Relay Orchestrator
// ─────────────────────────────────────────────────────────────────────────────

/// Run the relay until shutdown is signalled or a task fails.
///
/// In synchronous mode input EOF also ends the relay. In streaming mode the
/// push channel outlives input EOF and stays open until `shutdown` is
/// cancelled. A failing task cancels `shutdown` so the other one stops too.
///
/// # Errors
///
/// Returns [`RelayError`] if an HTTP client cannot be built, local input or
/// output fails, or a task panics.
pub async fn run_relay<R>(
    config: Arc<RelayConfig>,
    input: R,
    output: OutputSink,
    shutdown: CancellationToken,
) -> Result<(), RelayError>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let session = SessionRegistry::new();
    let sender = UpstreamSender::new(config.clone()).map_err(|e| RelayError::Client {
        reason: error_chain(&e),
    })?;

    tracing::info!(
        url = %config.base_url,
        mode = ?config.mode,
        message_timeout_secs = config.message_timeout().as_secs(),
        "relay starting"
    );

    let reader_handle = {
        let session = session.clone();
        let output = output.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move { read_stdin(input, sender, session, output, shutdown).await })
    };

    if !config.mode.uses_push_channel() {
        let result = join_outcome("stdin reader", reader_handle.await);
        tracing::info!("relay stopped");
        return result;
    }

    let stream = EventStream::new(config.clone(), session, output)?;
    let (state_tx, mut state_rx) = watch::channel(ConnectionState::Disconnected);
    let mut stream_handle = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { supervise(stream, state_tx, shutdown).await })
    };
    let mut reader_handle = reader_handle;

    let monitor = tokio::spawn(async move {
        while state_rx.changed().await.is_ok() {
            let state = *state_rx.borrow_and_update();
            tracing::debug!(?state, "event stream state changed");
        }
    });

    // ── Select on task completion ────────────────────────────────────────
    let result = tokio::select! {
        reader = &mut reader_handle => {
            match &reader {
                Ok(Ok(())) => {
                    tracing::info!("stdin closed, event stream stays open until shutdown");
                }
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "stdin reader failed");
                    shutdown.cancel();
                }
                Err(e) => {
                    tracing::error!(error = %e, "stdin reader panicked");
                    shutdown.cancel();
                }
            }
            let stream = join_outcome("event stream", stream_handle.await);
            join_outcome("stdin reader", reader).and(stream)
        }
        stream = &mut stream_handle => {
            match &stream {
                Ok(Ok(())) => tracing::info!("event stream supervisor stopped"),
                Ok(Err(e)) => tracing::error!(error = %e, "event stream supervisor failed"),
                Err(e) => tracing::error!(error = %e, "event stream supervisor panicked"),
            }
            shutdown.cancel();
            let reader = join_outcome("stdin reader", reader_handle.await);
            join_outcome("event stream", stream).and(reader)
        }
    };

    monitor.abort();
    tracing::info!("relay stopped");
    result
}

/// Flatten a joined task result, preferring the task's own error.
fn join_outcome(
    task: &'static str,
    joined: Result<Result<(), RelayError>, JoinError>,
) -> Result<(), RelayError> {
    match joined {
        Ok(result) => result,
        Err(e) => Err(RelayError::Task {
            task,
            reason: e.to_string(),
        }),
    }
}
