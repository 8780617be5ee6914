//! Reconnect loop around the event stream listener.
//!
//! ```text
//! Disconnected ──► Connecting ──► Connected ──► Disconnected ─(backoff)─► Connecting …
//!        │              │             │
//!        └──────────────┴─────────────┴──── shutdown ──► Cancelled
//! ```
//!
//! Retries are unbounded with a fixed delay. `Cancelled` is the only
//! terminal state.

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::RelayError;

use super::event_stream::EventStream;

/// Push channel connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection; waiting out the backoff or not yet started.
    Disconnected,
    /// `GET /sse` in flight.
    Connecting,
    /// 200 received, events flowing.
    Connected,
    /// Shutdown observed; the supervisor has exited.
    Cancelled,
}

/// Drive `stream` until `shutdown` fires.
///
/// Every connection failure and every clean closure is followed by
/// `reconnect_delay`, then a new attempt. The delay itself is interruptible.
///
/// # Errors
///
/// Returns [`RelayError::Output`] if a `message` event cannot be written to
/// local output. All other stream failures are retried.
pub async fn supervise(
    stream: EventStream,
    state: watch::Sender<ConnectionState>,
    shutdown: CancellationToken,
) -> Result<(), RelayError> {
    let delay = stream.config().reconnect_delay;
    let mut attempt: u64 = 0;

    loop {
        if shutdown.is_cancelled() {
            break;
        }

        attempt += 1;
        state.send_replace(ConnectionState::Connecting);
        tracing::info!(attempt, "connecting to event stream");

        let result = stream.listen(&state, &shutdown).await;

        if shutdown.is_cancelled() {
            break;
        }
        state.send_replace(ConnectionState::Disconnected);

        match result {
            Ok(()) => {
                tracing::info!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "event stream closed, reconnecting"
                );
            }
            Err(e) if !e.is_recoverable() => {
                tracing::error!(attempt, error = %e, "event stream stopped");
                return Err(e.into());
            }
            Err(e) => {
                tracing::warn!(
                    attempt,
                    error = %e,
                    delay_ms = delay.as_millis() as u64,
                    "event stream error, reconnecting"
                );
            }
        }

        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    state.send_replace(ConnectionState::Cancelled);
    tracing::debug!(attempts = attempt, "event stream supervisor stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use arcpoint_mcp_core::{OutputSink, RelayConfig, SessionRegistry};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn stream_for(server: &MockServer, delay: Duration) -> (EventStream, SessionRegistry) {
        let config = RelayConfig::new(server.uri(), "test-token").with_reconnect_delay(delay);
        let session = SessionRegistry::new();
        let (sink, _peer) = tokio::io::duplex(4096);
        let stream = EventStream::new(Arc::new(config), session.clone(), OutputSink::new(sink))
            .expect("client builds");
        (stream, session)
    }

    async fn wait_for_requests(server: &MockServer, at_least: usize) {
        for _ in 0..200 {
            let seen = server.received_requests().await.map_or(0, |r| r.len());
            if seen >= at_least {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected at least {at_least} connection attempts");
    }

    #[tokio::test]
    async fn test_reconnects_after_clean_closure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sse"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string("event: endpoint\ndata: /message?sessionId=s-1\n\n"),
            )
            .mount(&server)
            .await;

        let (stream, session) = stream_for(&server, Duration::from_millis(20));
        let (state, _rx) = watch::channel(ConnectionState::Disconnected);
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(supervise(stream, state, shutdown.clone()));

        wait_for_requests(&server, 3).await;
        assert_eq!(session.current().await.as_deref(), Some("s-1"));

        shutdown.cancel();
        let result = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("supervisor exits after cancellation")
            .expect("task not panicked");
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_unauthorized_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sse"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .mount(&server)
            .await;

        let (stream, session) = stream_for(&server, Duration::from_millis(20));
        let (state, _rx) = watch::channel(ConnectionState::Disconnected);
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(supervise(stream, state, shutdown.clone()));

        wait_for_requests(&server, 2).await;
        assert_eq!(session.current().await, None);

        shutdown.cancel();
        let result = task.await.expect("task not panicked");
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_backoff() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sse"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let (stream, _session) = stream_for(&server, Duration::from_secs(3600));
        let (state, mut rx) = watch::channel(ConnectionState::Disconnected);
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(supervise(stream, state, shutdown.clone()));

        wait_for_requests(&server, 1).await;
        // Connecting, then back to Disconnected for the hour-long backoff.
        tokio::time::timeout(
            Duration::from_secs(5),
            rx.wait_for(|s| *s == ConnectionState::Disconnected),
        )
        .await
        .expect("state reaches Disconnected")
        .expect("sender alive");

        shutdown.cancel();
        let result = tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("backoff is interruptible")
            .expect("task not panicked");
        assert!(result.is_ok());
        assert_eq!(*rx.borrow(), ConnectionState::Cancelled);
        assert_eq!(server.received_requests().await.map_or(0, |r| r.len()), 1);
    }

    #[tokio::test]
    async fn test_already_cancelled_never_connects() {
        let server = MockServer::start().await;
        let (stream, _session) = stream_for(&server, Duration::from_millis(20));
        let (state, rx) = watch::channel(ConnectionState::Disconnected);
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        supervise(stream, state, shutdown).await.expect("clean exit");
        assert_eq!(*rx.borrow(), ConnectionState::Cancelled);
        assert_eq!(server.received_requests().await.map_or(0, |r| r.len()), 0);
    }

    #[tokio::test]
    async fn test_output_failure_stops_supervisor() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sse"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string("event: message\ndata: {\"id\":1}\n\n"),
            )
            .mount(&server)
            .await;

        let config = RelayConfig::new(server.uri(), "test-token")
            .with_reconnect_delay(Duration::from_millis(20));
        let (sink, peer) = tokio::io::duplex(64);
        drop(peer);
        let stream = EventStream::new(
            Arc::new(config),
            SessionRegistry::new(),
            OutputSink::new(sink),
        )
        .expect("client builds");
        let (state, _rx) = watch::channel(ConnectionState::Disconnected);

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            supervise(stream, state, CancellationToken::new()),
        )
        .await
        .expect("supervisor stops on its own");
        assert!(matches!(result, Err(RelayError::Output(_))));
    }
}
