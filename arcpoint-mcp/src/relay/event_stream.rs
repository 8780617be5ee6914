//! Remote → local output: one `GET /sse` connection.
//!
//! Opens the push channel, feeds body lines through the event framing
//! parser, stores the session token from `endpoint` events and writes
//! `message` events to local output. Returns when the stream closes, fails,
//! or shutdown is signalled; reconnecting is the supervisor's job.

use std::sync::Arc;
use std::time::Duration;

use futures_util::TryStreamExt;
use reqwest::Client;
use reqwest::header::{ACCEPT, CACHE_CONTROL, USER_AGENT};
use tokio::sync::watch;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;

use arcpoint_mcp_core::transport::{EventFrameParser, MAX_LINE_BYTES, StreamEvent, error_chain};
use arcpoint_mcp_core::{OutputSink, RelayConfig, SessionRegistry};

use crate::error::{FramingError, RelayError, StreamError};

use super::helpers::bounded_read_line;
use super::supervisor::ConnectionState;

/// Keepalive for the long-lived push channel socket.
const TCP_KEEPALIVE: Duration = Duration::from_secs(60);

/// Push channel endpoint and the state it feeds.
#[derive(Debug, Clone)]
pub struct EventStream {
    client: Client,
    config: Arc<RelayConfig>,
    session: SessionRegistry,
    output: OutputSink,
}

impl EventStream {
    /// Build the stream client. It has a connect timeout but no overall
    /// request timeout: the connection is expected to stay open indefinitely.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Client`] if the HTTP client cannot be built.
    pub fn new(
        config: Arc<RelayConfig>,
        session: SessionRegistry,
        output: OutputSink,
    ) -> Result<Self, RelayError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .tcp_keepalive(TCP_KEEPALIVE)
            .build()
            .map_err(|e| RelayError::Client {
                reason: error_chain(&e),
            })?;
        Ok(Self {
            client,
            config,
            session,
            output,
        })
    }

    /// The configuration this stream connects with.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Connect once and relay events until the stream ends.
    ///
    /// `state` is set to [`ConnectionState::Connected`] once a 200 response
    /// arrives. Returns `Ok(())` on clean closure or when `shutdown` fires,
    /// including while the request is still in flight.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError`] on connect failure, non-200 status, body read
    /// failure, oversized line, or local output failure.
    pub async fn listen(
        &self,
        state: &watch::Sender<ConnectionState>,
        shutdown: &CancellationToken,
    ) -> Result<(), StreamError> {
        let request = self
            .client
            .get(self.config.sse_url())
            .bearer_auth(&self.config.token)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .header(USER_AGENT, self.config.user_agent())
            .send();

        let response = tokio::select! {
            biased;
            _ = shutdown.cancelled() => return Ok(()),
            result = request => result.map_err(|e| StreamError::Connect {
                reason: error_chain(&e),
            })?,
        };

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            // Bounded so a server holding the error body open cannot wedge the supervisor.
            let body = tokio::time::timeout(self.config.connect_timeout, response.text())
                .await
                .ok()
                .and_then(Result::ok)
                .unwrap_or_default();
            return Err(StreamError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        state.send_replace(ConnectionState::Connected);
        tracing::info!("event stream connected");

        let body = Box::pin(response.bytes_stream().map_err(std::io::Error::other));
        let mut reader = StreamReader::new(body);
        let mut parser = EventFrameParser::new();
        let mut raw_buf = Vec::new();

        loop {
            raw_buf.clear();

            let bytes_read = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    tracing::debug!("event stream: shutdown signal received");
                    return Ok(());
                }
                result = bounded_read_line(&mut reader, &mut raw_buf, MAX_LINE_BYTES) => {
                    match result {
                        Ok(n) => n,
                        Err(FramingError::MessageTooLarge { max_bytes }) => {
                            return Err(StreamError::LineTooLong { max_bytes });
                        }
                        Err(FramingError::Io(e)) => {
                            return Err(StreamError::Read {
                                reason: error_chain(&e),
                            });
                        }
                    }
                }
            };

            if bytes_read == 0 {
                if parser.has_pending() {
                    tracing::debug!("event stream closed with an unterminated event, discarding");
                }
                return Ok(());
            }

            let line = String::from_utf8_lossy(&raw_buf);
            match parser.push_line(&line) {
                Some(StreamEvent::Endpoint {
                    session_id: Some(id),
                    ..
                }) => {
                    if id.is_empty() {
                        tracing::debug!("endpoint event carried an empty sessionId, clearing session");
                    } else {
                        tracing::info!(session_id = %id, "session established");
                    }
                    self.session.set(id).await;
                }
                Some(StreamEvent::Endpoint {
                    session_id: None,
                    data,
                }) => {
                    tracing::debug!(data = %data, "endpoint event without a single sessionId, ignoring");
                }
                Some(StreamEvent::Message(data)) => {
                    self.output
                        .write_line(data.as_bytes())
                        .await
                        .map_err(StreamError::Output)?;
                }
                None => {}
            }
        }
    }
}
