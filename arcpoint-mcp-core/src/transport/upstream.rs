//! `POST /message` delivery.
//!
//! Each inbound line is posted as-is to `{base}/message`, correlated with
//! `?sessionId=` when a push-channel session exists. The response is
//! classified into a [`SendOutcome`]; faults are never retried here, since
//! a duplicate POST could repeat a side effect on the server.
//!
//! # Timeouts
//!
//! The message client carries a per-request timeout independent of the
//! event stream client, so one stalled call cannot hold up the next line
//! forever.

use std::sync::Arc;

use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::config::{RelayConfig, TransportMode};
use crate::error::UpstreamFault;
use crate::transport::error_chain;

/// Longest response body excerpt included in diagnostic logs.
const LOG_BODY_LIMIT: usize = 512;

/// Result of delivering one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// HTTP 200: the body is the reply, to be written to local output.
    Reply(Bytes),
    /// HTTP 202 in streaming mode: the reply will arrive on the push channel.
    Accepted,
    /// Delivery failed; translate and report locally.
    Fault(UpstreamFault),
}

/// Authenticated sender for `POST /message`.
///
/// `Clone` is cheap: the underlying reqwest client pools connections
/// internally.
#[derive(Debug, Clone)]
pub struct UpstreamSender {
    client: Client,
    config: Arc<RelayConfig>,
    user_agent: String,
}

impl UpstreamSender {
    /// Build a sender with its own connection pool.
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the HTTP client cannot be built (TLS
    /// backend initialisation failure).
    pub fn new(config: Arc<RelayConfig>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .tcp_nodelay(true)
            .build()?;
        let user_agent = config.user_agent();
        Ok(Self {
            client,
            config,
            user_agent,
        })
    }

    /// The configuration this sender posts with.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Post one raw message and classify the response.
    pub async fn send(&self, payload: &[u8], session_id: Option<&str>) -> SendOutcome {
        let url = self.config.message_url(session_id);

        let result = self
            .client
            .post(&url)
            .bearer_auth(&self.config.token)
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, &self.user_agent)
            .timeout(self.config.message_timeout())
            .body(Bytes::copy_from_slice(payload))
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                let detail = error_chain(&e);
                warn!(
                    timeout = e.is_timeout(),
                    connect = e.is_connect(),
                    error = %detail,
                    "message request failed"
                );
                return SendOutcome::Fault(UpstreamFault::Connection { detail });
            }
        };

        let status = response.status();

        if status == StatusCode::ACCEPTED && self.config.mode == TransportMode::Streaming {
            debug!("message accepted, reply expected on push channel");
            return SendOutcome::Accepted;
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                warn!(status = status.as_u16(), error = %error_chain(&e), "failed to read response");
                return SendOutcome::Fault(UpstreamFault::UnreadableBody);
            }
        };

        if status != StatusCode::OK {
            warn!(
                status = status.as_u16(),
                body = %body_excerpt(&body),
                "message request returned HTTP error"
            );
            return SendOutcome::Fault(UpstreamFault::HttpStatus {
                status: status.as_u16(),
            });
        }

        SendOutcome::Reply(body)
    }
}

/// Lossy, truncated rendering of a response body for logs.
fn body_excerpt(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.len() <= LOG_BODY_LIMIT {
        return text.into_owned();
    }
    let mut end = LOG_BODY_LIMIT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}
