//! Local input → remote: read stdin lines, POST each one, write any reply.

use std::time::Duration;

use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use arcpoint_mcp_core::transport::{MAX_LINE_BYTES, SendOutcome, UpstreamSender};
use arcpoint_mcp_core::{OutputSink, SessionRegistry};

use crate::error::{FramingError, RelayError};

use super::helpers::{bounded_read_line, trim_line_end};

/// Read newline-delimited messages from `input` and deliver each upstream.
///
/// Empty lines are skipped. Each remaining line, whitespace-only ones
/// included, is posted byte-for-byte (minus its terminator). In streaming mode the reader first waits briefly
/// for the push channel to establish a session. Synchronous replies and
/// translated faults are written to `output`; `202 Accepted` writes nothing.
///
/// Returns `Ok(())` on EOF or cancellation.
///
/// # Errors
///
/// Returns [`RelayError::Input`] if reading `input` fails and
/// [`RelayError::Output`] if writing a reply fails.
pub async fn read_stdin<R>(
    input: R,
    sender: UpstreamSender,
    session: SessionRegistry,
    output: OutputSink,
    shutdown: CancellationToken,
) -> Result<(), RelayError>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut reader = BufReader::new(input);
    let mut raw_buf = Vec::new();
    let config = sender.config().clone();
    let wait_for_push_session = config.mode.uses_push_channel();

    loop {
        raw_buf.clear();

        let bytes_read = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                tracing::debug!("stdin reader: shutdown signal received");
                break;
            }
            result = bounded_read_line(&mut reader, &mut raw_buf, MAX_LINE_BYTES) => {
                match result {
                    Ok(n) => n,
                    Err(FramingError::MessageTooLarge { max_bytes }) => {
                        tracing::warn!(max_bytes, "stdin: message exceeded size limit, skipping");
                        continue;
                    }
                    Err(FramingError::Io(e)) => {
                        tracing::error!(error = %e, "error reading stdin");
                        return Err(RelayError::Input(e));
                    }
                }
            }
        };

        if bytes_read == 0 {
            tracing::debug!("stdin EOF");
            break;
        }

        let line = trim_line_end(&raw_buf);
        if line.is_empty() {
            continue;
        }

        let session_id = if wait_for_push_session {
            wait_for_session(
                &session,
                config.session_wait_attempts,
                config.session_wait_interval,
                &shutdown,
            )
            .await
        } else {
            None
        };

        if shutdown.is_cancelled() {
            break;
        }

        let correlation_id = Uuid::new_v4();
        tracing::debug!(
            %correlation_id,
            bytes = line.len(),
            session_id = session_id.as_deref().unwrap_or(""),
            "forwarding message"
        );

        let outcome = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                tracing::debug!(%correlation_id, "shutdown during in-flight message");
                break;
            }
            outcome = sender.send(line, session_id.as_deref()) => outcome,
        };

        match outcome {
            SendOutcome::Reply(body) => {
                let body = trim_line_end(&body);
                if body.is_empty() {
                    tracing::debug!(%correlation_id, "empty reply body, nothing to forward");
                    continue;
                }
                output.write_line(body).await.map_err(RelayError::Output)?;
            }
            SendOutcome::Accepted => {
                tracing::debug!(%correlation_id, "message accepted, reply will arrive on push channel");
            }
            SendOutcome::Fault(fault) => {
                tracing::warn!(
                    %correlation_id,
                    error_type = fault.error_type(),
                    error = %fault,
                    "message delivery failed, reporting locally"
                );
                let line = fault.to_envelope().to_line();
                output
                    .write_line(line.as_bytes())
                    .await
                    .map_err(RelayError::Output)?;
            }
        }
    }

    Ok(())
}

/// Look up the session, polling briefly if the push channel has not yet
/// delivered one.
///
/// Returns `None` if no session appears within `attempts * interval`, or on
/// cancellation. The caller sends uncorrelated in that case.
pub(crate) async fn wait_for_session(
    session: &SessionRegistry,
    attempts: u32,
    interval: Duration,
    shutdown: &CancellationToken,
) -> Option<String> {
    if let Some(id) = session.current().await {
        return Some(id);
    }

    for _ in 0..attempts {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => return None,
            _ = tokio::time::sleep(interval) => {}
        }
        if let Some(id) = session.current().await {
            return Some(id);
        }
    }

    tracing::warn!("session not established yet, sending without correlation");
    None
}
