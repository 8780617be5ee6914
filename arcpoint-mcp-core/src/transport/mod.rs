//! HTTP transport to the remote MCP endpoint.
//!
//! - [`upstream`]: `POST /message` delivery and result classification
//! - [`sse`]: line-level parser for the `GET /sse` push channel

pub mod sse;
pub mod upstream;

pub use sse::{EventFrameParser, StreamEvent, extract_session_id};
pub use upstream::{SendOutcome, UpstreamSender};

/// Maximum size of a single line on stdin or on the push channel (10 MiB).
pub const MAX_LINE_BYTES: usize = 10 * 1024 * 1024;

/// Render an error and its source chain as one line.
///
/// reqwest's top-level message ("error sending request for url ...") hides
/// the useful part ("connection refused", "dns error") in its sources.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !out.contains(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        source = cause.source();
    }
    out
}
