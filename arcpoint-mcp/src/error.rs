//! Error types for the stdio relay.
//!
//! `FramingError` covers bounded line reading on stdin and on the push
//! channel. `StreamError` covers one event stream connection; the reconnect
//! supervisor recovers from all of them except local output failures.
//! `RelayError` is what `run_relay` returns, and is always fatal.

use arcpoint_mcp_core::ConfigError;

/// Errors while reading one newline-delimited line.
#[derive(Debug, thiserror::Error)]
pub enum FramingError {
    /// A single line exceeds the configured maximum size.
    ///
    /// The offending bytes are drained so the next read starts on a fresh line.
    #[error("Message exceeds maximum size of {max_bytes} bytes")]
    MessageTooLarge {
        /// The configured maximum line size in bytes.
        max_bytes: usize,
    },

    /// An underlying IO error occurred while reading.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ─────────────────────────────────────────────────────────────────────────────
// Event Stream Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Failure of a single `GET /sse` connection.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The request could not be sent (DNS, connect, TLS).
    #[error("event stream connection failed: {reason}")]
    Connect {
        /// Transport error text.
        reason: String,
    },

    /// The server answered with something other than 200.
    #[error("event stream connection failed with status {status}: {body}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// Response body, for diagnosis.
        body: String,
    },

    /// The body stream failed mid-read.
    #[error("error reading event stream: {reason}")]
    Read {
        /// Transport error text.
        reason: String,
    },

    /// A single event stream line exceeded the line limit.
    #[error("event stream line exceeds maximum size of {max_bytes} bytes")]
    LineTooLong {
        /// The configured maximum line size in bytes.
        max_bytes: usize,
    },

    /// Writing a `message` event to local output failed.
    #[error("failed to write to local output: {0}")]
    Output(std::io::Error),
}

impl StreamError {
    /// Whether the supervisor may reconnect after this error.
    ///
    /// Local output failures are not recoverable: the peer is gone.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, StreamError::Output(_))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Relay Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Fatal errors that end the relay.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An HTTP client could not be built.
    #[error("failed to build HTTP client: {reason}")]
    Client {
        /// Human-readable description of the failure.
        reason: String,
    },

    /// Reading local input failed.
    #[error("failed to read local input: {0}")]
    Input(std::io::Error),

    /// Writing local output failed.
    #[error("failed to write to local output: {0}")]
    Output(std::io::Error),

    /// A relay task panicked or was aborted.
    #[error("{task} task failed: {reason}")]
    Task {
        /// Which task failed.
        task: &'static str,
        /// Join error description.
        reason: String,
    },
}

impl From<StreamError> for RelayError {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::Output(e) => RelayError::Output(e),
            other => RelayError::Task {
                task: "event stream",
                reason: other.to_string(),
            },
        }
    }
}
