//! Error types for relay configuration and upstream delivery.
//!
//! `ConfigError` is fatal and surfaces before any network activity.
//! `UpstreamFault` is per-message: it is translated into a JSON-RPC error
//! envelope, written to local output, and the relay moves on.

pub mod jsonrpc;

pub use jsonrpc::{ErrorEnvelope, JsonRpcError};

/// Configuration errors detected at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The bearer credential is unset or empty.
    #[error("ARCPOINT_API_TOKEN environment variable is required")]
    MissingToken,

    /// A setting is present but cannot be parsed.
    #[error("{name} must be a valid integer, got: '{value}'")]
    InvalidValue {
        /// Name of the offending setting.
        name: &'static str,
        /// The raw value found.
        value: String,
    },

    /// The endpoint base URL is not an absolute http(s) URL.
    #[error("invalid endpoint URL '{url}': {reason}")]
    InvalidUrl {
        /// The configured URL.
        url: String,
        /// Human-readable description of the parse failure.
        reason: String,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Upstream Delivery Faults
// ─────────────────────────────────────────────────────────────────────────────

/// Failure outcome of a single `POST /message` call.
///
/// Each variant maps to one fixed JSON-RPC error code via
/// [`UpstreamFault::to_jsonrpc_error`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamFault {
    /// DNS, connect, TLS, or timeout failure before a status was received.
    #[error("Connection error: {detail}")]
    Connection {
        /// Transport error text.
        detail: String,
    },

    /// A status was received but the body could not be read.
    #[error("Failed to read response")]
    UnreadableBody,

    /// Any status other than 200 (and 202 in streaming mode).
    #[error("HTTP error {status}")]
    HttpStatus {
        /// The HTTP status code.
        status: u16,
    },
}

/// Application error code for rejected credentials (HTTP 401).
pub const CODE_INVALID_TOKEN: i32 = -32001;
/// Application error code for forbidden access (HTTP 403).
pub const CODE_ACCESS_DENIED: i32 = -32002;
/// Application error code for throttling (HTTP 429).
pub const CODE_RATE_LIMITED: i32 = -32003;
/// Application error code for gateway failures (HTTP 502/503/504).
pub const CODE_UNAVAILABLE: i32 = -32004;
/// JSON-RPC internal error, used for transport and unmapped HTTP failures.
pub const CODE_INTERNAL: i32 = -32603;

impl UpstreamFault {
    /// Map this fault to its fixed JSON-RPC code and message.
    pub fn to_jsonrpc_error(&self) -> JsonRpcError {
        let (code, message) = match self {
            UpstreamFault::Connection { detail } => {
                (CODE_INTERNAL, format!("Connection error: {detail}"))
            }
            UpstreamFault::UnreadableBody => {
                (CODE_INTERNAL, "Failed to read response".to_string())
            }
            UpstreamFault::HttpStatus { status } => match status {
                401 => (CODE_INVALID_TOKEN, "Invalid API token".to_string()),
                403 => (CODE_ACCESS_DENIED, "Access denied".to_string()),
                429 => (CODE_RATE_LIMITED, "Rate limit exceeded".to_string()),
                502..=504 => (
                    CODE_UNAVAILABLE,
                    "Service temporarily unavailable".to_string(),
                ),
                other => (CODE_INTERNAL, format!("Server error: {other}")),
            },
        };
        JsonRpcError { code, message }
    }

    /// Wrap this fault in the envelope written to local output.
    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope::new(self.to_jsonrpc_error())
    }

    /// Metric/log label for this fault.
    pub fn error_type(&self) -> &'static str {
        match self {
            UpstreamFault::Connection { .. } => "connection",
            UpstreamFault::UnreadableBody => "unreadable_body",
            UpstreamFault::HttpStatus { .. } => "http_status",
        }
    }
}
