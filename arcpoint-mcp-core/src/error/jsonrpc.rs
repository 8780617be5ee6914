//! JSON-RPC 2.0 error envelope written to local output.
//!
//! The envelope deliberately has no `id` member. The relay never parses the
//! payload it forwards, so there is no request id to echo back.

use serde::{Deserialize, Serialize};

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code.
    pub code: i32,

    /// Human-readable error message.
    pub message: String,
}

/// Minimal JSON-RPC error response: version marker plus error object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Always `"2.0"`.
    pub jsonrpc: String,

    /// The error being reported.
    pub error: JsonRpcError,
}

impl ErrorEnvelope {
    /// Wrap an error object in a `"2.0"` envelope.
    pub fn new(error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            error,
        }
    }

    /// Serialize to a single JSON line, without the trailing newline.
    pub fn to_line(&self) -> String {
        // Two string fields and an integer cannot fail to serialize; the
        // fallback keeps the output channel well-formed regardless.
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                r#"{{"jsonrpc":"2.0","error":{{"code":{},"message":"internal error"}}}}"#,
                self.error.code
            )
        })
    }
}
