//! Transport primitives for the Arcpoint MCP stdio relay.
//!
//! This library provides the pieces the `arcpoint-mcp` binary wires together:
//! relay configuration, the JSON-RPC error envelope and HTTP fault
//! translation, the shared session registry, the serialized output sink, the
//! upstream message sender, and the server-push event framing parser.
//!
//! Nothing in this crate interprets JSON-RPC payloads. Inbound lines are
//! forwarded as opaque bytes and replies are written back verbatim.

pub mod config;
pub mod error;
pub mod output;
pub mod session;
pub mod transport;

pub use config::{RelayConfig, TransportMode};
pub use error::{ConfigError, UpstreamFault};
pub use output::OutputSink;
pub use session::SessionRegistry;

/// Client identifier sent in the `User-Agent` header.
pub const CLIENT_ID: &str = "arcpoint-mcp-client";

/// Client version sent in the `User-Agent` header.
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build the `User-Agent` header value, `{client-id}/{version}`.
pub fn user_agent(client_id: &str) -> String {
    format!("{client_id}/{CLIENT_VERSION}")
}
