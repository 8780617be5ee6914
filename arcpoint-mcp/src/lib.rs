//! Stdio relay between a local MCP client and a remote Arcpoint endpoint.
//!
//! The binary in `main.rs` is a thin wrapper around [`relay::run_relay`];
//! the modules are public so integration tests can drive the relay over
//! in-memory pipes.

pub mod cli;
pub mod error;
pub mod relay;
