//! CLI argument types for `arcpoint-mcp`.
//!
//! Defined separately from `main.rs` so integration tests can parse them
//! directly.

use std::time::Duration;

use clap::{Args, ValueEnum};

use arcpoint_mcp_core::config::{ENV_API_TOKEN, ENV_API_URL, ENV_MESSAGE_TIMEOUT_SECS};
use arcpoint_mcp_core::{RelayConfig, TransportMode};

/// Where users obtain an API token.
pub const TOKEN_SETTINGS_URL: &str = "https://arcpoint.ai/settings/tokens";

/// Relay arguments. Flags override the corresponding environment variables.
#[derive(Args, Debug)]
pub struct RelayArgs {
    /// Endpoint base URL (overrides ARCPOINT_API_URL).
    #[arg(long)]
    pub url: Option<String>,

    /// Downstream transport.
    #[arg(long, value_enum, default_value = "streaming")]
    pub mode: CliMode,

    /// Per-message request timeout in seconds (overrides ARCPOINT_MESSAGE_TIMEOUT_SECS).
    #[arg(long)]
    pub message_timeout_secs: Option<u64>,

    /// Enable debug logging.
    #[arg(long)]
    pub verbose: bool,
}

/// CLI-facing transport mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CliMode {
    /// `GET /sse` push channel plus `POST /message`.
    Streaming,
    /// `POST /message` only; replies come back on the POST.
    Sync,
}

impl From<CliMode> for TransportMode {
    fn from(mode: CliMode) -> Self {
        match mode {
            CliMode::Streaming => TransportMode::Streaming,
            CliMode::Sync => TransportMode::Synchronous,
        }
    }
}

impl RelayArgs {
    /// Layer flag values over an environment-derived config.
    pub fn apply(&self, config: RelayConfig) -> RelayConfig {
        let mut config = config.with_mode(self.mode.into());
        if let Some(url) = &self.url {
            config = config.with_base_url(url.as_str());
        }
        if let Some(secs) = self.message_timeout_secs {
            config = config.with_message_timeout(Duration::from_secs(secs));
        }
        config
    }
}

/// Remediation text printed when no API token is configured.
pub fn missing_token_help() -> String {
    format!(
        "Error: {ENV_API_TOKEN} environment variable is required.\n\
         \n\
         Get an API token at {TOKEN_SETTINGS_URL}, then add it to your MCP client\n\
         configuration:\n\
         \n\
         {{\n  \
           \"mcpServers\": {{\n    \
             \"arcpoint\": {{\n      \
               \"command\": \"arcpoint-mcp\",\n      \
               \"env\": {{\n        \
                 \"{ENV_API_TOKEN}\": \"your-token-here\"\n      \
               }}\n    \
             }}\n  \
           }}\n\
         }}\n\
         \n\
         Optional: {ENV_API_URL} overrides the endpoint, {ENV_MESSAGE_TIMEOUT_SECS} the\n\
         per-message timeout."
    )
}
