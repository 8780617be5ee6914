//! Relay configuration.
//!
//! The relay needs two inputs from its environment: the base URL of the
//! remote MCP endpoint and a bearer credential. Everything else has a default
//! that matches the hosted service and can be overridden for testing or from
//! the CLI.

use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;

/// Environment variable holding the bearer credential (required).
pub const ENV_API_TOKEN: &str = "ARCPOINT_API_TOKEN";

/// Environment variable holding the endpoint base URL (optional).
pub const ENV_API_URL: &str = "ARCPOINT_API_URL";

/// Environment variable overriding the per-message timeout in seconds (optional).
pub const ENV_MESSAGE_TIMEOUT_SECS: &str = "ARCPOINT_MESSAGE_TIMEOUT_SECS";

/// Production endpoint used when no URL is configured.
pub const DEFAULT_API_URL: &str = "https://mcp.arcpoint.ai";

/// Per-message timeout when a push channel carries replies.
pub const STREAMING_MESSAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-message timeout when every reply comes back on the POST itself.
pub const SYNC_MESSAGE_TIMEOUT: Duration = Duration::from_secs(300);

/// Fixed delay between event stream reconnect attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// TCP + TLS handshake limit for the event stream and message posts.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Number of times the stdin reader re-checks for a session before sending.
pub const DEFAULT_SESSION_WAIT_ATTEMPTS: u32 = 10;

/// Interval between session re-checks.
pub const DEFAULT_SESSION_WAIT_INTERVAL: Duration = Duration::from_millis(100);

/// Downstream transport shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportMode {
    /// `GET /sse` push channel plus `POST /message`. Replies may arrive on
    /// either path; `202 Accepted` means "reply comes via the push channel".
    #[default]
    Streaming,
    /// `POST /message` only. Every reply is the body of the POST response.
    Synchronous,
}

impl TransportMode {
    /// Whether this mode runs the event stream listener.
    pub fn uses_push_channel(self) -> bool {
        matches!(self, TransportMode::Streaming)
    }

    /// Default per-message timeout for this mode.
    pub fn default_message_timeout(self) -> Duration {
        match self {
            TransportMode::Streaming => STREAMING_MESSAGE_TIMEOUT,
            TransportMode::Synchronous => SYNC_MESSAGE_TIMEOUT,
        }
    }
}

/// Immutable connection configuration shared by every relay task.
#[derive(Clone)]
pub struct RelayConfig {
    /// Endpoint base URL, never with a trailing slash.
    pub base_url: String,
    /// Bearer credential attached to every request.
    pub token: String,
    /// Client identifier used in the `User-Agent` header.
    pub client_id: String,
    /// Downstream transport shape.
    pub mode: TransportMode,
    /// Explicit per-message timeout; `None` uses the mode default.
    pub message_timeout: Option<Duration>,
    /// Connect timeout for all HTTP requests.
    pub connect_timeout: Duration,
    /// Fixed backoff between event stream connection attempts.
    pub reconnect_delay: Duration,
    /// How many times to re-check for a session before sending uncorrelated.
    pub session_wait_attempts: u32,
    /// Delay between session re-checks.
    pub session_wait_interval: Duration,
}

impl RelayConfig {
    /// Create a config with default timings for the given endpoint.
    ///
    /// Trailing slashes are trimmed from `base_url` so paths can be appended
    /// with a plain `format!`.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            client_id: crate::CLIENT_ID.to_string(),
            mode: TransportMode::default(),
            message_timeout: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            session_wait_attempts: DEFAULT_SESSION_WAIT_ATTEMPTS,
            session_wait_interval: DEFAULT_SESSION_WAIT_INTERVAL,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `ARCPOINT_API_TOKEN` (required): bearer credential
    /// - `ARCPOINT_API_URL` (default: `https://mcp.arcpoint.ai`): endpoint base URL
    /// - `ARCPOINT_MESSAGE_TIMEOUT_SECS` (default: mode dependent): per-message timeout
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingToken`] if the credential is unset or
    /// empty, and [`ConfigError::InvalidValue`] if the timeout is not an
    /// integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        let token = std::env::var(ENV_API_TOKEN).unwrap_or_default();
        if token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }

        let base_url = match std::env::var(ENV_API_URL) {
            Ok(url) if !url.trim().is_empty() => url.trim().to_string(),
            _ => DEFAULT_API_URL.to_string(),
        };

        let message_timeout = match std::env::var(ENV_MESSAGE_TIMEOUT_SECS) {
            Ok(val) => {
                let secs: u64 = val.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    name: ENV_MESSAGE_TIMEOUT_SECS,
                    value: val.clone(),
                })?;
                Some(Duration::from_secs(secs))
            }
            Err(_) => None,
        };

        let mut config = Self::new(base_url, token);
        config.message_timeout = message_timeout;
        Ok(config)
    }

    /// Check that the base URL is an absolute http(s) URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] if the URL does not parse or uses
    /// another scheme.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ConfigError::InvalidUrl {
                url: self.base_url.clone(),
                reason: format!("unsupported scheme '{other}'"),
            }),
        }
    }

    /// Override the endpoint base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Select the transport mode.
    pub fn with_mode(mut self, mode: TransportMode) -> Self {
        self.mode = mode;
        self
    }

    /// Override the per-message timeout.
    pub fn with_message_timeout(mut self, timeout: Duration) -> Self {
        self.message_timeout = Some(timeout);
        self
    }

    /// Override the reconnect backoff.
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Override the session wait policy.
    pub fn with_session_wait(mut self, attempts: u32, interval: Duration) -> Self {
        self.session_wait_attempts = attempts;
        self.session_wait_interval = interval;
        self
    }

    /// Effective per-message timeout.
    pub fn message_timeout(&self) -> Duration {
        self.message_timeout
            .unwrap_or_else(|| self.mode.default_message_timeout())
    }

    /// `GET` target for the push channel.
    pub fn sse_url(&self) -> String {
        format!("{}/sse", self.base_url)
    }

    /// `POST` target for a message, correlated when a session is known.
    pub fn message_url(&self, session_id: Option<&str>) -> String {
        match session_id {
            Some(id) => format!("{}/message?sessionId={id}", self.base_url),
            None => format!("{}/message", self.base_url),
        }
    }

    /// `User-Agent` header value.
    pub fn user_agent(&self) -> String {
        crate::user_agent(&self.client_id)
    }
}

// The credential must never reach logs.
impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("base_url", &self.base_url)
            .field("token", &"[REDACTED]")
            .field("client_id", &self.client_id)
            .field("mode", &self.mode)
            .field("message_timeout", &self.message_timeout())
            .field("connect_timeout", &self.connect_timeout)
            .field("reconnect_delay", &self.reconnect_delay)
            .field("session_wait_attempts", &self.session_wait_attempts)
            .field("session_wait_interval", &self.session_wait_interval)
            .finish()
    }
}
