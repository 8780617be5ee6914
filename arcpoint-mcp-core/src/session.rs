//! Shared session correlation token.
//!
//! The event stream listener is the only writer: it stores the token carried
//! by each `endpoint` event. The stdin reader looks it up before every POST.

use std::sync::Arc;

use tokio::sync::RwLock;

/// Cheaply clonable handle to the current session token.
///
/// An empty token is never stored; `set("")` clears the registry instead.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<RwLock<Option<String>>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current token, if one has been established.
    pub async fn current(&self) -> Option<String> {
        self.inner.read().await.clone()
    }

    /// Replace the token. An empty value clears it.
    pub async fn set(&self, session_id: impl Into<String>) {
        let session_id: String = session_id.into();
        let mut guard = self.inner.write().await;
        *guard = if session_id.is_empty() {
            None
        } else {
            Some(session_id)
        };
    }
}
