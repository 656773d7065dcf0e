//! Backend endpoints and session tuning.

use beerdegu_app::SessionConfig;
use url::Url;

use crate::error::ClientError;

/// Where the backend lives and how sessions behave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// REST base, e.g. `http://127.0.0.1:8000`.
    pub backend_url: Url,
    /// WebSocket base, e.g. `ws://127.0.0.1:8000`.
    pub websocket_url: Url,
    /// Session timers and buffers.
    pub session: SessionConfig,
}

impl ClientConfig {
    /// Validate both base URLs. Session settings start at their defaults.
    ///
    /// # Errors
    ///
    /// - `Config` if either URL does not parse or has the wrong scheme.
    pub fn new(backend_url: &str, websocket_url: &str) -> Result<Self, ClientError> {
        let backend_url = parse(backend_url, &["http", "https"])?;
        let websocket_url = parse(websocket_url, &["ws", "wss"])?;
        Ok(Self { backend_url, websocket_url, session: SessionConfig::default() })
    }

    /// Replace the session settings.
    #[must_use]
    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }
}

fn parse(raw: &str, schemes: &[&str]) -> Result<Url, ClientError> {
    let url = Url::parse(raw).map_err(|error| ClientError::Config(format!("`{raw}`: {error}")))?;
    if url.cannot_be_a_base() || !schemes.contains(&url.scheme()) {
        return Err(ClientError::Config(format!("`{raw}`: expected one of {schemes:?}")));
    }
    Ok(url)
}
