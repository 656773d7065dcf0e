//! Room socket lifecycle state machine.
//!
//! Owns the only path for outbound frames. The driver executes
//! [`ConnectionAction`]s and reports back socket events; the connection
//! decides when to redial and whether a frame may go out.
//!
//! # State Machine
//!
//! ```text
//! Connecting ──opened──> Open ──close()──> Closing ──closed──> Closed
//!     ^                    │
//!     │                    │ abnormal close, attempts left
//!     └──(retry due)───────┘
//! ```
//!
//! Abnormal closes schedule a redial after `reconnect_interval`. After
//! `max_reconnect_attempts` consecutive failures the connection gives up and
//! moves to `Closed`. A successful open resets the budget. A client-initiated
//! close never triggers a redial.

use std::{ops::Sub, time::Duration};

use beerdegu_proto::{ClientCommand, ServerEvent};

use crate::{endpoint::RoomEndpoint, error::ConnectionError};

/// Redials before giving up.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Delay between an abnormal close and the next dial.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(5);

/// Socket lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConnectionStatus {
    /// Dialing, or waiting to redial.
    #[default]
    Connecting,
    /// Socket is open. Frames may be sent.
    Open,
    /// Client asked to close, waiting for the socket to finish.
    Closing,
    /// Terminal. No further dials.
    Closed,
}

/// How the socket went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseKind {
    /// Orderly close handshake.
    Normal,
    /// Dial failure, reset, or any close without a handshake.
    Abnormal,
}

/// Operations the driver performs on behalf of the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionAction {
    /// Open a socket to `url`.
    Dial {
        /// Endpoint URL, including the token query.
        url: String,
    },
    /// Write one text frame.
    SendText(String),
    /// Start a close handshake.
    Disconnect,
}

/// Result of [`Connection::handle_opened`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opened {
    /// True if the socket had been open before. Callers resynchronize state
    /// on reconnect.
    pub reconnected: bool,
}

/// Reconnection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Consecutive redials before giving up.
    pub max_reconnect_attempts: u32,
    /// Delay before each redial.
    pub reconnect_interval: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
        }
    }
}

/// Connection state machine for one room socket.
///
/// Generic over the instant type so tests can drive it with virtual time.
#[derive(Debug, Clone)]
pub struct Connection<I> {
    endpoint: RoomEndpoint,
    config: ConnectionConfig,
    status: ConnectionStatus,
    /// A dial was issued and has not resolved yet.
    dialing: bool,
    /// Redials since the last successful open.
    attempts: u32,
    /// When the pending redial became scheduled.
    retry_since: Option<I>,
    ever_opened: bool,
}

impl<I> Connection<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Create a connection. Nothing is dialed until [`Connection::start`].
    pub fn new(endpoint: RoomEndpoint, config: ConnectionConfig) -> Self {
        Self {
            endpoint,
            config,
            status: ConnectionStatus::Connecting,
            dialing: false,
            attempts: 0,
            retry_since: None,
            ever_opened: false,
        }
    }

    /// Issue the first dial.
    ///
    /// Idempotent: returns nothing once a dial is in flight or the socket is
    /// already up.
    pub fn start(&mut self) -> Vec<ConnectionAction> {
        if self.status != ConnectionStatus::Connecting || self.dialing || self.retry_since.is_some()
        {
            return Vec::new();
        }

        vec![self.dial()]
    }

    /// The socket finished its handshake.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if no dial was outstanding.
    pub fn handle_opened(&mut self) -> Result<Opened, ConnectionError> {
        if self.status != ConnectionStatus::Connecting || !self.dialing {
            return Err(ConnectionError::InvalidState { status: self.status, operation: "open" });
        }

        let reconnected = self.ever_opened;
        self.status = ConnectionStatus::Open;
        self.dialing = false;
        self.attempts = 0;
        self.retry_since = None;
        self.ever_opened = true;

        tracing::info!(endpoint = %self.endpoint, reconnected, "room socket open");
        Ok(Opened { reconnected })
    }

    /// The socket closed, or a dial failed.
    ///
    /// Returns the status after the close has been accounted for.
    pub fn handle_closed(&mut self, kind: CloseKind, now: I) -> ConnectionStatus {
        self.dialing = false;

        match self.status {
            ConnectionStatus::Closed => {},
            ConnectionStatus::Closing => {
                self.status = ConnectionStatus::Closed;
                tracing::debug!(endpoint = %self.endpoint, "room socket closed by client");
            },
            ConnectionStatus::Connecting | ConnectionStatus::Open => match kind {
                CloseKind::Normal => {
                    self.status = ConnectionStatus::Closed;
                    tracing::info!(endpoint = %self.endpoint, "room socket closed by server");
                },
                CloseKind::Abnormal if self.attempts < self.config.max_reconnect_attempts => {
                    self.attempts += 1;
                    self.status = ConnectionStatus::Connecting;
                    self.retry_since = Some(now);
                    tracing::warn!(
                        endpoint = %self.endpoint,
                        attempt = self.attempts,
                        max = self.config.max_reconnect_attempts,
                        delay = ?self.config.reconnect_interval,
                        "room socket lost, scheduling reconnect"
                    );
                },
                CloseKind::Abnormal => {
                    self.status = ConnectionStatus::Closed;
                    self.retry_since = None;
                    tracing::error!(
                        endpoint = %self.endpoint,
                        attempts = self.attempts,
                        "room socket lost, reconnect attempts exhausted"
                    );
                },
            },
        }

        self.status
    }

    /// Advance timers. Emits a redial once the retry interval has elapsed.
    pub fn tick(&mut self, now: I) -> Vec<ConnectionAction> {
        match self.retry_since {
            Some(since)
                if self.status == ConnectionStatus::Connecting
                    && now - since >= self.config.reconnect_interval =>
            {
                self.retry_since = None;
                tracing::debug!(endpoint = %self.endpoint, attempt = self.attempts, "redialing");
                vec![self.dial()]
            },
            _ => Vec::new(),
        }
    }

    /// Gate an outbound text frame.
    ///
    /// Frames are only written while `Open`. Anything else is dropped, not
    /// queued.
    pub fn send(&mut self, text: String) -> Option<ConnectionAction> {
        if self.status == ConnectionStatus::Open {
            Some(ConnectionAction::SendText(text))
        } else {
            tracing::debug!(status = ?self.status, "dropping frame, socket not open");
            None
        }
    }

    /// Encode and gate a command.
    pub fn send_command(&mut self, command: &ClientCommand) -> Option<ConnectionAction> {
        if self.status != ConnectionStatus::Open {
            tracing::debug!(
                command = command.name(),
                status = ?self.status,
                "dropping command, socket not open"
            );
            return None;
        }

        match command.encode() {
            Ok(text) => self.send(text),
            Err(error) => {
                tracing::warn!(command = command.name(), %error, "failed to encode command");
                None
            },
        }
    }

    /// Client-initiated close. Suppresses any further redial.
    pub fn close(&mut self) -> Vec<ConnectionAction> {
        self.retry_since = None;

        match self.status {
            ConnectionStatus::Open => {
                self.status = ConnectionStatus::Closing;
                vec![ConnectionAction::Disconnect]
            },
            ConnectionStatus::Connecting if self.dialing => {
                self.status = ConnectionStatus::Closing;
                vec![ConnectionAction::Disconnect]
            },
            ConnectionStatus::Connecting => {
                self.status = ConnectionStatus::Closed;
                Vec::new()
            },
            ConnectionStatus::Closing | ConnectionStatus::Closed => Vec::new(),
        }
    }

    /// Decode an inbound text frame.
    ///
    /// Malformed frames are logged and dropped. Unknown commands come back as
    /// [`ServerEvent::Unknown`].
    pub fn decode(&self, text: &str) -> Option<ServerEvent> {
        match ServerEvent::decode(text) {
            Ok(event) => Some(event),
            Err(error) => {
                tracing::warn!(%error, len = text.len(), "dropping malformed frame");
                None
            },
        }
    }

    /// Current status.
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// True while frames may be sent.
    pub fn is_open(&self) -> bool {
        self.status == ConnectionStatus::Open
    }

    /// Redials since the last successful open.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Endpoint this connection dials.
    pub fn endpoint(&self) -> &RoomEndpoint {
        &self.endpoint
    }

    fn dial(&mut self) -> ConnectionAction {
        self.dialing = true;
        ConnectionAction::Dial { url: self.endpoint.url().to_string() }
    }
}
