//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` stands in for the WebSocket driver. It records every call the
//! runtime makes and lets the test play the server through a [`SimServer`]
//! handle: push frames, drop the connection, refuse dials.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use beerdegu_app::{Driver, SessionEvent};
use beerdegu_core::{CloseKind, Environment};
use beerdegu_proto::{ClientCommand, ProtocolError, ServerEvent};
use tokio::sync::mpsc;

use crate::sim_env::SimEnv;

/// One call the runtime made on the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    /// Dial to a URL.
    Dial(String),
    /// Text frame written.
    Send(String),
    /// Close requested.
    Disconnect,
}

/// Error type for the simulation driver. Never produced.
#[derive(Debug, Clone)]
pub struct SimDriverError(pub String);

impl std::fmt::Display for SimDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDriverError: {}", self.0)
    }
}

impl std::error::Error for SimDriverError {}

#[derive(Debug)]
struct Shared {
    calls: Vec<DriverCall>,
    refuse_dials: bool,
    auto_open: bool,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scripted driver.
///
/// Dials succeed immediately by default. Every disconnect is answered with a
/// normal close.
pub struct SimDriver<E: Environment = SimEnv> {
    env: E,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    loopback: mpsc::UnboundedSender<SessionEvent>,
    shared: Arc<Mutex<Shared>>,
}

impl SimDriver<SimEnv> {
    /// Driver on tokio's clock and the server handle scripting it.
    pub fn new() -> (Self, SimServer) {
        Self::with_env(SimEnv)
    }
}

impl<E: Environment> SimDriver<E> {
    /// Driver on a custom environment.
    pub fn with_env(env: E) -> (Self, SimServer) {
        let (loopback, events) = mpsc::unbounded_channel();
        let shared = Arc::new(Mutex::new(Shared {
            calls: Vec::new(),
            refuse_dials: false,
            auto_open: true,
        }));

        let server = SimServer { events: loopback.clone(), shared: Arc::clone(&shared) };
        (Self { env, events, loopback, shared }, server)
    }

    fn enqueue(&self, event: SessionEvent) {
        // The receiver lives in `self`, so this only fails during drop.
        let _ = self.loopback.send(event);
    }
}

impl<E: Environment> Driver for SimDriver<E> {
    type Error = SimDriverError;
    type Instant = E::Instant;

    async fn dial(&mut self, url: &str) -> Result<(), Self::Error> {
        let (refuse, auto_open) = {
            let mut shared = lock(&self.shared);
            shared.calls.push(DriverCall::Dial(url.to_string()));
            (shared.refuse_dials, shared.auto_open)
        };

        if refuse {
            tracing::debug!(url, "sim: refusing dial");
            self.enqueue(SessionEvent::Closed(CloseKind::Abnormal));
        } else if auto_open {
            self.enqueue(SessionEvent::Opened);
        }
        Ok(())
    }

    async fn send_text(&mut self, text: String) -> Result<(), Self::Error> {
        lock(&self.shared).calls.push(DriverCall::Send(text));
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), Self::Error> {
        lock(&self.shared).calls.push(DriverCall::Disconnect);
        self.enqueue(SessionEvent::Closed(CloseKind::Normal));
        Ok(())
    }

    async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    fn now(&self) -> Self::Instant {
        self.env.now()
    }
}

/// Test-side handle that plays the server.
#[derive(Clone)]
pub struct SimServer {
    events: mpsc::UnboundedSender<SessionEvent>,
    shared: Arc<Mutex<Shared>>,
}

impl SimServer {
    /// Deliver a server event as a text frame.
    pub fn push(&self, event: &ServerEvent) -> Result<(), ProtocolError> {
        self.push_raw(event.encode()?);
        Ok(())
    }

    /// Deliver a raw text frame, malformed or not.
    pub fn push_raw(&self, text: impl Into<String>) {
        self.inject(SessionEvent::Frame(text.into()));
    }

    /// Complete a pending dial when auto-open is off.
    pub fn open(&self) {
        self.inject(SessionEvent::Opened);
    }

    /// Drop the socket without a close handshake.
    pub fn drop_connection(&self) {
        self.inject(SessionEvent::Closed(CloseKind::Abnormal));
    }

    /// Close the socket cleanly from the server side.
    pub fn close(&self) {
        self.inject(SessionEvent::Closed(CloseKind::Normal));
    }

    /// Make every following dial fail.
    pub fn refuse_dials(&self, refuse: bool) {
        lock(&self.shared).refuse_dials = refuse;
    }

    /// Open dials automatically (the default) or wait for [`SimServer::open`].
    pub fn auto_open(&self, auto_open: bool) {
        lock(&self.shared).auto_open = auto_open;
    }

    /// Every driver call so far.
    pub fn calls(&self) -> Vec<DriverCall> {
        lock(&self.shared).calls.clone()
    }

    /// Number of dials so far.
    pub fn dial_count(&self) -> usize {
        lock(&self.shared).calls.iter().filter(|call| matches!(call, DriverCall::Dial(_))).count()
    }

    /// Decoded outbound commands, in send order.
    pub fn sent_commands(&self) -> Vec<ClientCommand> {
        lock(&self.shared)
            .calls
            .iter()
            .filter_map(|call| match call {
                DriverCall::Send(text) => ClientCommand::decode(text).ok(),
                DriverCall::Dial(_) | DriverCall::Disconnect => None,
            })
            .collect()
    }

    /// Forget recorded calls.
    pub fn clear(&self) {
        lock(&self.shared).calls.clear();
    }

    fn inject(&self, event: SessionEvent) {
        // Fails only once the driver is gone; nothing to deliver to then.
        let _ = self.events.send(event);
    }
}
