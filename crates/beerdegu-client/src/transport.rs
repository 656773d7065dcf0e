//! WebSocket transport for room sessions.
//!
//! Provides [`WebSocketDriver`], the production [`Driver`]. Every dial spawns
//! a socket task that bridges one tokio-tungstenite stream and two channels.
//! This is a thin layer that only moves text frames; protocol logic stays in
//! the Sans-IO session.

use beerdegu_app::{Driver, SessionEvent};
use beerdegu_core::{CloseKind, Environment};
use futures::{SinkExt, StreamExt};
use tokio::{net::TcpStream, sync::mpsc, task::AbortHandle};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream,
    tungstenite::{Message, protocol::frame::coding::CloseCode},
};

use crate::{error::TransportError, system_env::SystemEnv};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug)]
enum Outbound {
    Text(String),
    Close,
}

#[derive(Debug)]
struct Socket {
    outbound: mpsc::UnboundedSender<Outbound>,
    task: AbortHandle,
}

/// [`Driver`] over a real WebSocket.
///
/// Each socket task reports exactly one [`SessionEvent::Closed`], whether the
/// dial failed, the server went away, or the client closed.
#[derive(Debug)]
pub struct WebSocketDriver<E: Environment = SystemEnv> {
    env: E,
    reporter: mpsc::UnboundedSender<SessionEvent>,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    socket: Option<Socket>,
}

impl WebSocketDriver<SystemEnv> {
    /// Driver on the system clock.
    pub fn new() -> Self {
        Self::with_env(SystemEnv)
    }
}

impl Default for WebSocketDriver<SystemEnv> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Environment> WebSocketDriver<E> {
    /// Driver on a custom environment.
    pub fn with_env(env: E) -> Self {
        let (reporter, events) = mpsc::unbounded_channel();
        Self { env, reporter, events, socket: None }
    }

    fn report(&self, event: SessionEvent) {
        // The receiver lives in `self`.
        let _ = self.reporter.send(event);
    }
}

impl<E: Environment> Driver for WebSocketDriver<E> {
    type Error = TransportError;
    type Instant = E::Instant;

    async fn dial(&mut self, url: &str) -> Result<(), Self::Error> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| TransportError::NoRuntime)?;

        if let Some(previous) = self.socket.take() {
            previous.task.abort();
        }

        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let task = runtime.spawn(run_socket(url.to_string(), outbound_rx, self.reporter.clone()));
        self.socket = Some(Socket { outbound, task: task.abort_handle() });
        Ok(())
    }

    async fn send_text(&mut self, text: String) -> Result<(), Self::Error> {
        let delivered = self
            .socket
            .as_ref()
            .is_some_and(|socket| socket.outbound.send(Outbound::Text(text)).is_ok());
        if !delivered {
            tracing::debug!("socket task gone, dropping frame");
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), Self::Error> {
        let closing = self
            .socket
            .as_ref()
            .is_some_and(|socket| socket.outbound.send(Outbound::Close).is_ok());
        if !closing {
            // No socket task left to report the close.
            self.report(SessionEvent::Closed(CloseKind::Normal));
        }
        Ok(())
    }

    async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    fn now(&self) -> Self::Instant {
        self.env.now()
    }
}

impl<E: Environment> Drop for WebSocketDriver<E> {
    fn drop(&mut self) {
        if let Some(socket) = self.socket.take() {
            socket.task.abort();
        }
    }
}

/// Connect, then bridge socket and channels until either side ends.
async fn run_socket(
    url: String,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    events: mpsc::UnboundedSender<SessionEvent>,
) {
    // The URL carries the socket token; keep it out of logs.
    let kind = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok((stream, _response)) => {
            let _ = events.send(SessionEvent::Opened);
            pump(stream, &mut outbound, &events).await
        },
        Err(error) => {
            tracing::warn!(%error, "room socket dial failed");
            CloseKind::Abnormal
        },
    };

    // The driver may already be gone.
    let _ = events.send(SessionEvent::Closed(kind));
}

async fn pump(
    stream: WsStream,
    outbound: &mut mpsc::UnboundedReceiver<Outbound>,
    events: &mpsc::UnboundedSender<SessionEvent>,
) -> CloseKind {
    let (mut sink, mut source) = stream.split();
    let mut closing = false;

    loop {
        tokio::select! {
            command = outbound.recv(), if !closing => match command {
                Some(Outbound::Text(text)) => {
                    if let Err(error) = sink.send(Message::text(text)).await {
                        tracing::warn!(%error, "room socket write failed");
                        return CloseKind::Abnormal;
                    }
                },
                Some(Outbound::Close) | None => {
                    closing = true;
                    if let Err(error) = sink.send(Message::Close(None)).await {
                        tracing::debug!(%error, "close handshake failed");
                        return CloseKind::Normal;
                    }
                },
            },
            message = source.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    let _ = events.send(SessionEvent::Frame(text.as_str().to_owned()));
                },
                Some(Ok(Message::Close(frame))) => {
                    let code = frame.as_ref().map(|frame| frame.code);
                    tracing::debug!(?code, closing, "room socket close frame");
                    return match code {
                        _ if closing => CloseKind::Normal,
                        None | Some(CloseCode::Normal) => CloseKind::Normal,
                        Some(_) => CloseKind::Abnormal,
                    };
                },
                Some(Ok(_)) => {},
                Some(Err(error)) => {
                    if closing {
                        return CloseKind::Normal;
                    }
                    tracing::warn!(%error, "room socket read failed");
                    return CloseKind::Abnormal;
                },
                None => {
                    return if closing { CloseKind::Normal } else { CloseKind::Abnormal };
                },
            },
        }
    }
}
