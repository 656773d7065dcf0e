//! Driver trait for abstracting socket I/O.
//!
//! The [`Driver`] decouples the [`crate::Runtime`] from a specific transport.
//! Production uses a WebSocket; tests use a scripted in-memory driver. Both
//! run the exact same session and runtime code.

use std::{future::Future, ops::Sub, time::Duration};

use crate::SessionEvent;

/// Transport operations the runtime needs.
///
/// # Contract
///
/// - `dial` returns once the attempt is under way. Its outcome arrives later
///   through `next_event` as [`SessionEvent::Opened`] or
///   [`SessionEvent::Closed`] with `CloseKind::Abnormal`.
/// - `disconnect` is always followed by a [`SessionEvent::Closed`].
/// - `next_event` never yields [`SessionEvent::Tick`]; the runtime owns the
///   clock. It must be cancel safe.
/// - Errors are reserved for failures of the driver itself. A dead socket is
///   an event, not an error.
pub trait Driver: Send {
    /// Driver failure.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Time instant type. Enables virtual time in simulation.
    type Instant: Copy + Ord + Send + Sync + Sub<Output = Duration>;

    /// Begin connecting to `url`.
    fn dial(&mut self, url: &str) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Write one text frame on the open socket.
    fn send_text(&mut self, text: String) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Start a clean close of the socket.
    fn disconnect(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Next socket event. `None` once the driver can produce no more events.
    fn next_event(&mut self) -> impl Future<Output = Option<SessionEvent>> + Send;

    /// Current time.
    fn now(&self) -> Self::Instant;
}
