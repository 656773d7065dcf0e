//! Production I/O for Beerdegu room sessions.
//!
//! The session logic lives in `beerdegu-app` and never touches a socket.
//! This crate supplies the real world around it:
//!
//! - [`WebSocketDriver`]: the [`beerdegu_app::Driver`] on tokio-tungstenite
//! - [`RoomsApi`]: the REST calls, including the membership preflight
//! - [`open_room`]: preflight, then a runtime ready to connect

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod api;
pub mod config;
pub mod error;
pub mod system_env;
pub mod transport;

use beerdegu_app::{RoomHandle, Runtime};
use beerdegu_core::{AuthSession, RoomEndpoint};

pub use api::{NewRoom, Page, RoomSummary, RoomsApi, UserRef};
pub use config::ClientConfig;
pub use error::{ApiError, ClientError, TransportError};
pub use system_env::SystemEnv;
pub use transport::WebSocketDriver;

/// Check membership in `room`, then build the session runtime for it.
///
/// Nothing is dialed until the returned runtime is run. Non-members get
/// [`ApiError::NotMember`] and no socket is ever opened.
///
/// # Errors
///
/// - `Api` if the preflight fails, `NotMember` included.
/// - `Connection` if the socket URL cannot be built for `room`.
pub async fn open_room(
    config: &ClientConfig,
    auth: &AuthSession,
    room: &str,
) -> Result<(Runtime<WebSocketDriver>, RoomHandle), ClientError> {
    let api = RoomsApi::new(&config.backend_url, auth.clone())?;
    let membership = api.check_membership(room).await?;

    let endpoint = RoomEndpoint::new(
        config.websocket_url.as_str(),
        room,
        Some(membership.socket_token(auth)),
    )?;
    tracing::info!(%endpoint, role = ?membership.role, "joining room");

    Ok(Runtime::new(WebSocketDriver::new(), endpoint, membership.role, config.session))
}
