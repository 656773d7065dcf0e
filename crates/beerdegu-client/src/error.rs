//! Error types for the I/O layer.

use beerdegu_core::ConnectionError;
use reqwest::StatusCode;
use thiserror::Error;

/// REST failures.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The caller is not a member of the room (any non-2xx from the check).
    #[error("not a member of room `{room}` (status {status})")]
    NotMember {
        /// Room code.
        room: String,
        /// Status the backend answered with.
        status: StatusCode,
    },

    /// The request could not be sent.
    #[error("failed to send request to `{path}`")]
    RequestSend {
        /// Request path.
        path: String,
        /// Underlying HTTP error.
        #[source]
        source: reqwest::Error,
    },

    /// The backend answered with an unexpected status.
    #[error("unexpected response status {status} for `{path}`")]
    RequestStatus {
        /// Request path.
        path: String,
        /// Status code received.
        status: StatusCode,
    },

    /// The response body did not match the expected shape.
    #[error("failed to decode response for `{path}`")]
    DecodeResponse {
        /// Request path.
        path: String,
        /// Underlying HTTP error.
        #[source]
        source: reqwest::Error,
    },

    /// Building the HTTP client failed.
    #[error("failed to build HTTP client")]
    ClientBuilder(#[source] reqwest::Error),

    /// The backend URL cannot be joined with an API path.
    #[error("invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// WebSocket driver failures.
///
/// A socket that fails to connect or drops is reported as a session event,
/// not as an error. These are failures of the driver itself.
#[derive(Debug, Error)]
pub enum TransportError {
    /// `dial` was called outside a tokio runtime.
    #[error("no tokio runtime to run the socket on")]
    NoRuntime,
}

/// Errors from opening a room.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Membership check or another REST call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The socket endpoint could not be built.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// The socket driver failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ClientError {
    /// True if the caller should be sent back to the lobby.
    pub fn is_not_member(&self) -> bool {
        matches!(self, Self::Api(ApiError::NotMember { .. }))
    }
}
