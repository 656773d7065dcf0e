//! Error types for the session core.

use thiserror::Error;

use crate::connection::ConnectionStatus;

/// Errors raised by the connection state machine and endpoint construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Transition not allowed from the current status.
    #[error("invalid state transition: cannot {operation} from {status:?}")]
    InvalidState {
        /// Status when the transition was attempted.
        status: ConnectionStatus,
        /// Attempted operation.
        operation: &'static str,
    },

    /// Socket base URL or room code cannot form a valid endpoint.
    #[error("invalid room endpoint: {0}")]
    InvalidEndpoint(String),
}

impl ConnectionError {
    /// True if the error stems from configuration rather than runtime state.
    ///
    /// Configuration errors never go away by retrying.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::InvalidEndpoint(_))
    }
}
