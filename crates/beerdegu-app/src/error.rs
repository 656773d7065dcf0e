//! Error types for the session layer.

use beerdegu_proto::RoomState;
use thiserror::Error;

/// Reasons the dispatcher refuses to build a command.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    /// Only the host may change the room stage.
    #[error("only the host may change the room stage")]
    NotHost,

    /// Stages only move forward.
    #[error("cannot move room from {from} to {to}")]
    InvalidStageChange {
        /// Current stage.
        from: RoomState,
        /// Requested stage.
        to: RoomState,
    },

    /// Chat message was blank.
    #[error("chat message is empty")]
    EmptyMessage,

    /// The session was torn down.
    #[error("session is closed")]
    Closed,
}

/// Errors reported to [`crate::RoomHandle`] callers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// The session refused the intent.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The runtime task has stopped.
    #[error("room session has ended")]
    SessionEnded,
}
