//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while encoding or decoding frames.
///
/// None of these are fatal for a connection: the transport boundary logs the
/// error and drops the offending frame.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame is not valid JSON or not an envelope.
    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),

    /// Known command carried a payload that does not match its schema.
    #[error("invalid payload for `{command}`: {reason}")]
    InvalidPayload {
        /// Command name of the offending frame.
        command: String,
        /// What failed to decode.
        reason: String,
    },

    /// Outbound command name is not part of the protocol.
    #[error("unknown client command `{0}`")]
    UnknownCommand(String),

    /// Rating note outside `1..=10`.
    #[error("note {0} is outside 1..=10")]
    NoteOutOfRange(u64),

    /// Room lifecycle stage name is not recognized.
    #[error("unknown room state `{0}`")]
    UnknownRoomState(String),
}

impl ProtocolError {
    pub(crate) fn invalid_payload(command: &str, err: impl std::fmt::Display) -> Self {
        Self::InvalidPayload { command: command.to_string(), reason: err.to_string() }
    }
}
