//! Beerdegu wire protocol
//!
//! Every frame on the room socket is a JSON text frame shaped
//! `{"command": <name>, "data": <payload>}`. This crate turns those loosely
//! typed envelopes into closed, tagged unions at the transport boundary:
//!
//! - [`ClientCommand`]: everything the client may send (client -> server)
//! - [`ServerEvent`]: everything the client understands (server -> client)
//!
//! Unknown inbound commands decode to [`ServerEvent::Unknown`] rather than an
//! error so that server additions never break older clients. Known commands
//! with a payload that does not match the schema are a [`ProtocolError`].
//!
//! # Invariants
//!
//! - Each [`ClientCommand`] variant maps to exactly one command name.
//! - A rating [`Note`] is always within `1..=10`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod command;
pub mod envelope;
pub mod errors;
pub mod event;
pub mod types;

pub use command::ClientCommand;
pub use envelope::Envelope;
pub use errors::{ProtocolError, Result};
pub use event::ServerEvent;
pub use types::{
    AggregateResult, BeerId, BeerItem, BeerSummary, ChatMessage, DraftField, Note, Participant,
    RatingDraft, RoomState, UserId, UserRating,
};
