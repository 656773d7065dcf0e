//! Outbound commands (client -> server).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    envelope::Envelope,
    errors::{ProtocolError, Result},
    types::{BeerId, RatingDraft, RoomState},
};

const SEND_CHAT_MESSAGE: &str = "get_new_message";
const REQUEST_ROSTER: &str = "get_users";
const REQUEST_CATALOG: &str = "get_beers";
const LOAD_CATALOG: &str = "load_beers";
const REQUEST_ROOM_STATE: &str = "get_room_state";
const CHANGE_ROOM_STATE: &str = "change_room_state";
const REQUEST_AGGREGATE_RESULTS: &str = "get_final_ratings";
const REQUEST_USER_RESULTS: &str = "get_user_ratings";
const HEARTBEAT: &str = "user_active";
const SAVE_DRAFT: &str = "user_form_save";
const REQUEST_DRAFT: &str = "get_form_data";

/// Every command the client may send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// Post a chat line to the room.
    SendChatMessage {
        /// Message body.
        text: String,
    },
    /// Ask for the current participant list.
    RequestRoster,
    /// Ask for the current beer catalog.
    RequestCatalog,
    /// Ask the server to (re)load the catalog for tasting.
    LoadCatalog,
    /// Ask for the current lifecycle stage.
    RequestRoomState,
    /// Move the room to another lifecycle stage. Host only.
    ChangeRoomState {
        /// Target stage.
        state: RoomState,
    },
    /// Ask for room-wide averages.
    RequestAggregateResults,
    /// Ask for the caller's own ratings.
    RequestUserResults,
    /// Presence ping so the server can track active participants.
    Heartbeat,
    /// Persist the caller's draft for one beer.
    SaveDraft {
        /// Beer being rated.
        beer_id: BeerId,
        /// Draft fields.
        draft: RatingDraft,
    },
    /// Ask for the caller's stored draft for one beer.
    RequestDraft {
        /// Beer being rated.
        beer_id: BeerId,
    },
}

#[derive(Serialize)]
struct DraftSaveRef<'a> {
    beer_id: BeerId,
    #[serde(flatten)]
    draft: &'a RatingDraft,
}

#[derive(Deserialize)]
struct DraftSave {
    beer_id: BeerId,
    #[serde(flatten)]
    draft: RatingDraft,
}

impl ClientCommand {
    /// Wire command name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SendChatMessage { .. } => SEND_CHAT_MESSAGE,
            Self::RequestRoster => REQUEST_ROSTER,
            Self::RequestCatalog => REQUEST_CATALOG,
            Self::LoadCatalog => LOAD_CATALOG,
            Self::RequestRoomState => REQUEST_ROOM_STATE,
            Self::ChangeRoomState { .. } => CHANGE_ROOM_STATE,
            Self::RequestAggregateResults => REQUEST_AGGREGATE_RESULTS,
            Self::RequestUserResults => REQUEST_USER_RESULTS,
            Self::Heartbeat => HEARTBEAT,
            Self::SaveDraft { .. } => SAVE_DRAFT,
            Self::RequestDraft { .. } => REQUEST_DRAFT,
        }
    }

    /// Build the wire envelope.
    pub fn to_envelope(&self) -> Result<Envelope> {
        let data = match self {
            Self::SendChatMessage { text } => Value::String(text.clone()),
            Self::ChangeRoomState { state } => Value::String(state.as_str().to_string()),
            Self::SaveDraft { beer_id, draft } => {
                serde_json::to_value(DraftSaveRef { beer_id: *beer_id, draft })?
            },
            Self::RequestDraft { beer_id } => Value::from(*beer_id),
            Self::RequestRoster
            | Self::RequestCatalog
            | Self::LoadCatalog
            | Self::RequestRoomState
            | Self::RequestAggregateResults
            | Self::RequestUserResults
            | Self::Heartbeat => Value::Null,
        };

        Ok(Envelope::new(self.name(), data))
    }

    /// Serialize to a JSON text frame.
    pub fn encode(&self) -> Result<String> {
        self.to_envelope()?.encode()
    }

    /// Parse an outbound frame. Used by servers and test harnesses.
    pub fn decode(text: &str) -> Result<Self> {
        Self::from_envelope(&Envelope::decode(text)?)
    }

    /// Interpret an envelope as an outbound command.
    pub fn from_envelope(envelope: &Envelope) -> Result<Self> {
        let command = match envelope.command.as_str() {
            SEND_CHAT_MESSAGE => Self::SendChatMessage { text: envelope.payload()? },
            REQUEST_ROSTER => Self::RequestRoster,
            REQUEST_CATALOG => Self::RequestCatalog,
            LOAD_CATALOG => Self::LoadCatalog,
            REQUEST_ROOM_STATE => Self::RequestRoomState,
            CHANGE_ROOM_STATE => Self::ChangeRoomState { state: envelope.payload()? },
            REQUEST_AGGREGATE_RESULTS => Self::RequestAggregateResults,
            REQUEST_USER_RESULTS => Self::RequestUserResults,
            HEARTBEAT => Self::Heartbeat,
            SAVE_DRAFT => {
                let DraftSave { beer_id, draft } = envelope.payload()?;
                Self::SaveDraft { beer_id, draft }
            },
            REQUEST_DRAFT => Self::RequestDraft { beer_id: envelope.payload()? },
            other => return Err(ProtocolError::UnknownCommand(other.to_string())),
        };

        Ok(command)
    }
}
