//! Inbound events (server -> client).

use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    envelope::Envelope,
    errors::Result,
    types::{AggregateResult, BeerId, BeerItem, ChatMessage, Participant, RatingDraft, RoomState, UserRating},
};

const CHAT_MESSAGE: &str = "set_new_message";
const ROSTER: &str = "set_users";
const CATALOG: &str = "set_beers";
const LIFECYCLE: &str = "set_room_state";
const AGGREGATE_RESULTS: &str = "set_final_results";
const USER_RESULTS: &str = "set_user_results";
const DRAFT_DATA: &str = "set_form_data";

/// Every event the client understands.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// A chat line was posted.
    ChatMessage(ChatMessage),
    /// Full participant list.
    Roster(Vec<Participant>),
    /// Full beer catalog.
    Catalog(Vec<BeerItem>),
    /// Room lifecycle stage.
    Lifecycle {
        /// Current stage.
        state: RoomState,
    },
    /// Room-wide averages.
    AggregateResults(Vec<AggregateResult>),
    /// The caller's own ratings.
    UserResults(Vec<UserRating>),
    /// The caller's stored draft for one beer.
    DraftData {
        /// Beer the draft belongs to. `None` if the server omitted it.
        beer_id: Option<BeerId>,
        /// Stored draft, empty if none was saved yet.
        draft: RatingDraft,
    },
    /// Command this client does not know about.
    Unknown {
        /// Command name as received.
        command: String,
    },
}

/// Lifecycle payloads are either the serialized room or a bare stage name.
#[derive(Deserialize)]
#[serde(untagged)]
enum LifecyclePayload {
    Room { state: RoomState },
    Bare(RoomState),
}

impl ServerEvent {
    /// Parse an inbound text frame.
    pub fn decode(text: &str) -> Result<Self> {
        Self::from_envelope(Envelope::decode(text)?)
    }

    /// Interpret an envelope as an inbound event.
    pub fn from_envelope(envelope: Envelope) -> Result<Self> {
        let event = match envelope.command.as_str() {
            CHAT_MESSAGE => Self::ChatMessage(envelope.payload()?),
            ROSTER => Self::Roster(envelope.payload()?),
            CATALOG => Self::Catalog(envelope.payload()?),
            LIFECYCLE => {
                let state = match envelope.payload()? {
                    LifecyclePayload::Room { state } | LifecyclePayload::Bare(state) => state,
                };
                Self::Lifecycle { state }
            },
            AGGREGATE_RESULTS => Self::AggregateResults(envelope.payload()?),
            USER_RESULTS => Self::UserResults(envelope.payload()?),
            DRAFT_DATA => {
                let draft =
                    if envelope.data.is_null() { RatingDraft::default() } else { envelope.payload()? };
                Self::DraftData { beer_id: envelope.beer_id, draft }
            },
            _ => Self::Unknown { command: envelope.command },
        };

        Ok(event)
    }

    /// Wire command name.
    pub fn command(&self) -> &str {
        match self {
            Self::ChatMessage(_) => CHAT_MESSAGE,
            Self::Roster(_) => ROSTER,
            Self::Catalog(_) => CATALOG,
            Self::Lifecycle { .. } => LIFECYCLE,
            Self::AggregateResults(_) => AGGREGATE_RESULTS,
            Self::UserResults(_) => USER_RESULTS,
            Self::DraftData { .. } => DRAFT_DATA,
            Self::Unknown { command } => command,
        }
    }

    /// Build the wire envelope, as the server would send it.
    pub fn to_envelope(&self) -> Result<Envelope> {
        let envelope = match self {
            Self::ChatMessage(message) => Envelope::new(CHAT_MESSAGE, serde_json::to_value(message)?),
            Self::Roster(users) => Envelope::new(ROSTER, serde_json::to_value(users)?),
            Self::Catalog(beers) => Envelope::new(CATALOG, serde_json::to_value(beers)?),
            Self::Lifecycle { state } => Envelope::new(LIFECYCLE, json!({ "state": state })),
            Self::AggregateResults(results) => {
                Envelope::new(AGGREGATE_RESULTS, serde_json::to_value(results)?)
            },
            Self::UserResults(results) => Envelope::new(USER_RESULTS, serde_json::to_value(results)?),
            Self::DraftData { beer_id, draft } => {
                let envelope = Envelope::new(DRAFT_DATA, serde_json::to_value(draft)?);
                match beer_id {
                    Some(id) => envelope.with_beer_id(*id),
                    None => envelope,
                }
            },
            Self::Unknown { command } => Envelope::new(command.clone(), Value::Null),
        };

        Ok(envelope)
    }

    /// Serialize to a JSON text frame.
    pub fn encode(&self) -> Result<String> {
        self.to_envelope()?.encode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ProtocolError, types::Note};

    #[test]
    fn decode_chat_message() {
        let event = ServerEvent::decode(
            r#"{"command":"set_new_message","data":{"message":"hi","user":"ola"},"timestamp":"x"}"#,
        )
        .unwrap();

        assert_eq!(
            event,
            ServerEvent::ChatMessage(ChatMessage { author: "ola".into(), text: "hi".into() })
        );
    }

    #[test]
    fn decode_lifecycle_from_room_object() {
        let event = ServerEvent::decode(
            r#"{"command":"set_room_state","data":{"name":"ABCD","slots":4,"state":"FINISHED"}}"#,
        )
        .unwrap();

        assert_eq!(event, ServerEvent::Lifecycle { state: RoomState::Finished });
    }

    #[test]
    fn decode_lifecycle_from_bare_stage() {
        let event = ServerEvent::decode(r#"{"command":"set_room_state","data":"STARTING"}"#).unwrap();
        assert_eq!(event, ServerEvent::Lifecycle { state: RoomState::Starting });
    }

    #[test]
    fn decode_draft_data_reads_top_level_beer_id() {
        let event = ServerEvent::decode(
            r#"{"command":"set_form_data","beer_id":5,"data":{"color":"gold","foam":"","smell":"","taste":"","opinion":"","note":"6"}}"#,
        )
        .unwrap();

        let ServerEvent::DraftData { beer_id, draft } = event else {
            panic!("expected draft data");
        };
        assert_eq!(beer_id, Some(5));
        assert_eq!(draft.color, "gold");
        assert_eq!(draft.note, Note::new(6).ok());
    }

    #[test]
    fn decode_null_draft_as_empty() {
        let event =
            ServerEvent::decode(r#"{"command":"set_form_data","beer_id":5,"data":null}"#).unwrap();
        assert_eq!(event, ServerEvent::DraftData { beer_id: Some(5), draft: RatingDraft::default() });
    }

    #[test]
    fn decode_final_results_with_decimal_average() {
        let event = ServerEvent::decode(
            r#"{"command":"set_final_results","data":[{"beer":{"id":1,"name":"Komes","brewery":"Fortuna","style":"Porter"},"average_rating":"7.50"}]}"#,
        )
        .unwrap();

        let ServerEvent::AggregateResults(results) = event else {
            panic!("expected aggregate results");
        };
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].beer.brewery, "Fortuna");
        assert_eq!(results[0].average_rating, Some(7.5));
    }

    #[test]
    fn unknown_command_is_not_an_error() {
        let event = ServerEvent::decode(r#"{"command":"set_confetti","data":[1,2,3]}"#).unwrap();
        assert_eq!(event, ServerEvent::Unknown { command: "set_confetti".into() });
    }

    #[test]
    fn known_command_with_bad_payload_is_an_error() {
        let result = ServerEvent::decode(r#"{"command":"set_users","data":"everyone"}"#);
        assert!(matches!(result, Err(ProtocolError::InvalidPayload { command, .. }) if command == "set_users"));
    }
}
