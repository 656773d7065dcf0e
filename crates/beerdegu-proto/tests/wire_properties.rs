//! Property-based tests for the wire schema.
//!
//! These verify that command framing and event decoding hold for ALL valid
//! inputs, not just the handful of examples in the unit tests.

use beerdegu_proto::{
    ChatMessage, ClientCommand, Envelope, Note, Participant, RatingDraft, RoomState, ServerEvent,
};
use proptest::prelude::*;

fn arbitrary_room_state() -> impl Strategy<Value = RoomState> {
    prop_oneof![
        Just(RoomState::Waiting),
        Just(RoomState::Starting),
        Just(RoomState::InProgress),
        Just(RoomState::Finished),
    ]
}

fn arbitrary_draft() -> impl Strategy<Value = RatingDraft> {
    (".{0,20}", ".{0,20}", ".{0,20}", ".{0,20}", ".{0,40}", proptest::option::of(1u8..=10)).prop_map(
        |(color, foam, smell, taste, opinion, note)| RatingDraft {
            color,
            foam,
            smell,
            taste,
            opinion,
            note: note.and_then(|n| Note::new(n).ok()),
        },
    )
}

fn arbitrary_command() -> impl Strategy<Value = ClientCommand> {
    prop_oneof![
        ".{0,64}".prop_map(|text| ClientCommand::SendChatMessage { text }),
        Just(ClientCommand::RequestRoster),
        Just(ClientCommand::RequestCatalog),
        Just(ClientCommand::LoadCatalog),
        Just(ClientCommand::RequestRoomState),
        arbitrary_room_state().prop_map(|state| ClientCommand::ChangeRoomState { state }),
        Just(ClientCommand::RequestAggregateResults),
        Just(ClientCommand::RequestUserResults),
        Just(ClientCommand::Heartbeat),
        (any::<u32>(), arbitrary_draft()).prop_map(|(beer_id, draft)| ClientCommand::SaveDraft {
            beer_id: u64::from(beer_id),
            draft
        }),
        any::<u32>().prop_map(|beer_id| ClientCommand::RequestDraft { beer_id: u64::from(beer_id) }),
    ]
}

proptest! {
    #[test]
    fn prop_command_frames_decode_to_same_command(command in arbitrary_command()) {
        let text = command.encode().expect("encode should succeed");
        let decoded = ClientCommand::decode(&text).expect("decode should succeed");

        prop_assert_eq!(decoded, command);
    }

    #[test]
    fn prop_unrecognized_commands_decode_to_unknown(
        name in "[a-z_]{1,24}",
        payload in proptest::option::of(any::<i64>()),
    ) {
        prop_assume!(!name.starts_with("set_"));

        let mut envelope = Envelope::bare(name.clone());
        if let Some(value) = payload {
            envelope.data = value.into();
        }
        let text = envelope.encode().expect("encode should succeed");

        let event = ServerEvent::decode(&text).expect("unknown commands must not fail");
        prop_assert_eq!(event, ServerEvent::Unknown { command: name });
    }

    #[test]
    fn prop_roster_decodes_verbatim(users in prop::collection::vec((any::<u32>(), "[a-z]{1,12}"), 0..20)) {
        let roster: Vec<Participant> = users
            .into_iter()
            .map(|(id, name)| Participant { id: u64::from(id), display_name: name })
            .collect();
        let text = ServerEvent::Roster(roster.clone()).encode().expect("encode should succeed");

        prop_assert_eq!(ServerEvent::decode(&text).expect("decode"), ServerEvent::Roster(roster));
    }

    #[test]
    fn prop_chat_text_survives_framing(author in "[a-z]{1,12}", text in ".{0,128}") {
        let message = ChatMessage { author, text };
        let frame = ServerEvent::ChatMessage(message.clone()).encode().expect("encode");

        prop_assert_eq!(ServerEvent::decode(&frame).expect("decode"), ServerEvent::ChatMessage(message));
    }
}
