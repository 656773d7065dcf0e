//! Plain-text rendering of room events and snapshots.

use beerdegu_app::{FormState, FormView, RoomSnapshot};
use beerdegu_client::{Page, RoomSummary};
use beerdegu_proto::{AggregateResult, BeerItem, RatingDraft, ServerEvent};

/// One line per event worth showing. Draft data is shown through the form
/// view instead, and unknown commands are silent.
pub fn event(event: &ServerEvent) -> Option<String> {
    match event {
        ServerEvent::ChatMessage(message) => Some(format!("<{}> {}", message.author, message.text)),
        ServerEvent::Roster(participants) => {
            let names: Vec<&str> =
                participants.iter().map(|participant| participant.display_name.as_str()).collect();
            Some(format!("* in the room: {}", names.join(", ")))
        },
        ServerEvent::Catalog(beers) => Some(format!("* catalog has {} beers", beers.len())),
        ServerEvent::Lifecycle { state } => Some(format!("* room is now {state}")),
        ServerEvent::AggregateResults(results) => Some(aggregate(results)),
        ServerEvent::UserResults(ratings) => Some(format!("* you rated {} beers", ratings.len())),
        ServerEvent::DraftData { .. } | ServerEvent::Unknown { .. } => None,
    }
}

/// Multi-line summary of everything the session knows.
pub fn snapshot(snapshot: &RoomSnapshot) -> String {
    let mut lines = vec![format!(
        "room {} as {:?}, socket {:?}",
        snapshot.room_state, snapshot.role, snapshot.connection_status
    )];

    lines.push(format!("participants: {}", snapshot.participants.len()));
    for beer in &snapshot.catalog {
        lines.push(format!("  [{}] {}", beer.id, beer.name));
    }
    if !snapshot.aggregate_results.is_empty() {
        lines.push(aggregate(&snapshot.aggregate_results));
    }
    if let Some(view) = &snapshot.form {
        lines.push(form(view));
    }

    lines.join("\n")
}

/// The active draft.
pub fn form(view: &FormView) -> String {
    let state = match view.state {
        FormState::Idle => "idle",
        FormState::Loading => "loading",
        FormState::Ready => "saved",
        FormState::Dirty => "unsaved",
        FormState::Saving => "saving",
    };
    format!("rating beer {} ({state}): {}", view.beer_id, draft(&view.draft))
}

/// Lobby listing, one room per line.
pub fn rooms(page: &Page<RoomSummary>) -> String {
    let mut lines = vec![format!("{} rooms", page.count)];
    for room in &page.results {
        let host = room.host.as_ref().map_or("-", |host| host.username.as_str());
        let lock = if room.has_password { " (password)" } else { "" };
        lines.push(format!(
            "  {:<16} {:<12} {}/{} host {host}{lock}",
            room.name, room.state, room.users_count, room.slots
        ));
    }
    lines.join("\n")
}

/// Beer search hits, one per line, with the ID `add-beer` takes.
pub fn beers(page: &Page<BeerItem>) -> String {
    let mut lines = vec![format!("{} beers", page.count)];
    for beer in &page.results {
        lines.push(format!("  [{}] {}", beer.id, beer.name));
    }
    if page.next.is_some() {
        lines.push("  ... narrow the search to see more".to_string());
    }
    lines.join("\n")
}

fn draft(draft: &RatingDraft) -> String {
    let note = draft.note.map_or_else(|| "-".to_string(), |note| note.to_string());
    format!(
        "color={:?} foam={:?} smell={:?} taste={:?} opinion={:?} note={note}",
        draft.color, draft.foam, draft.smell, draft.taste, draft.opinion
    )
}

fn aggregate(results: &[AggregateResult]) -> String {
    let mut lines = vec!["* results:".to_string()];
    for result in results {
        let average =
            result.average_rating.map_or_else(|| "n/a".to_string(), |value| format!("{value:.2}"));
        lines.push(format!("  {} ({}): {average}", result.beer.name, result.beer.brewery));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use beerdegu_client::UserRef;
    use beerdegu_core::Role;
    use beerdegu_proto::{BeerSummary, ChatMessage, Note, Participant, RoomState};

    use super::*;

    #[test]
    fn chat_and_lifecycle_render_as_lines() {
        let chat = ServerEvent::ChatMessage(ChatMessage { author: "ola".into(), text: "hi".into() });
        assert_eq!(event(&chat).as_deref(), Some("<ola> hi"));

        let roster = ServerEvent::Roster(vec![
            Participant { id: 1, display_name: "ola".into() },
            Participant { id: 2, display_name: "kuba".into() },
        ]);
        assert_eq!(event(&roster).as_deref(), Some("* in the room: ola, kuba"));

        let lifecycle = ServerEvent::Lifecycle { state: RoomState::Finished };
        assert_eq!(event(&lifecycle).as_deref(), Some("* room is now FINISHED"));
    }

    #[test]
    fn silent_events() {
        let draft = ServerEvent::DraftData { beer_id: Some(1), draft: RatingDraft::default() };
        assert_eq!(event(&draft), None);
        assert_eq!(event(&ServerEvent::Unknown { command: "x".into() }), None);
    }

    #[test]
    fn snapshot_summary() {
        let mut room = RoomSnapshot::new(Role::Host);
        room.room_state = RoomState::InProgress;
        room.catalog = vec![BeerItem::new(3, "Porter"), BeerItem::new(5, "Lager")];
        room.aggregate_results = vec![AggregateResult {
            beer: BeerSummary {
                name: "Porter".into(),
                brewery: "Pinta".into(),
                style: "Baltic".into(),
            },
            average_rating: Some(7.5),
        }];
        room.form = Some(FormView {
            beer_id: 3,
            state: FormState::Dirty,
            draft: RatingDraft { taste: "roasty".into(), note: Note::new(8).ok(), ..Default::default() },
        });

        insta::assert_snapshot!(snapshot(&room), @r#"
        room IN_PROGRESS as Host, socket Connecting
        participants: 0
          [3] Porter
          [5] Lager
        * results:
          Porter (Pinta): 7.50
        rating beer 3 (unsaved): color="" foam="" smell="" taste="roasty" opinion="" note=8
        "#);
    }

    #[test]
    fn lobby_listing() {
        let page = Page {
            count: 2,
            next: None,
            previous: None,
            results: vec![
                RoomSummary {
                    id: 1,
                    name: "ABCD".into(),
                    has_password: true,
                    host: Some(UserRef { id: 7, username: "ola".into() }),
                    slots: 4,
                    state: RoomState::Waiting,
                    users_count: 1,
                },
                RoomSummary {
                    id: 2,
                    name: "stouts".into(),
                    has_password: false,
                    host: None,
                    slots: 8,
                    state: RoomState::Finished,
                    users_count: 8,
                },
            ],
        };

        insta::assert_snapshot!(rooms(&page), @r"
        2 rooms
          ABCD             WAITING      1/4 host ola (password)
          stouts           FINISHED     8/8 host -
        ");
    }

    #[test]
    fn beer_search_listing() {
        let page = Page {
            count: 12,
            next: Some("http://127.0.0.1:8000/api/beers/?page=2&search=porter".into()),
            previous: None,
            results: vec![BeerItem::new(4, "Komes Porter"), BeerItem::new(11, "Baltic Porter")],
        };

        insta::assert_snapshot!(beers(&page), @r"
        12 beers
          [4] Komes Porter
          [11] Baltic Porter
          ... narrow the search to see more
        ");
    }
}
