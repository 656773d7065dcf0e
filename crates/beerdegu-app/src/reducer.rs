//! Room snapshot and the pure reducer that folds server events into it.

use beerdegu_core::{ConnectionStatus, Role};
use beerdegu_proto::{
    AggregateResult, BeerItem, ChatMessage, Participant, RoomState, ServerEvent, UserRating,
};

use crate::form::FormView;

/// Reconciled room state at one point in time.
///
/// Consumers only ever see immutable snapshots. Every change produces a new
/// value through [`reduce`] or the session's bookkeeping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomSnapshot {
    /// Lifecycle stage, as last reported by the server.
    pub room_state: RoomState,
    /// Participants in server order.
    pub participants: Vec<Participant>,
    /// Beers loaded into the room.
    pub catalog: Vec<BeerItem>,
    /// Chat lines in arrival order. Never truncated.
    pub chat_log: Vec<ChatMessage>,
    /// Room-wide averages.
    pub aggregate_results: Vec<AggregateResult>,
    /// The caller's own ratings.
    pub user_results: Vec<UserRating>,
    /// Socket status. Derived from the connection, not domain state.
    pub connection_status: ConnectionStatus,
    /// Caller's role, fixed for the session.
    pub role: Role,
    /// Active rating form, if a beer is selected.
    pub form: Option<FormView>,
}

impl RoomSnapshot {
    /// Empty snapshot for a caller with `role`.
    pub fn new(role: Role) -> Self {
        Self { role, ..Self::default() }
    }

    /// Catalog entry by ID.
    pub fn beer(&self, id: u64) -> Option<&BeerItem> {
        self.catalog.iter().find(|beer| beer.id == id)
    }
}

/// Fold one server event into a snapshot.
///
/// Never fails. Events that do not touch room state (draft data, unknown
/// commands) return the snapshot unchanged. List updates replace the
/// previous list wholesale.
pub fn reduce(mut snapshot: RoomSnapshot, event: &ServerEvent) -> RoomSnapshot {
    match event {
        ServerEvent::ChatMessage(message) => snapshot.chat_log.push(message.clone()),
        ServerEvent::Roster(participants) => snapshot.participants.clone_from(participants),
        ServerEvent::Catalog(catalog) => snapshot.catalog.clone_from(catalog),
        ServerEvent::Lifecycle { state } => snapshot.room_state = *state,
        ServerEvent::AggregateResults(results) => snapshot.aggregate_results.clone_from(results),
        ServerEvent::UserResults(results) => snapshot.user_results.clone_from(results),
        ServerEvent::DraftData { .. } | ServerEvent::Unknown { .. } => {},
    }

    snapshot
}
