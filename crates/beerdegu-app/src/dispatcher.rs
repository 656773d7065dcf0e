//! Typed outbound command builder.
//!
//! One method per command kind. Commands land in an outbox that the session
//! drains into the connection, so the connection stays the only socket
//! writer. Dispatch is fire-and-forget: effects come back as server events.

use beerdegu_core::Role;
use beerdegu_proto::{BeerId, ClientCommand, RatingDraft, RoomState};

use crate::error::DispatchError;

/// Outbound command builder for one session.
#[derive(Debug)]
pub struct CommandDispatcher {
    role: Role,
    outbox: Vec<ClientCommand>,
    closed: bool,
    dispatched: u64,
}

impl CommandDispatcher {
    /// Dispatcher for a caller with `role`.
    pub fn new(role: Role) -> Self {
        Self { role, outbox: Vec::new(), closed: false, dispatched: 0 }
    }

    /// Post a chat line. Surrounding whitespace is kept, blank lines are not
    /// sent.
    pub fn send_chat(&mut self, text: impl Into<String>) -> Result<(), DispatchError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(DispatchError::EmptyMessage);
        }

        self.try_push(ClientCommand::SendChatMessage { text })
    }

    /// Move the room to `target`.
    ///
    /// # Errors
    ///
    /// - `NotHost` for participants.
    /// - `InvalidStageChange` unless `target` is later than `current`.
    pub fn change_stage(
        &mut self,
        current: RoomState,
        target: RoomState,
    ) -> Result<(), DispatchError> {
        if !self.role.is_host() {
            return Err(DispatchError::NotHost);
        }
        if target <= current {
            return Err(DispatchError::InvalidStageChange { from: current, to: target });
        }

        self.try_push(ClientCommand::ChangeRoomState { state: target })
    }

    /// Ask for the participant list.
    pub fn request_roster(&mut self) {
        self.push(ClientCommand::RequestRoster);
    }

    /// Ask for the beer catalog.
    pub fn request_catalog(&mut self) {
        self.push(ClientCommand::RequestCatalog);
    }

    /// Ask the server to broadcast the catalog to the whole room.
    pub fn load_catalog(&mut self) {
        self.push(ClientCommand::LoadCatalog);
    }

    /// Ask for the lifecycle stage.
    pub fn request_room_state(&mut self) {
        self.push(ClientCommand::RequestRoomState);
    }

    /// Ask for room-wide averages.
    pub fn request_aggregate_results(&mut self) {
        self.push(ClientCommand::RequestAggregateResults);
    }

    /// Ask for the caller's own ratings.
    pub fn request_user_results(&mut self) {
        self.push(ClientCommand::RequestUserResults);
    }

    /// Presence ping.
    pub fn heartbeat(&mut self) {
        self.push(ClientCommand::Heartbeat);
    }

    /// Persist a draft.
    pub fn save_draft(&mut self, beer_id: BeerId, draft: RatingDraft) {
        self.push(ClientCommand::SaveDraft { beer_id, draft });
    }

    /// Ask for the stored draft of one beer.
    pub fn request_draft(&mut self, beer_id: BeerId) {
        self.push(ClientCommand::RequestDraft { beer_id });
    }

    /// Drain queued commands in dispatch order.
    pub fn take_outbox(&mut self) -> Vec<ClientCommand> {
        std::mem::take(&mut self.outbox)
    }

    /// Refuse every further command. Queued commands stay in the outbox.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// True once [`CommandDispatcher::close`] was called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Commands accepted over the dispatcher's lifetime.
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Caller's role.
    pub fn role(&self) -> Role {
        self.role
    }

    fn push(&mut self, command: ClientCommand) {
        if let Err(error) = self.try_push(command) {
            tracing::debug!(%error, "command dropped");
        }
    }

    fn try_push(&mut self, command: ClientCommand) -> Result<(), DispatchError> {
        if self.closed {
            return Err(DispatchError::Closed);
        }

        tracing::trace!(command = command.name(), "dispatch");
        self.dispatched += 1;
        self.outbox.push(command);
        Ok(())
    }
}
