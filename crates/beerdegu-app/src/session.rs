//! Room session: one connection, one store, and the components riding on
//! them.
//!
//! Sans-IO. Socket events and timer ticks go in through
//! [`RoomSession::handle`], user intents through the intent methods, and
//! [`ConnectionAction`]s come out for the driver. Outbound commands always
//! flow dispatcher → connection; nothing else writes to the socket.

use std::{ops::Sub, sync::Arc, time::Duration};

use beerdegu_core::{
    CloseKind, Connection, ConnectionAction, ConnectionStatus, Opened, RoomEndpoint, Role,
};
use beerdegu_proto::{BeerId, ClientCommand, DraftField, RoomState, ServerEvent};
use tokio::sync::{broadcast, watch};

use crate::{
    config::SessionConfig, dispatcher::CommandDispatcher, error::DispatchError,
    form::RatingFormSession, reducer::RoomSnapshot, scheduler::PeriodicScheduler,
    store::RoomStore,
};

/// Inputs from the driver and the clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Socket handshake completed.
    Opened,
    /// Socket closed or a dial failed.
    Closed(CloseKind),
    /// One inbound text frame.
    Frame(String),
    /// Timer tick.
    Tick,
}

/// Controller for one mounted room view.
pub struct RoomSession<I> {
    connection: Connection<I>,
    store: RoomStore,
    dispatcher: CommandDispatcher,
    scheduler: PeriodicScheduler<I>,
    form: RatingFormSession<I>,
    events: broadcast::Sender<ServerEvent>,
    torn_down: bool,
}

impl<I> RoomSession<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Session for `endpoint` with the caller's `role`. Nothing is dialed
    /// until [`RoomSession::start`].
    pub fn new(endpoint: RoomEndpoint, role: Role, config: SessionConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));

        Self {
            connection: Connection::new(endpoint, config.connection),
            store: RoomStore::new(role),
            dispatcher: CommandDispatcher::new(role),
            scheduler: PeriodicScheduler::new(config.heartbeat_interval, config.roster_interval),
            form: RatingFormSession::new(config.autosave_interval),
            events,
            torn_down: false,
        }
    }

    /// Dial the room.
    pub fn start(&mut self) -> Vec<ConnectionAction> {
        self.connection.start()
    }

    /// Feed one driver or clock event.
    pub fn handle(&mut self, event: SessionEvent, now: I) -> Vec<ConnectionAction> {
        let mut actions = Vec::new();

        match event {
            SessionEvent::Opened => match self.connection.handle_opened() {
                Ok(opened) => self.on_opened(opened, now),
                Err(error) => tracing::warn!(%error, "unexpected open"),
            },
            SessionEvent::Closed(kind) => {
                let status = self.connection.handle_closed(kind, now);
                if status == ConnectionStatus::Closed {
                    self.scheduler.stop();
                }
            },
            SessionEvent::Frame(text) => {
                if let Some(event) = self.connection.decode(&text) {
                    self.apply(event);
                }
            },
            SessionEvent::Tick => {
                actions.extend(self.connection.tick(now));
                if self.connection.is_open() {
                    self.scheduler.tick(now, &mut self.dispatcher);
                    self.form.tick(now, &mut self.dispatcher);
                }
            },
        }

        actions.extend(self.flush());
        self.publish();
        actions
    }

    /// Post a chat line.
    pub fn send_chat(
        &mut self,
        text: impl Into<String>,
    ) -> Result<Vec<ConnectionAction>, DispatchError> {
        self.dispatcher.send_chat(text)?;
        Ok(self.flush())
    }

    /// Move the room forward to `target`. Host only.
    pub fn change_stage(
        &mut self,
        target: RoomState,
    ) -> Result<Vec<ConnectionAction>, DispatchError> {
        let current = self.store.snapshot().room_state;
        self.dispatcher.change_stage(current, target)?;
        Ok(self.flush())
    }

    /// Ask the server to rebroadcast the catalog, e.g. after the host added
    /// or removed a beer over REST.
    pub fn refresh_catalog(&mut self) -> Vec<ConnectionAction> {
        self.dispatcher.load_catalog();
        self.flush()
    }

    /// Start rating `beer_id`, flushing the previous draft if needed.
    pub fn activate_beer(&mut self, beer_id: BeerId, now: I) -> Vec<ConnectionAction> {
        self.form.activate(beer_id, now, &mut self.dispatcher);
        let actions = self.flush();
        self.publish();
        actions
    }

    /// Apply one local edit to the active draft.
    pub fn edit_draft(&mut self, field: DraftField) -> bool {
        let accepted = self.form.edit(field);
        self.publish();
        accepted
    }

    /// Tear the session down: cancel timers, flush a dirty draft, close the
    /// socket. Idempotent. Nothing is sent afterwards.
    pub fn teardown(&mut self) -> Vec<ConnectionAction> {
        if self.torn_down {
            return Vec::new();
        }
        self.torn_down = true;
        tracing::info!(room = self.connection.endpoint().room_code(), "leaving room");

        self.scheduler.stop();
        self.form.teardown(&mut self.dispatcher);
        let mut actions = self.flush();
        self.dispatcher.close();
        actions.extend(self.connection.close());
        self.publish();
        actions
    }

    /// True once the connection is closed for good.
    pub fn is_finished(&self) -> bool {
        self.connection.status() == ConnectionStatus::Closed
    }

    /// True after [`RoomSession::teardown`].
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<RoomSnapshot> {
        self.store.snapshot()
    }

    /// Snapshot stream.
    pub fn subscribe(&self) -> watch::Receiver<Arc<RoomSnapshot>> {
        self.store.subscribe()
    }

    /// Fan-out of every decoded inbound event.
    pub fn events(&self) -> broadcast::Receiver<ServerEvent> {
        self.events.subscribe()
    }

    /// Commands accepted by the dispatcher so far.
    pub fn dispatched(&self) -> u64 {
        self.dispatcher.dispatched()
    }

    fn on_opened(&mut self, opened: Opened, now: I) {
        self.scheduler.start(now);

        // The server pushes roster and stage on connect. After a drop, frames
        // in flight were lost, so pull everything again.
        if opened.reconnected {
            tracing::info!("resynchronizing room after reconnect");
            self.dispatcher.request_room_state();
            self.dispatcher.request_roster();
            self.dispatcher.request_catalog();
            self.form.resync(&mut self.dispatcher);
        }
    }

    fn apply(&mut self, event: ServerEvent) {
        if let ServerEvent::DraftData { beer_id, draft } = &event {
            self.form.handle_draft_data(*beer_id, draft.clone());
        }
        if let ServerEvent::Unknown { command } = &event {
            tracing::debug!(command, "ignoring unknown event");
        }

        let previous = self.store.snapshot().room_state;
        self.store.dispatch(&event);
        let current = self.store.snapshot().room_state;
        self.scheduler.observe_stage(previous, current, &mut self.dispatcher);

        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn flush(&mut self) -> Vec<ConnectionAction> {
        let mut actions = Vec::new();

        for command in self.dispatcher.take_outbox() {
            let action = self.connection.send_command(&command);
            if let ClientCommand::SaveDraft { beer_id, .. } = command {
                if action.is_some() {
                    self.form.save_accepted(beer_id);
                } else {
                    self.form.save_dropped(beer_id);
                }
            }
            actions.extend(action);
        }

        actions
    }

    fn publish(&self) {
        self.store.set_connection_status(self.connection.status());
        self.store.set_form(self.form.view());
    }
}
