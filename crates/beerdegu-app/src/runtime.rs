//! Generic runtime for room session orchestration.
//!
//! One task owns the [`RoomSession`] and is the only place it is mutated.
//! It multiplexes driver events, intents from [`RoomHandle`]s and a tick
//! interval with `tokio::select!`, so every state change runs to completion
//! before the next input is looked at.

use std::{sync::Arc, time::Duration};

use beerdegu_core::{ConnectionAction, RoomEndpoint, Role};
use beerdegu_proto::{BeerId, DraftField, RoomState, ServerEvent};
use tokio::{
    sync::{broadcast, mpsc, oneshot, watch},
    time::MissedTickBehavior,
};

use crate::{
    Driver, SessionConfig,
    error::{DispatchError, RuntimeError},
    reducer::RoomSnapshot,
    session::{RoomSession, SessionEvent},
};

type Reply = oneshot::Sender<Result<(), DispatchError>>;

#[derive(Debug)]
enum Intent {
    SendChat { text: String, reply: Reply },
    ChangeStage { target: RoomState, reply: Reply },
    RefreshCatalog,
    ActivateBeer(BeerId),
    EditDraft(DraftField),
    Leave,
}

/// Drives one [`RoomSession`] over a [`Driver`].
pub struct Runtime<D: Driver> {
    driver: D,
    session: RoomSession<D::Instant>,
    intents: mpsc::Receiver<Intent>,
    tick_interval: Duration,
}

impl<D: Driver> std::fmt::Debug for Runtime<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("tick_interval", &self.tick_interval)
            .finish_non_exhaustive()
    }
}

impl<D: Driver> Runtime<D> {
    /// Create a runtime and the first handle to it.
    ///
    /// Nothing happens until [`Runtime::run`] is polled.
    pub fn new(
        driver: D,
        endpoint: RoomEndpoint,
        role: Role,
        config: SessionConfig,
    ) -> (Self, RoomHandle) {
        let session = RoomSession::new(endpoint, role, config);
        let (intent_tx, intents) = mpsc::channel(config.intent_capacity.max(1));

        let handle = RoomHandle {
            intents: intent_tx,
            snapshots: session.subscribe(),
            events: session.events(),
        };
        let runtime = Self { driver, session, intents, tick_interval: config.tick_interval };

        (runtime, handle)
    }

    /// Run until the socket is closed for good.
    ///
    /// That happens after [`RoomHandle::leave`], after every handle was
    /// dropped, or once reconnect attempts are exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver itself fails.
    pub async fn run(mut self) -> Result<(), D::Error> {
        let actions = self.session.start();
        self.execute(actions).await?;

        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut intents_open = true;

        while !self.session.is_finished() {
            tokio::select! {
                event = self.driver.next_event() => {
                    let Some(event) = event else {
                        tracing::warn!("driver stopped producing events");
                        break;
                    };
                    let now = self.driver.now();
                    let actions = self.session.handle(event, now);
                    self.execute(actions).await?;
                },
                intent = self.intents.recv(), if intents_open => {
                    let intent = match intent {
                        Some(intent) => intent,
                        None => {
                            tracing::debug!("all room handles dropped");
                            intents_open = false;
                            Intent::Leave
                        },
                    };
                    let actions = self.apply(intent);
                    self.execute(actions).await?;
                },
                _ = ticker.tick() => {
                    let now = self.driver.now();
                    let actions = self.session.handle(SessionEvent::Tick, now);
                    self.execute(actions).await?;
                },
            }
        }

        tracing::debug!(dispatched = self.session.dispatched(), "room runtime stopped");
        Ok(())
    }

    fn apply(&mut self, intent: Intent) -> Vec<ConnectionAction> {
        match intent {
            Intent::SendChat { text, reply } => respond(reply, self.session.send_chat(text)),
            Intent::ChangeStage { target, reply } => {
                respond(reply, self.session.change_stage(target))
            },
            Intent::RefreshCatalog => self.session.refresh_catalog(),
            Intent::ActivateBeer(beer_id) => {
                let now = self.driver.now();
                self.session.activate_beer(beer_id, now)
            },
            Intent::EditDraft(field) => {
                if !self.session.edit_draft(field) {
                    tracing::debug!("edit ignored, no beer selected");
                }
                Vec::new()
            },
            Intent::Leave => self.session.teardown(),
        }
    }

    async fn execute(&mut self, actions: Vec<ConnectionAction>) -> Result<(), D::Error> {
        for action in actions {
            match action {
                ConnectionAction::Dial { url } => self.driver.dial(&url).await?,
                ConnectionAction::SendText(text) => self.driver.send_text(text).await?,
                ConnectionAction::Disconnect => self.driver.disconnect().await?,
            }
        }
        Ok(())
    }
}

fn respond(
    reply: Reply,
    result: Result<Vec<ConnectionAction>, DispatchError>,
) -> Vec<ConnectionAction> {
    let (actions, outcome) = match result {
        Ok(actions) => (actions, Ok(())),
        Err(error) => (Vec::new(), Err(error)),
    };
    // The caller may have stopped waiting.
    let _ = reply.send(outcome);
    actions
}

/// Cloneable access to a running room session.
///
/// Every UI subtree gets its own handle. All of them share the one session
/// and socket owned by the [`Runtime`].
#[derive(Debug)]
pub struct RoomHandle {
    intents: mpsc::Sender<Intent>,
    snapshots: watch::Receiver<Arc<RoomSnapshot>>,
    events: broadcast::Receiver<ServerEvent>,
}

impl Clone for RoomHandle {
    fn clone(&self) -> Self {
        Self {
            intents: self.intents.clone(),
            snapshots: self.snapshots.clone(),
            events: self.events.resubscribe(),
        }
    }
}

impl RoomHandle {
    /// Latest snapshot.
    pub fn snapshot(&self) -> Arc<RoomSnapshot> {
        Arc::clone(&self.snapshots.borrow())
    }

    /// Snapshot stream. Keeps the last snapshot readable after the session
    /// ends.
    pub fn subscribe(&self) -> watch::Receiver<Arc<RoomSnapshot>> {
        self.snapshots.clone()
    }

    /// Every decoded inbound event from now on.
    pub fn events(&self) -> broadcast::Receiver<ServerEvent> {
        self.events.resubscribe()
    }

    /// Post a chat line.
    pub async fn send_chat(&self, text: impl Into<String>) -> Result<(), RuntimeError> {
        let text = text.into();
        self.request(|reply| Intent::SendChat { text, reply }).await
    }

    /// Move the room to `target`. Host only.
    pub async fn change_stage(&self, target: RoomState) -> Result<(), RuntimeError> {
        self.request(|reply| Intent::ChangeStage { target, reply }).await
    }

    /// Ask the server to rebroadcast the catalog.
    pub async fn refresh_catalog(&self) -> Result<(), RuntimeError> {
        self.send(Intent::RefreshCatalog).await
    }

    /// Start rating `beer_id`.
    pub async fn activate_beer(&self, beer_id: BeerId) -> Result<(), RuntimeError> {
        self.send(Intent::ActivateBeer(beer_id)).await
    }

    /// Edit one field of the active draft.
    pub async fn edit_draft(&self, field: DraftField) -> Result<(), RuntimeError> {
        self.send(Intent::EditDraft(field)).await
    }

    /// Leave the room: flush the draft, stop timers, close the socket.
    pub async fn leave(&self) -> Result<(), RuntimeError> {
        self.send(Intent::Leave).await
    }

    /// Resolves once the runtime has stopped.
    pub async fn closed(&self) {
        self.intents.closed().await;
    }

    async fn send(&self, intent: Intent) -> Result<(), RuntimeError> {
        self.intents.send(intent).await.map_err(|_| RuntimeError::SessionEnded)
    }

    async fn request(&self, intent: impl FnOnce(Reply) -> Intent) -> Result<(), RuntimeError> {
        let (reply, response) = oneshot::channel();
        self.send(intent(reply)).await?;
        response.await.map_err(|_| RuntimeError::SessionEnded)?.map_err(RuntimeError::from)
    }
}
