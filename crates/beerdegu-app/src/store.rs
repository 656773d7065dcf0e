//! Observable room store.
//!
//! One authoritative [`RoomSnapshot`] behind a `watch` channel. Writers go
//! through [`RoomStore::dispatch`] and friends; readers subscribe and get
//! immutable `Arc` snapshots.

use std::sync::Arc;

use beerdegu_core::{ConnectionStatus, Role};
use beerdegu_proto::ServerEvent;
use tokio::sync::watch;

use crate::{
    form::FormView,
    reducer::{RoomSnapshot, reduce},
};

/// Single-writer, many-reader room state.
#[derive(Debug)]
pub struct RoomStore {
    tx: watch::Sender<Arc<RoomSnapshot>>,
}

impl RoomStore {
    /// Store with an empty snapshot for `role`.
    pub fn new(role: Role) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(RoomSnapshot::new(role)));
        Self { tx }
    }

    /// Fold a server event into the snapshot.
    ///
    /// Returns `true` if the snapshot changed. Subscribers are only woken on
    /// change.
    pub fn dispatch(&self, event: &ServerEvent) -> bool {
        self.update(|snapshot| reduce(snapshot, event))
    }

    /// Record the socket status.
    pub fn set_connection_status(&self, status: ConnectionStatus) -> bool {
        self.update(|mut snapshot| {
            snapshot.connection_status = status;
            snapshot
        })
    }

    /// Record the active rating form.
    pub fn set_form(&self, form: Option<FormView>) -> bool {
        self.update(|mut snapshot| {
            snapshot.form = form;
            snapshot
        })
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<RoomSnapshot> {
        Arc::clone(&self.tx.borrow())
    }

    /// Receiver that sees every future snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<RoomSnapshot>> {
        self.tx.subscribe()
    }

    fn update(&self, f: impl FnOnce(RoomSnapshot) -> RoomSnapshot) -> bool {
        self.tx.send_if_modified(|current| {
            let next = f((**current).clone());
            if next == **current {
                false
            } else {
                *current = Arc::new(next);
                true
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use beerdegu_proto::{ChatMessage, RoomState};

    use super::*;

    #[test]
    fn subscribers_see_new_snapshots() {
        let store = RoomStore::new(Role::Participant);
        let mut rx = store.subscribe();
        let before = store.snapshot();

        assert!(store.dispatch(&ServerEvent::Lifecycle { state: RoomState::Starting }));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().room_state, RoomState::Starting);

        // Old snapshots held by readers are never mutated.
        assert_eq!(before.room_state, RoomState::Waiting);
    }

    #[test]
    fn unchanged_snapshot_does_not_notify() {
        let store = RoomStore::new(Role::Participant);
        let mut rx = store.subscribe();
        let _ = rx.borrow_and_update();

        assert!(!store.dispatch(&ServerEvent::Unknown { command: "set_x".into() }));
        assert!(!store.set_connection_status(ConnectionStatus::Connecting));
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn chat_updates_are_visible() {
        let store = RoomStore::new(Role::Host);
        let message = ChatMessage { author: "ola".into(), text: "hej".into() };

        store.dispatch(&ServerEvent::ChatMessage(message.clone()));
        store.set_connection_status(ConnectionStatus::Open);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.chat_log, vec![message]);
        assert_eq!(snapshot.connection_status, ConnectionStatus::Open);
        assert!(snapshot.role.is_host());
    }
}
