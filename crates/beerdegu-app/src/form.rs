//! Rating form session.
//!
//! Tracks the one draft the participant is working on.
//!
//! ```text
//! Idle ──activate──> Loading ──draft data──> Ready ──edit──> Dirty
//!                       │                      ^               │
//!                       └──────edit────────────┼───────> Dirty │ autosave
//!                                              │               v
//!                                              └─accepted── Saving
//! ```
//!
//! Local edits are applied immediately. Only the network flush is
//! throttled, by the autosave interval. Switching beers flushes a dirty
//! draft before the next one is requested. That draft is kept as pending
//! until the socket takes the save, and is resent on autosave ticks and on
//! resync. Switching back to a beer with a pending save resumes its local
//! edits instead of loading the stored draft.

use std::{collections::BTreeMap, ops::Sub, time::Duration};

use beerdegu_proto::{BeerId, DraftField, RatingDraft};

use crate::dispatcher::CommandDispatcher;

/// Where the active draft is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormState {
    /// No beer selected.
    Idle,
    /// Waiting for the server's stored draft.
    Loading,
    /// Local draft matches what was last sent or loaded.
    Ready,
    /// Local edits not yet sent.
    Dirty,
    /// Save handed to the socket.
    Saving,
}

/// Read-only view of the active draft for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormView {
    /// Beer being rated.
    pub beer_id: BeerId,
    /// Draft lifecycle state.
    pub state: FormState,
    /// Current field values.
    pub draft: RatingDraft,
}

#[derive(Debug, Clone)]
struct ActiveDraft<I> {
    beer_id: BeerId,
    state: FormState,
    draft: RatingDraft,
    last_autosave: I,
}

/// Draft session for the beer currently being rated.
#[derive(Debug, Clone)]
pub struct RatingFormSession<I> {
    autosave_interval: Duration,
    active: Option<ActiveDraft<I>>,
    pending: BTreeMap<BeerId, RatingDraft>,
    closed: bool,
}

impl<I> RatingFormSession<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Idle session.
    pub fn new(autosave_interval: Duration) -> Self {
        Self { autosave_interval, active: None, pending: BTreeMap::new(), closed: false }
    }

    /// Switch to `beer_id`.
    ///
    /// A dirty draft for the previous beer is saved first and held as
    /// pending until the socket accepts it, then the new beer's draft is
    /// requested. Re-activating the current beer is a no-op.
    pub fn activate(&mut self, beer_id: BeerId, now: I, dispatcher: &mut CommandDispatcher) {
        if self.closed {
            return;
        }
        if self.active.as_ref().is_some_and(|active| active.beer_id == beer_id) {
            return;
        }

        if let Some(previous) = self.active.take()
            && matches!(previous.state, FormState::Dirty | FormState::Saving)
        {
            tracing::debug!(beer_id = previous.beer_id, "flushing draft before switch");
            self.pending.insert(previous.beer_id, previous.draft.clone());
            dispatcher.save_draft(previous.beer_id, previous.draft);
        }

        if let Some(draft) = self.pending.remove(&beer_id) {
            tracing::debug!(beer_id, "resuming unsaved draft");
            self.active =
                Some(ActiveDraft { beer_id, state: FormState::Dirty, draft, last_autosave: now });
            return;
        }

        dispatcher.request_draft(beer_id);
        self.active = Some(ActiveDraft {
            beer_id,
            state: FormState::Loading,
            draft: RatingDraft::default(),
            last_autosave: now,
        });
    }

    /// Apply one local edit. Returns `false` if no beer is active.
    pub fn edit(&mut self, field: DraftField) -> bool {
        match self.active.as_mut() {
            Some(active) if !self.closed => {
                active.draft.apply(field);
                active.state = FormState::Dirty;
                true
            },
            _ => false,
        }
    }

    /// Server delivered a stored draft.
    ///
    /// Only accepted while the matching beer is loading. A draft that arrives
    /// after local edits started is ignored so local input wins. Responses
    /// without a beer ID are attributed to the loading beer.
    pub fn handle_draft_data(&mut self, beer_id: Option<BeerId>, draft: RatingDraft) -> bool {
        let Some(active) = self.active.as_mut() else {
            return false;
        };

        if beer_id.is_some_and(|id| id != active.beer_id) {
            tracing::debug!(?beer_id, active = active.beer_id, "ignoring draft for another beer");
            return false;
        }
        if active.state != FormState::Loading {
            tracing::debug!(beer_id = active.beer_id, state = ?active.state, "ignoring late draft");
            return false;
        }

        active.draft = draft;
        active.state = FormState::Ready;
        true
    }

    /// Autosave a dirty draft once the interval has elapsed. Pending saves
    /// from earlier beers are retried on the same beat.
    pub fn tick(&mut self, now: I, dispatcher: &mut CommandDispatcher) {
        if self.closed {
            return;
        }
        let Some(active) = self.active.as_mut() else {
            return;
        };
        if now - active.last_autosave < self.autosave_interval {
            return;
        }

        active.last_autosave = now;
        if active.state == FormState::Dirty {
            active.state = FormState::Saving;
            dispatcher.save_draft(active.beer_id, active.draft.clone());
        }
        self.resend_pending(dispatcher);
    }

    /// The socket accepted a save for `beer_id`.
    pub fn save_accepted(&mut self, beer_id: BeerId) {
        if self.pending.remove(&beer_id).is_some() {
            tracing::debug!(beer_id, "pending draft saved");
        }
        if let Some(active) = self.active.as_mut()
            && active.beer_id == beer_id
            && active.state == FormState::Saving
        {
            active.state = FormState::Ready;
        }
    }

    /// A save for `beer_id` was dropped. The draft stays dirty so the next
    /// autosave retries with the latest values. A pending draft for an
    /// earlier beer stays pending.
    pub fn save_dropped(&mut self, beer_id: BeerId) {
        tracing::warn!(beer_id, "draft save dropped, will retry");
        if let Some(active) = self.active.as_mut()
            && active.beer_id == beer_id
            && active.state == FormState::Saving
        {
            active.state = FormState::Dirty;
        }
    }

    /// Socket came back after a drop.
    ///
    /// Resends pending saves, then re-requests the stored draft unless there
    /// are local edits to keep. An in-flight save is treated as lost.
    pub fn resync(&mut self, dispatcher: &mut CommandDispatcher) {
        if self.closed {
            return;
        }
        self.resend_pending(dispatcher);
        let Some(active) = self.active.as_mut() else {
            return;
        };

        match active.state {
            FormState::Loading | FormState::Ready => {
                active.state = FormState::Loading;
                dispatcher.request_draft(active.beer_id);
            },
            FormState::Saving => active.state = FormState::Dirty,
            FormState::Dirty | FormState::Idle => {},
        }
    }

    /// Final best-effort flush. The session accepts nothing afterwards.
    pub fn teardown(&mut self, dispatcher: &mut CommandDispatcher) {
        if self.closed {
            return;
        }
        self.resend_pending(dispatcher);
        self.pending.clear();
        if let Some(active) = self.active.take()
            && matches!(active.state, FormState::Dirty | FormState::Saving)
        {
            tracing::debug!(beer_id = active.beer_id, "flushing draft on teardown");
            dispatcher.save_draft(active.beer_id, active.draft);
        }
        self.closed = true;
    }

    /// Snapshot of the active draft.
    pub fn view(&self) -> Option<FormView> {
        self.active.as_ref().map(|active| FormView {
            beer_id: active.beer_id,
            state: active.state,
            draft: active.draft.clone(),
        })
    }

    /// Current state, `Idle` when no beer is active.
    pub fn state(&self) -> FormState {
        self.active.as_ref().map_or(FormState::Idle, |active| active.state)
    }

    /// Drafts of earlier beers whose save the socket has not taken yet.
    pub fn pending(&self) -> impl Iterator<Item = (BeerId, &RatingDraft)> {
        self.pending.iter().map(|(beer_id, draft)| (*beer_id, draft))
    }

    fn resend_pending(&self, dispatcher: &mut CommandDispatcher) {
        for (beer_id, draft) in &self.pending {
            tracing::debug!(beer_id, "retrying pending draft");
            dispatcher.save_draft(*beer_id, draft.clone());
        }
    }
}
