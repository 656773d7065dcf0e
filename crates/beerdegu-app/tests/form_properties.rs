//! Property-based tests for the rating form.
//!
//! A form is driven through arbitrary activate/edit/tick/resync sequences
//! while the socket flips between accepting and dropping saves. A small model
//! tracks the last local value of every edited beer and the drafts the
//! server stored; no edited value may ever go missing.

use std::{collections::BTreeMap, time::Duration};

use beerdegu_app::{CommandDispatcher, FormState, RatingFormSession};
use beerdegu_core::Role;
use beerdegu_harness::SimInstant;
use beerdegu_proto::{BeerId, ClientCommand, DraftField, RatingDraft};
use proptest::prelude::*;

const AUTOSAVE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
enum Op {
    Activate(BeerId),
    Edit(String),
    DraftData(BeerId, String),
    Tick(Duration),
    Resync,
    Online(bool),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (1u64..5).prop_map(Op::Activate),
        4 => "[a-z]{1,6}".prop_map(Op::Edit),
        2 => (1u64..5, "[a-z]{1,6}").prop_map(|(beer_id, color)| Op::DraftData(beer_id, color)),
        3 => (0u64..8_000).prop_map(|ms| Op::Tick(Duration::from_millis(ms))),
        1 => Just(Op::Resync),
        2 => any::<bool>().prop_map(Op::Online),
    ]
}

/// Form, dispatcher and the world around them.
struct Bench {
    form: RatingFormSession<SimInstant>,
    dispatcher: CommandDispatcher,
    now: SimInstant,
    online: bool,
    /// Drafts the server stored, per beer.
    server: BTreeMap<BeerId, RatingDraft>,
    /// Last local value of every beer that was edited.
    edited: BTreeMap<BeerId, RatingDraft>,
}

impl Bench {
    fn new() -> Self {
        Self {
            form: RatingFormSession::new(AUTOSAVE),
            dispatcher: CommandDispatcher::new(Role::Participant),
            now: SimInstant::ZERO,
            online: true,
            server: BTreeMap::new(),
            edited: BTreeMap::new(),
        }
    }

    fn apply(&mut self, op: &Op) {
        match op {
            Op::Activate(beer_id) => self.form.activate(*beer_id, self.now, &mut self.dispatcher),
            Op::Edit(text) => {
                if self.form.edit(DraftField::Opinion(text.clone()))
                    && let Some(view) = self.form.view()
                {
                    self.edited.insert(view.beer_id, view.draft);
                }
            },
            Op::DraftData(beer_id, color) => {
                let draft = RatingDraft { color: color.clone(), ..RatingDraft::default() };
                self.form.handle_draft_data(Some(*beer_id), draft);
            },
            Op::Tick(step) => {
                self.now += *step;
                self.form.tick(self.now, &mut self.dispatcher);
            },
            Op::Resync => self.form.resync(&mut self.dispatcher),
            Op::Online(online) => self.online = *online,
        }
        self.deliver();
    }

    /// Hand the outbox to a socket that is up or down, the way the session
    /// flushes it.
    fn deliver(&mut self) {
        for command in self.dispatcher.take_outbox() {
            if let ClientCommand::SaveDraft { beer_id, draft } = command {
                if self.online {
                    self.server.insert(beer_id, draft);
                    self.form.save_accepted(beer_id);
                } else {
                    self.form.save_dropped(beer_id);
                }
            }
        }
    }

    /// Every edited value is stored, active, or waiting to be resent.
    fn held(&self, beer_id: BeerId, draft: &RatingDraft) -> bool {
        let stored = self.server.get(&beer_id) == Some(draft);
        let active = self.form.view().is_some_and(|view| {
            view.beer_id == beer_id && &view.draft == draft && view.state == FormState::Dirty
        });
        let pending = self.form.pending().any(|(id, pending)| id == beer_id && pending == draft);
        stored || active || pending
    }
}

proptest! {
    /// No edited value is lost at any point, whatever the socket does.
    #[test]
    fn prop_edits_are_never_lost(ops in prop::collection::vec(op_strategy(), 0..80)) {
        let mut bench = Bench::new();

        for op in &ops {
            bench.apply(op);
            for (beer_id, draft) in &bench.edited {
                prop_assert!(
                    bench.held(*beer_id, draft),
                    "beer {} lost {:?} after {:?}", beer_id, draft, op
                );
            }
        }
    }

    /// Once the socket is back, a reconnect and one autosave beat store
    /// every edit.
    #[test]
    fn prop_reconnect_stores_every_edit(ops in prop::collection::vec(op_strategy(), 0..80)) {
        let mut bench = Bench::new();
        for op in &ops {
            bench.apply(op);
        }

        bench.apply(&Op::Online(true));
        bench.apply(&Op::Resync);
        bench.apply(&Op::Tick(AUTOSAVE));

        prop_assert_eq!(bench.form.pending().count(), 0);
        for (beer_id, draft) in &bench.edited {
            prop_assert_eq!(bench.server.get(beer_id), Some(draft), "beer {}", beer_id);
        }
    }

    /// Teardown on a live socket stores every edit.
    #[test]
    fn prop_teardown_stores_every_edit(ops in prop::collection::vec(op_strategy(), 0..80)) {
        let mut bench = Bench::new();
        for op in &ops {
            bench.apply(op);
        }

        bench.online = true;
        bench.form.teardown(&mut bench.dispatcher);
        bench.deliver();

        for (beer_id, draft) in &bench.edited {
            prop_assert_eq!(bench.server.get(beer_id), Some(draft), "beer {}", beer_id);
        }
    }
}
