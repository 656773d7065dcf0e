//! Reducer invariants.

use beerdegu_proto::ServerEvent;

use super::{Invariant, InvariantResult, Step, Violation};

fn violation(invariant: &'static str, message: String) -> InvariantResult {
    Err(Violation { invariant, message })
}

/// The chat log only grows, by exactly one line per chat event, and keeps
/// its prefix.
pub struct ChatLogAppendOnly;

impl Invariant for ChatLogAppendOnly {
    fn name(&self) -> &'static str {
        "ChatLogAppendOnly"
    }

    fn check(&self, step: &Step<'_>) -> InvariantResult {
        let before = &step.before.chat_log;
        let after = &step.after.chat_log;

        if !after.starts_with(before) {
            return violation(self.name(), "existing chat lines changed".into());
        }

        let expected = match step.event {
            ServerEvent::ChatMessage(message) => {
                if after.last() != Some(message) {
                    return violation(self.name(), "new line is not at the end".into());
                }
                before.len() + 1
            },
            _ => before.len(),
        };
        if after.len() != expected {
            return violation(
                self.name(),
                format!("expected {expected} lines, found {}", after.len()),
            );
        }
        Ok(())
    }
}

/// List updates replace the list with exactly the payload. Other lists are
/// untouched.
pub struct ListsReplacedWholesale;

impl Invariant for ListsReplacedWholesale {
    fn name(&self) -> &'static str {
        "ListsReplacedWholesale"
    }

    fn check(&self, step: &Step<'_>) -> InvariantResult {
        let (before, after) = (step.before, step.after);

        let participants_ok = match step.event {
            ServerEvent::Roster(payload) => &after.participants == payload,
            _ => after.participants == before.participants,
        };
        let catalog_ok = match step.event {
            ServerEvent::Catalog(payload) => &after.catalog == payload,
            _ => after.catalog == before.catalog,
        };
        let aggregate_ok = match step.event {
            ServerEvent::AggregateResults(payload) => &after.aggregate_results == payload,
            _ => after.aggregate_results == before.aggregate_results,
        };
        let user_ok = match step.event {
            ServerEvent::UserResults(payload) => &after.user_results == payload,
            _ => after.user_results == before.user_results,
        };

        if participants_ok && catalog_ok && aggregate_ok && user_ok {
            Ok(())
        } else {
            violation(
                self.name(),
                format!(
                    "{} left lists inconsistent (participants: {participants_ok}, catalog: \
                     {catalog_ok}, aggregate: {aggregate_ok}, user: {user_ok})",
                    step.event.command()
                ),
            )
        }
    }
}

/// Only lifecycle events move the stage, and always to their payload.
pub struct StageFollowsLifecycle;

impl Invariant for StageFollowsLifecycle {
    fn name(&self) -> &'static str {
        "StageFollowsLifecycle"
    }

    fn check(&self, step: &Step<'_>) -> InvariantResult {
        let expected = match step.event {
            ServerEvent::Lifecycle { state } => *state,
            _ => step.before.room_state,
        };

        if step.after.room_state == expected {
            Ok(())
        } else {
            violation(
                self.name(),
                format!(
                    "{} moved stage {} -> {}, expected {expected}",
                    step.event.command(),
                    step.before.room_state,
                    step.after.room_state
                ),
            )
        }
    }
}

/// Draft data and unknown commands leave the snapshot unchanged.
pub struct NoOpEventsPreserveSnapshot;

impl Invariant for NoOpEventsPreserveSnapshot {
    fn name(&self) -> &'static str {
        "NoOpEventsPreserveSnapshot"
    }

    fn check(&self, step: &Step<'_>) -> InvariantResult {
        match step.event {
            ServerEvent::DraftData { .. } | ServerEvent::Unknown { .. }
                if step.after != step.before =>
            {
                violation(self.name(), format!("{} changed the snapshot", step.event.command()))
            },
            _ => Ok(()),
        }
    }
}
