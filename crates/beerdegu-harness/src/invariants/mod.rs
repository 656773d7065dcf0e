//! Invariant checking for reducer steps.
//!
//! Invariants are properties that must hold for every (snapshot, event)
//! pair, not just the scenarios a test author thought of. A [`Step`] captures
//! one reducer application; an [`InvariantRegistry`] runs every registered
//! [`Invariant`] against it.
//!
//! # Usage
//!
//! ```ignore
//! let after = InvariantRegistry::standard().reduce_checked(&before, &event)?;
//! ```

mod checks;

use beerdegu_app::{RoomSnapshot, reduce};
use beerdegu_proto::ServerEvent;
use thiserror::Error;

pub use checks::{
    ChatLogAppendOnly, ListsReplacedWholesale, NoOpEventsPreserveSnapshot, StageFollowsLifecycle,
};

/// Outcome of checking one step.
pub type InvariantResult = Result<(), Violation>;

/// A reducer step broke a property.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{invariant} broken: {message}")]
pub struct Violation {
    /// Which property broke.
    pub invariant: &'static str,
    /// What the step did instead.
    pub message: String,
}

/// One reducer application.
#[derive(Debug, Clone, Copy)]
pub struct Step<'a> {
    /// Snapshot before the event.
    pub before: &'a RoomSnapshot,
    /// Event applied.
    pub event: &'a ServerEvent,
    /// Snapshot after the event.
    pub after: &'a RoomSnapshot,
}

/// A property every reducer step must satisfy.
pub trait Invariant: Send + Sync {
    /// Stable name used in violations.
    fn name(&self) -> &'static str;

    /// Check one step.
    fn check(&self, step: &Step<'_>) -> InvariantResult;
}

/// A set of reducer invariants checked together.
#[derive(Default)]
pub struct InvariantRegistry {
    checks: Vec<Box<dyn Invariant>>,
}

impl InvariantRegistry {
    /// No checks registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every reducer property this crate knows:
    /// [`ChatLogAppendOnly`], [`ListsReplacedWholesale`],
    /// [`StageFollowsLifecycle`] and [`NoOpEventsPreserveSnapshot`].
    pub fn standard() -> Self {
        Self::new()
            .with(ChatLogAppendOnly)
            .with(ListsReplacedWholesale)
            .with(StageFollowsLifecycle)
            .with(NoOpEventsPreserveSnapshot)
    }

    /// Builder form of [`InvariantRegistry::add`].
    #[must_use]
    pub fn with(mut self, invariant: impl Invariant + 'static) -> Self {
        self.add(invariant);
        self
    }

    /// Register one more check.
    pub fn add(&mut self, invariant: impl Invariant + 'static) {
        self.checks.push(Box::new(invariant));
    }

    /// Run every check against `step`, collecting all violations.
    pub fn check_all(&self, step: &Step<'_>) -> Result<(), Vec<Violation>> {
        let violations: Vec<Violation> =
            self.checks.iter().filter_map(|check| check.check(step).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Apply `event` with the real reducer and check the step.
    pub fn reduce_checked(
        &self,
        before: &RoomSnapshot,
        event: &ServerEvent,
    ) -> Result<RoomSnapshot, Vec<Violation>> {
        let after = reduce(before.clone(), event);
        self.check_all(&Step { before, event, after: &after })?;
        Ok(after)
    }

    /// Registered checks.
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}
