//! Recurring and stage-triggered outbound traffic.
//!
//! Two fixed-interval timers (presence heartbeat, roster refresh) and two
//! one-shot fetches keyed on stage transitions:
//!
//! - into `IN_PROGRESS`: load the catalog
//! - into `FINISHED`: fetch personal then aggregate results
//!
//! Time is an input. Nothing fires until [`PeriodicScheduler::start`], and
//! nothing fires after [`PeriodicScheduler::stop`].

use std::{ops::Sub, time::Duration};

use beerdegu_proto::RoomState;

use crate::dispatcher::CommandDispatcher;

#[derive(Debug, Clone, Copy)]
struct Interval<I> {
    period: Duration,
    last: Option<I>,
}

impl<I> Interval<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    fn new(period: Duration) -> Self {
        Self { period, last: None }
    }

    /// True once per elapsed period. Unarmed intervals never fire.
    fn poll(&mut self, now: I) -> bool {
        match self.last {
            Some(last) if now - last >= self.period => {
                self.last = Some(now);
                true
            },
            _ => false,
        }
    }
}

/// Session timers.
#[derive(Debug, Clone)]
pub struct PeriodicScheduler<I> {
    heartbeat: Interval<I>,
    roster: Interval<I>,
    stopped: bool,
}

impl<I> PeriodicScheduler<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Scheduler with the given periods. Timers are unarmed.
    pub fn new(heartbeat_interval: Duration, roster_interval: Duration) -> Self {
        Self {
            heartbeat: Interval::new(heartbeat_interval),
            roster: Interval::new(roster_interval),
            stopped: false,
        }
    }

    /// Arm (or re-arm) both timers, counting from `now`.
    pub fn start(&mut self, now: I) {
        if self.stopped {
            return;
        }
        self.heartbeat.last = Some(now);
        self.roster.last = Some(now);
    }

    /// Dispatch whatever is due at `now`.
    pub fn tick(&mut self, now: I, dispatcher: &mut CommandDispatcher) {
        if self.stopped {
            return;
        }
        if self.heartbeat.poll(now) {
            dispatcher.heartbeat();
        }
        if self.roster.poll(now) {
            dispatcher.request_roster();
        }
    }

    /// React to a stage change observed in the snapshot.
    ///
    /// Only transitions fire. Seeing the same stage twice does nothing.
    pub fn observe_stage(
        &mut self,
        previous: RoomState,
        current: RoomState,
        dispatcher: &mut CommandDispatcher,
    ) {
        if self.stopped || previous == current {
            return;
        }

        match current {
            RoomState::InProgress => {
                tracing::info!(from = %previous, "tasting started, loading catalog");
                dispatcher.load_catalog();
            },
            RoomState::Finished => {
                tracing::info!(from = %previous, "tasting finished, fetching results");
                dispatcher.request_user_results();
                dispatcher.request_aggregate_results();
            },
            RoomState::Waiting | RoomState::Starting => {},
        }
    }

    /// Cancel every timer for good.
    pub fn stop(&mut self) {
        self.stopped = true;
        self.heartbeat.last = None;
        self.roster.last = None;
    }

    /// True after [`PeriodicScheduler::stop`].
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}
