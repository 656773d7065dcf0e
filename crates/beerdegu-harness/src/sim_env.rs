//! Simulated environment and virtual instants.
//!
//! [`SimEnv`] reads tokio's clock, which tests pause with
//! `#[tokio::test(start_paused = true)]` so time only moves when the runtime
//! is idle or a test advances it. [`SimInstant`] is a plain virtual instant
//! for driving the Sans-IO state machines by hand.

use std::{
    future::Future,
    ops::{Add, AddAssign, Sub},
    time::Duration,
};

use beerdegu_core::Environment;

/// Environment on tokio's (pausable) clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimEnv;

impl Environment for SimEnv {
    type Instant = tokio::time::Instant;

    fn now(&self) -> Self::Instant {
        tokio::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

/// Virtual instant: time since an arbitrary epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SimInstant(Duration);

impl SimInstant {
    /// The epoch.
    pub const ZERO: Self = Self(Duration::ZERO);

    /// Instant `secs` seconds after the epoch.
    pub fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    /// Time since the epoch.
    pub fn elapsed(self) -> Duration {
        self.0
    }
}

impl Add<Duration> for SimInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        Self(self.0.saturating_add(rhs))
    }
}

impl AddAssign<Duration> for SimInstant {
    fn add_assign(&mut self, rhs: Duration) {
        *self = *self + rhs;
    }
}

impl Sub for SimInstant {
    type Output = Duration;

    /// Saturates at zero, like `std::time::Instant`.
    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}
