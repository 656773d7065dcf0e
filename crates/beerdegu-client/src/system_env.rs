//! Production Environment implementation using system time.
//!
//! `SystemEnv` reads the monotonic clock and sleeps on tokio's timer. Time
//! advances on its own, so behavior is not reproducible. Tests use the
//! harness environment instead.

use std::{future::Future, time::Duration};

use beerdegu_core::Environment;

/// Production environment using system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}
