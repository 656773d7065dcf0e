//! Environment abstraction for deterministic testing.
//!
//! Session state machines never read the clock themselves. Drivers ask the
//! environment for `now()` and pass it in, so the same code runs against the
//! system clock in production and a paused or virtual clock in tests.

use std::{future::Future, ops::Sub, time::Duration};

/// Time source used by drivers and runtimes.
///
/// # Invariants
///
/// - `now()` never goes backwards within one execution context.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Instant type. `std::time::Instant` in production, virtual time in
    /// simulation.
    type Instant: Copy + Ord + Send + Sync + Sub<Output = Duration>;

    /// Current monotonic time.
    fn now(&self) -> Self::Instant;

    /// Sleep for `duration`. Only driver code awaits this.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}
