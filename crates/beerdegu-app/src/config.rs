//! Session timing configuration.

use std::time::Duration;

use beerdegu_core::ConnectionConfig;

/// Presence ping interval.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(14);

/// Roster refresh interval.
pub const DEFAULT_ROSTER_INTERVAL: Duration = Duration::from_secs(12);

/// Draft autosave interval.
pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::from_secs(5);

/// How often the runtime ticks the session.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Timers and buffers for one room session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Presence ping interval.
    pub heartbeat_interval: Duration,
    /// Roster refresh interval.
    pub roster_interval: Duration,
    /// Autosave interval for dirty drafts.
    pub autosave_interval: Duration,
    /// Runtime tick granularity. Timers fire at most this late.
    pub tick_interval: Duration,
    /// Inbound event fan-out buffer. Slow subscribers past this lag.
    pub event_capacity: usize,
    /// Pending intents from handles before senders wait.
    pub intent_capacity: usize,
    /// Reconnection policy.
    pub connection: ConnectionConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            roster_interval: DEFAULT_ROSTER_INTERVAL,
            autosave_interval: DEFAULT_AUTOSAVE_INTERVAL,
            tick_interval: DEFAULT_TICK_INTERVAL,
            event_capacity: 256,
            intent_capacity: 64,
            connection: ConnectionConfig::default(),
        }
    }
}
