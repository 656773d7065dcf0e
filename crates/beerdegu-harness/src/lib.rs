//! Deterministic simulation harness for Beerdegu room sessions.
//!
//! Scripted implementations of the [`beerdegu_app::Driver`] and
//! [`beerdegu_core::Environment`] traits, so the production runtime can be
//! exercised under tokio's paused clock without a network.
//!
//! # Invariant Testing
//!
//! The `invariants` module checks reducer steps against properties that must
//! hold for every event sequence. Use [`InvariantRegistry::standard()`] for
//! the common set.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod frames;
pub mod invariants;
pub mod sim_driver;
pub mod sim_env;

pub use invariants::{
    ChatLogAppendOnly, Invariant, InvariantRegistry, InvariantResult, ListsReplacedWholesale,
    NoOpEventsPreserveSnapshot, StageFollowsLifecycle, Step, Violation,
};
pub use sim_driver::{DriverCall, SimDriver, SimDriverError, SimServer};
pub use sim_env::{SimEnv, SimInstant};
