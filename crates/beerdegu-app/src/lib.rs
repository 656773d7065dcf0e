//! Room session controller for Beerdegu.
//!
//! Pure state machines plus a generic runtime, so the same session code runs
//! against a real WebSocket and against the deterministic simulation harness.
//!
//! # Components
//!
//! - [`reduce`] / [`RoomStore`]: folds server events into a [`RoomSnapshot`]
//!   and publishes it to subscribers
//! - [`CommandDispatcher`]: typed outbound commands with role checks
//! - [`PeriodicScheduler`]: heartbeat, roster refresh and stage-triggered
//!   fetches
//! - [`RatingFormSession`]: per-beer draft loading, autosave and
//!   flush-before-switch
//! - [`RoomSession`]: composes all of the above around one connection
//! - [`Driver`] / [`Runtime`] / [`RoomHandle`]: async orchestration

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod dispatcher;
mod driver;
mod error;
mod form;
mod reducer;
mod runtime;
mod scheduler;
mod session;
mod store;

pub use config::SessionConfig;
pub use dispatcher::CommandDispatcher;
pub use driver::Driver;
pub use error::{DispatchError, RuntimeError};
pub use form::{FormState, FormView, RatingFormSession};
pub use reducer::{RoomSnapshot, reduce};
pub use runtime::{RoomHandle, Runtime};
pub use scheduler::PeriodicScheduler;
pub use session::{RoomSession, SessionEvent};
pub use store::RoomStore;
