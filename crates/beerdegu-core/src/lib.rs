//! Core session primitives for Beerdegu rooms.
//!
//! Everything in this crate is Sans-IO: state machines take the current time
//! as an input and return actions for a driver to execute. No sockets, no
//! timers, no tasks.
//!
//! # Components
//!
//! - [`Connection`]: socket lifecycle with bounded reconnection
//! - [`RoomEndpoint`]: the per-room socket URL
//! - [`AuthSession`], [`Membership`]: who the caller is and what they may do
//! - [`Environment`]: time source abstraction for drivers

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod auth;
pub mod connection;
pub mod endpoint;
pub mod env;
pub mod error;

pub use auth::{AuthSession, Membership, Role};
pub use connection::{
    CloseKind, Connection, ConnectionAction, ConnectionConfig, ConnectionStatus, Opened,
};
pub use endpoint::RoomEndpoint;
pub use env::Environment;
pub use error::ConnectionError;
