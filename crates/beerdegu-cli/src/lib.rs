//! Terminal shell for Beerdegu tasting rooms.
//!
//! The binary wires [`beerdegu_client::open_room`] to stdin and stdout. This
//! library half holds the parts worth testing on their own: line parsing
//! and text rendering.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod render;
pub mod shell;

pub use shell::{HELP, ParseError, ShellCommand};
