//! tictactoe-protocol
//!
//! Text wire format for the game server.
//!
//! Every message is a newline-terminated line of plain text, in both
//! directions. This crate turns client lines into [`Command`]s and renders
//! every server response, so the server never builds strings by hand.
//!
//! - [`command`] : login / command parsing
//! - [`render`]  : board grid, listings and announcements

pub mod command;
pub mod render;

pub use command::{parse_command, parse_login, Command, ProtocolError, LOGIN};
pub use render::GameListing;
