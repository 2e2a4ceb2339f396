//! Error taxonomy for the server.
//!
//! Every variant except [`ServerError::Connection`] is recoverable: its
//! `Display` text is sent back to the offending client as-is and the
//! session carries on. Connection errors end that one session only.

use std::io;
use std::time::Duration;

use thiserror::Error;
use tictactoe_core::GameError;
use tictactoe_protocol::ProtocolError;

use crate::types::GameId;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Username '{0}' is already used")]
    AuthConflict(String),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Invalid move, out-of-turn move, or move after the game ended.
    #[error(transparent)]
    Game(#[from] GameError),

    #[error("No user named '{0}' is online")]
    OpponentNotFound(String),

    #[error("'{0}' is already playing a game")]
    OpponentBusy(String),

    #[error("You are already playing a game")]
    AlreadyInGame,

    #[error("You cannot challenge yourself")]
    SelfChallenge,

    #[error("No game with id={0}")]
    GameNotFound(GameId),

    #[error("You are not a player in game={0}")]
    NotAPlayer(GameId),

    #[error("You are not in a game, challenge someone first")]
    NotInGame,

    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

impl ServerError {
    /// True if the session has to end.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ServerError::Connection(_))
    }
}

/// Why a connection's read loop stopped.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("connection closed by peer")]
    Closed,

    #[error("no input for {0:?}")]
    IdleTimeout(Duration),

    #[error("server shutting down")]
    ShuttingDown,

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}
