//! Error types for the rules engine.
//!
//! All of these are recoverable: the caller reports them and re-prompts,
//! and the game state is left untouched.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Coordinates outside the board, or the cell is already taken.
    #[error("Not a valid move (row={row}, col={col}), try again!")]
    InvalidMove { row: i64, col: i64 },

    /// The mover does not hold the turn.
    #[error("It is not your turn, wait for your opponent")]
    NotYourTurn,

    /// The game already ended; no further moves are accepted.
    #[error("This game has already finished")]
    GameFinished,
}
