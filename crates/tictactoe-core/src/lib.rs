//! tictactoe-core
//!
//! Pure game logic:
//! - seats and cell values
//! - the fixed-size board and its line checks
//! - the per-game rules engine (turn arbitration, win / draw detection)

pub mod board;
pub mod error;
pub mod game;
pub mod seat;

pub use board::{Board, Cell, BOARD_SIZE};
pub use error::GameError;
pub use game::{Game, GameStatus, MoveOutcome};
pub use seat::Seat;
