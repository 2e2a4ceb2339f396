//! Per-game rules engine.
//!
//! State machine:
//! - starts in `InProgress` with `Seat::First` to move,
//! - a valid non-terminal move passes the turn to the other seat,
//! - a winning move ends in `Won(seat)`, a move filling the board
//!   without a line ends in `Draw`,
//! - `abort` ends an in-progress game as `Aborted(seat)` (the seat that left).
//!
//! Once finished, nothing transitions out and every move is rejected with
//! [`GameError::GameFinished`].

use crate::board::{Board, BOARD_SIZE};
use crate::error::GameError;
use crate::seat::Seat;

/// Overall status of a game.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    Won(Seat),
    Draw,
    /// The given seat disconnected before the game ended.
    Aborted(Seat),
}

impl GameStatus {
    pub fn is_finished(self) -> bool {
        self != GameStatus::InProgress
    }
}

/// Result of an accepted move.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Game continues; `next` now holds the turn.
    Continue { next: Seat },
    Won(Seat),
    Draw,
}

/// A single game: board, turn pointer and status.
#[derive(Debug, Clone)]
pub struct Game {
    board: Board,
    turn: Seat,
    status: GameStatus,
}

impl Default for Game {
    fn default() -> Self {
        Game {
            board: Board::new(),
            turn: Seat::First,
            status: GameStatus::InProgress,
        }
    }
}

impl Game {
    /// Create a new game with `Seat::First` to move.
    pub fn new() -> Self {
        Game::default()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Seat currently holding the turn.
    pub fn current_turn(&self) -> Seat {
        self.turn
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    /// True iff both coordinates are on the board and the cell is empty.
    pub fn is_valid_move(&self, row: i64, col: i64) -> bool {
        match to_index(row, col) {
            Some((r, c)) => self.board.get(r, c).is_some_and(|cell| cell.is_empty()),
            None => false,
        }
    }

    /// Place the current seat's piece at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if [`Game::is_valid_move`] is false for the same coordinates.
    pub fn apply_move(&mut self, row: i64, col: i64) {
        let placed = to_index(row, col)
            .map(|(r, c)| self.board.place(r, c, self.turn))
            .unwrap_or(false);
        assert!(placed, "apply_move on an invalid cell ({row}, {col})");
    }

    /// True iff any row, column or diagonal is complete.
    pub fn check_win(&self) -> bool {
        self.board.check_win()
    }

    /// Flip the turn pointer.
    pub fn swap_turn(&mut self) {
        self.turn = self.turn.other();
    }

    /// Full move arbitration for `seat`.
    ///
    /// Rejections (`GameFinished`, `NotYourTurn`, `InvalidMove`) leave the
    /// board and the turn pointer untouched.
    pub fn play(&mut self, seat: Seat, row: i64, col: i64) -> Result<MoveOutcome, GameError> {
        if self.is_finished() {
            return Err(GameError::GameFinished);
        }
        if seat != self.turn {
            return Err(GameError::NotYourTurn);
        }
        if !self.is_valid_move(row, col) {
            return Err(GameError::InvalidMove { row, col });
        }

        self.apply_move(row, col);

        if self.check_win() {
            self.status = GameStatus::Won(seat);
            return Ok(MoveOutcome::Won(seat));
        }
        if self.board.is_full() {
            self.status = GameStatus::Draw;
            return Ok(MoveOutcome::Draw);
        }

        self.swap_turn();
        Ok(MoveOutcome::Continue { next: self.turn })
    }

    /// End an in-progress game because `seat` left.
    ///
    /// Returns `false` if the game had already finished.
    pub fn abort(&mut self, seat: Seat) -> bool {
        if self.is_finished() {
            return false;
        }
        self.status = GameStatus::Aborted(seat);
        true
    }
}

fn to_index(row: i64, col: i64) -> Option<(usize, usize)> {
    let r = usize::try_from(row).ok().filter(|r| *r < BOARD_SIZE)?;
    let c = usize::try_from(col).ok().filter(|c| *c < BOARD_SIZE)?;
    Some((r, c))
}
