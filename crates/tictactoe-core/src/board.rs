//! Fixed-size game board with exhaustive line checks.
//!
//! - `BOARD_SIZE` x `BOARD_SIZE` cells, row-major.
//! - A cell only ever goes from `Empty` to `Taken(seat)`; nothing clears it.
//! - A line is any full row, any full column, the main diagonal
//!   (`(i, i)`) or the anti-diagonal (`(i, N - 1 - i)`).

use crate::seat::Seat;

/// Side length of the (square) board.
pub const BOARD_SIZE: usize = 3;

/// Value of a single cell.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    #[default]
    Empty,
    Taken(Seat),
}

impl Cell {
    /// Render marker: `_` for empty, otherwise the seat's piece.
    pub fn as_char(self) -> char {
        match self {
            Cell::Empty => '_',
            Cell::Taken(seat) => seat.as_char(),
        }
    }

    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }
}

/// The game grid.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Board {
    cells: [[Cell; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// Create an empty board.
    pub fn new() -> Self {
        Board::default()
    }

    /// Cell at `(row, col)`, or `None` when out of range.
    pub fn get(&self, row: usize, col: usize) -> Option<Cell> {
        self.cells.get(row).and_then(|r| r.get(col)).copied()
    }

    /// Iterate over rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell; BOARD_SIZE]> {
        self.cells.iter()
    }

    /// Number of non-empty cells.
    pub fn occupied(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| !cell.is_empty())
            .count()
    }

    /// True when no empty cell remains.
    pub fn is_full(&self) -> bool {
        self.occupied() == BOARD_SIZE * BOARD_SIZE
    }

    /// Set an empty cell to `seat`'s piece.
    ///
    /// Returns `false` (and leaves the board unchanged) if the cell is out
    /// of range or already taken.
    pub(crate) fn place(&mut self, row: usize, col: usize, seat: Seat) -> bool {
        match self.cells.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(cell) if cell.is_empty() => {
                *cell = Cell::Taken(seat);
                true
            }
            _ => false,
        }
    }

    /// Seat owning a completed line, if any.
    ///
    /// Every row, every column and both diagonals are inspected.
    pub fn winner(&self) -> Option<Seat> {
        let rows = (0..BOARD_SIZE).map(|r| self.line(|i| (r, i)));
        let cols = (0..BOARD_SIZE).map(|c| self.line(|i| (i, c)));
        let main_diagonal = std::iter::once(self.line(|i| (i, i)));
        let anti_diagonal = std::iter::once(self.line(|i| (i, BOARD_SIZE - 1 - i)));

        rows.chain(cols)
            .chain(main_diagonal)
            .chain(anti_diagonal)
            .flatten()
            .next()
    }

    /// True iff at least one line is fully held by a single seat.
    pub fn check_win(&self) -> bool {
        self.winner().is_some()
    }

    /// Owner of the line traced by `coord(0..N)`, if all its cells match.
    fn line(&self, coord: impl Fn(usize) -> (usize, usize)) -> Option<Seat> {
        let (r0, c0) = coord(0);
        let first = match self.cells[r0][c0] {
            Cell::Taken(seat) => seat,
            Cell::Empty => return None,
        };

        (1..BOARD_SIZE)
            .map(coord)
            .all(|(r, c)| self.cells[r][c] == Cell::Taken(first))
            .then_some(first)
    }
}
