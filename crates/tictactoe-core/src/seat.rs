//! Seat (first / second player) within a game.

/// Which of the two players a move or piece belongs to.
///
/// The challenger always takes `First` and moves first.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Seat {
    First,
    Second,
}

impl Seat {
    /// The seat that moves after this one.
    pub fn other(self) -> Self {
        match self {
            Seat::First => Seat::Second,
            Seat::Second => Seat::First,
        }
    }

    /// Board marker for this seat's pieces (`'X'` / `'O'`).
    pub fn as_char(self) -> char {
        match self {
            Seat::First => 'X',
            Seat::Second => 'O',
        }
    }

    /// Index into a two-element player array.
    pub fn index(self) -> usize {
        match self {
            Seat::First => 0,
            Seat::Second => 1,
        }
    }

    /// Try to parse from a board marker (`'X'` / `'O'`, case-sensitive).
    #[cfg(test)]
    pub(crate) fn from_char(c: char) -> Option<Self> {
        match c {
            'X' => Some(Seat::First),
            'O' => Some(Seat::Second),
            _ => None,
        }
    }
}
