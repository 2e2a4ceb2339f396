//! Server response rendering.
//!
//! All responses are plain text; multi-line responses are a single string
//! with embedded newlines (the connection writer appends the final `\n`).
//!
//! Board grid (`_` empty, `X` first seat, `O` second seat):
//!
//! ```text
//! +-----+
//! |X|O|_|
//! |_|X|_|
//! |_|_|_|
//! +-----+
//! ```

use std::fmt::Write;

use tictactoe_core::{Board, GameStatus, Seat, BOARD_SIZE};

/// Border used around the user and game listings.
pub const LIST_BORDER: &str = "+---------------+";

/// Best-effort line sent before a connection is dropped.
pub const FAREWELL: &str = "Bye";

pub const SERVER_FULL: &str = "Server is full, try again later";

pub const SHUTTING_DOWN: &str = "Server is shutting down";

pub const LOGIN_OK: &str = "successfully logged in :)";

pub const IN_GAME_REMINDER: &str = "You are in a game, use: play <row> <col>";

pub const HELP: &str = "\
    whoami -- returns user name
    all_users -- show's all users online
    all_games -- show's all games
    challenge <p2-username> -- creates a new game
    subscribe <game-id> -- watch a game
    play <row> <col> -- place your piece (during a game)";

/// One row of the `all_games` listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameListing {
    pub id: u64,
    pub first: String,
    pub second: String,
    pub status: GameStatus,
    pub spectators: usize,
}

/// Render the bordered board grid.
pub fn format_board(board: &Board) -> String {
    let border = format!("+{}+", "-".repeat(2 * BOARD_SIZE - 1));
    let mut out = String::with_capacity((BOARD_SIZE + 2) * (border.len() + 1));
    out.push_str(&border);
    for row in board.rows() {
        out.push('\n');
        for cell in row {
            out.push('|');
            out.push(cell.as_char());
        }
        out.push('|');
    }
    out.push('\n');
    out.push_str(&border);
    out
}

pub fn format_login_prompt() -> String {
    format!("Welcome! Please log in with: {} <username>", crate::LOGIN)
}

pub fn format_game_started(id: u64, first: &str, second: &str) -> String {
    format!(
        "Game={id} started: {first} ({}) vs {second} ({}). {first} moves first",
        Seat::First.as_char(),
        Seat::Second.as_char()
    )
}

pub fn format_your_turn(seat: Seat) -> String {
    format!("Your move ({}): play <row> <col>", seat.as_char())
}

/// Broadcast after an accepted move.
pub fn format_move(player: &str, row: i64, col: i64, board: &Board) -> String {
    format!(
        "Player={player} move to row={row}, col={col}\nboard:\n{}",
        format_board(board)
    )
}

pub fn format_win(player: &str) -> String {
    format!("Player={player} has won!")
}

pub fn format_draw(id: u64) -> String {
    format!("Game={id} ended in a draw")
}

pub fn format_abort(id: u64, player: &str) -> String {
    format!("Player={player} left, game={id} aborted")
}

pub fn format_subscribed(id: u64) -> String {
    format!("Succesfully subscribed to game={id}")
}

pub fn format_unknown_command(keyword: &str) -> String {
    format!("Unknown command '{keyword}', type help")
}

/// Bordered list of logged-in users, sorted by name.
pub fn format_user_list<S: AsRef<str>>(names: &[S]) -> String {
    let mut names: Vec<&str> = names.iter().map(AsRef::as_ref).collect();
    names.sort_unstable();

    let mut out = format!("{LIST_BORDER}\nPlayers\n");
    if names.is_empty() {
        out.push_str("No users registered\n");
    }
    for name in names {
        out.push_str(name);
        out.push('\n');
    }
    out.push_str(LIST_BORDER);
    out
}

/// Bordered list of games, in id order.
pub fn format_game_list(games: &[GameListing]) -> String {
    let mut out = format!("{LIST_BORDER}\nGames\n");
    if games.is_empty() {
        out.push_str("No games yet\n");
    }
    for game in games {
        let status = match game.status {
            GameStatus::InProgress => "in progress".to_string(),
            GameStatus::Won(seat) => format!("won by {}", seat_name(game, seat)),
            GameStatus::Draw => "draw".to_string(),
            GameStatus::Aborted(seat) => format!("aborted by {}", seat_name(game, seat)),
        };
        let watching = match game.spectators {
            0 => String::new(),
            n => format!(", {n} watching"),
        };
        // Writing into a String cannot fail.
        let _ = writeln!(
            out,
            "{}: {} vs {} [{}{}]",
            game.id, game.first, game.second, status, watching
        );
    }
    out.push_str(LIST_BORDER);
    out
}

fn seat_name(game: &GameListing, seat: Seat) -> &str {
    match seat {
        Seat::First => &game.first,
        Seat::Second => &game.second,
    }
}
