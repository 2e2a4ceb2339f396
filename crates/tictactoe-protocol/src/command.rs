//! Client line parsing.
//!
//! Login phase (first token case-insensitive, username case-sensitive):
//!
//! - `login <username>`
//!
//! Command phase (first token case-insensitive, arguments kept as typed):
//!
//! - `whoami`
//! - `all_users`
//! - `all_games`
//! - `challenge <username>`
//! - `subscribe <gameId>`
//! - `help`
//! - `play <row> <col>` (only meaningful during a game)
//!
//! Anything else parses as [`Command::Unknown`]; blank lines parse as `None`.

use thiserror::Error;

/// Keyword that must open the login line.
pub const LOGIN: &str = "login";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("First command must be=login <username>")]
    MalformedLogin,

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("'{value}' is not a valid {what}")]
    BadNumber { what: &'static str, value: String },
}

/// A parsed command-phase line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Whoami,
    AllUsers,
    AllGames,
    Challenge(String),
    Subscribe(u64),
    Help,
    Play { row: i64, col: i64 },
    Unknown(String),
}

/// Parse a login line, returning the requested username.
pub fn parse_login(line: &str) -> Result<String, ProtocolError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        [keyword, username] if keyword.eq_ignore_ascii_case(LOGIN) => Ok(username.to_string()),
        _ => Err(ProtocolError::MalformedLogin),
    }
}

/// Parse a command-phase line.
///
/// Returns `Ok(None)` for blank lines.
pub fn parse_command(line: &str) -> Result<Option<Command>, ProtocolError> {
    let mut tokens = line.split_whitespace();
    let keyword = match tokens.next() {
        Some(tok) => tok.to_ascii_lowercase(),
        None => return Ok(None),
    };
    let args: Vec<&str> = tokens.collect();

    let cmd = match keyword.as_str() {
        "whoami" => Command::Whoami,
        "all_users" => Command::AllUsers,
        "all_games" => Command::AllGames,
        "help" => Command::Help,
        "challenge" => match args.as_slice() {
            [opponent] => Command::Challenge(opponent.to_string()),
            _ => return Err(ProtocolError::Usage("challenge <username>")),
        },
        "subscribe" => match args.as_slice() {
            [id] => Command::Subscribe(parse_number(id, "game id")?),
            _ => return Err(ProtocolError::Usage("subscribe <game-id>")),
        },
        "play" => match args.as_slice() {
            [row, col] => Command::Play {
                row: parse_number(row, "row")?,
                col: parse_number(col, "column")?,
            },
            _ => return Err(ProtocolError::Usage("play <row> <col>")),
        },
        _ => Command::Unknown(keyword),
    };

    Ok(Some(cmd))
}

// -----------------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------------

fn parse_number<T: std::str::FromStr>(s: &str, what: &'static str) -> Result<T, ProtocolError> {
    s.parse::<T>().map_err(|_| ProtocolError::BadNumber {
        what,
        value: s.to_string(),
    })
}
