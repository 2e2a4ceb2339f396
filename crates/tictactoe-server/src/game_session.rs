//! One live game shared by its two players and any spectators.
//!
//! All board and turn mutation goes through a single per-session lock, and
//! every broadcast for a move is pushed while that lock is held, so every
//! recipient sees moves in the order they were applied.
//!
//! Player loops never poll: they wait on the phase watch channel, which
//! changes when the turn passes, the game is won or drawn, or a player
//! leaves.

use std::fmt;
use std::sync::Arc;

use tictactoe_core::{Game, GameStatus, MoveOutcome, Seat};
use tictactoe_protocol::render;
use tictactoe_protocol::GameListing;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info};

use crate::error::ServerError;
use crate::registry::Client;
use crate::types::{GameId, OutboundTx};

/// Externally visible state of a session.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    AwaitingMove(Seat),
    Finished(GameStatus),
}

#[derive(Debug)]
struct Spectator {
    username: String,
    out: OutboundTx,
}

#[derive(Debug)]
struct SessionState {
    game: Game,
    spectators: Vec<Spectator>,
}

pub struct GameSession {
    id: GameId,
    players: [Arc<Client>; 2],
    state: Mutex<SessionState>,
    phase: watch::Sender<Phase>,
}

impl GameSession {
    /// `first` takes `X` and moves first.
    pub fn new(id: GameId, first: Arc<Client>, second: Arc<Client>) -> Self {
        let (phase, _) = watch::channel(Phase::AwaitingMove(Seat::First));
        GameSession {
            id,
            players: [first, second],
            state: Mutex::new(SessionState {
                game: Game::new(),
                spectators: Vec::new(),
            }),
            phase,
        }
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn player(&self, seat: Seat) -> &Arc<Client> {
        &self.players[seat.index()]
    }

    /// Seat held by `username`, compared by name rather than by value.
    pub fn seat_of(&self, username: &str) -> Option<Seat> {
        [Seat::First, Seat::Second]
            .into_iter()
            .find(|seat| self.player(*seat).username() == username)
    }

    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    pub fn watch_phase(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    /// Tell both players the game is on and prompt the first mover.
    pub async fn announce_start(&self) {
        let state = self.state.lock().await;
        let line = render::format_game_started(
            self.id,
            self.player(Seat::First).username(),
            self.player(Seat::Second).username(),
        );
        self.broadcast(&state, &line);
        if !state.game.is_finished() {
            let turn = state.game.current_turn();
            self.player(turn).send(render::format_your_turn(turn));
        }
    }

    /// Arbitrate a move by `username`.
    ///
    /// Rejected moves leave the board and the turn untouched; only the
    /// caller is told why.
    pub async fn play(&self, username: &str, row: i64, col: i64) -> Result<MoveOutcome, ServerError> {
        let seat = self.seat_of(username).ok_or(ServerError::NotAPlayer(self.id))?;

        let mut state = self.state.lock().await;
        let outcome = state.game.play(seat, row, col)?;
        debug!(game_id = self.id, user = %username, row, col, ?outcome, "move applied");

        self.publish_move(&state, username, row, col);
        match outcome {
            MoveOutcome::Continue { next } => {
                self.player(next).send(render::format_your_turn(next));
                self.phase.send_replace(Phase::AwaitingMove(next));
            }
            MoveOutcome::Won(winner) => {
                self.publish_win(&state, winner);
                self.finish(&mut state);
            }
            MoveOutcome::Draw => {
                self.broadcast(&state, &render::format_draw(self.id));
                self.finish(&mut state);
            }
        }
        Ok(outcome)
    }

    /// End the game because `username` left, releasing the other player.
    ///
    /// Returns `false` if the game had already finished.
    pub async fn abort(&self, username: &str) -> bool {
        let Some(seat) = self.seat_of(username) else {
            return false;
        };

        let mut state = self.state.lock().await;
        if !state.game.abort(seat) {
            return false;
        }
        self.broadcast(&state, &render::format_abort(self.id, username));
        self.finish(&mut state);
        true
    }

    /// Attach `client` as a spectator and send it the current board.
    ///
    /// Subscribing twice is harmless; a finished game only gets the
    /// final board.
    pub async fn subscribe(&self, client: &Client) {
        let mut state = self.state.lock().await;
        state.spectators.retain(|s| !s.out.is_closed());
        let already = state.spectators.iter().any(|s| s.username == client.username());
        if !already && !state.game.is_finished() {
            state.spectators.push(Spectator {
                username: client.username().to_string(),
                out: client.sink(),
            });
        }
        client.send(render::format_subscribed(self.id));
        client.send(render::format_board(state.game.board()));
        info!(game_id = self.id, user = %client.username(), "spectator subscribed");
    }

    pub async fn listing(&self) -> GameListing {
        let state = self.state.lock().await;
        GameListing {
            id: self.id,
            first: self.player(Seat::First).username().to_string(),
            second: self.player(Seat::Second).username().to_string(),
            status: state.game.status(),
            spectators: state.spectators.iter().filter(|s| !s.out.is_closed()).count(),
        }
    }

    // -------------------------------------------------------------------------
    // Broadcast helpers (callers hold the state lock)
    // -------------------------------------------------------------------------

    fn publish_move(&self, state: &SessionState, username: &str, row: i64, col: i64) {
        let line = render::format_move(username, row, col, state.game.board());
        self.broadcast(state, &line);
    }

    fn publish_win(&self, state: &SessionState, winner: Seat) {
        let line = render::format_win(self.player(winner).username());
        self.broadcast(state, &line);
    }

    fn broadcast(&self, state: &SessionState, line: &str) {
        for player in &self.players {
            player.send(line);
        }
        for spectator in &state.spectators {
            let _ = spectator.out.send(line.to_string());
        }
    }

    /// Seat both players back in the lobby, then publish the final phase.
    fn finish(&self, state: &mut SessionState) {
        for player in &self.players {
            player.leave_game(self.id);
        }
        state.spectators.clear();

        let status = state.game.status();
        self.phase.send_replace(Phase::Finished(status));
        info!(game_id = self.id, ?status, "game finished");
    }
}

impl fmt::Debug for GameSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameSession")
            .field("id", &self.id)
            .field("first", &self.player(Seat::First).username())
            .field("second", &self.player(Seat::Second).username())
            .field("phase", &self.phase())
            .finish()
    }
}
