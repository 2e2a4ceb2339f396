//! Game table: creates sessions, hands out ids, attaches spectators.
//!
//! Id allocation and insertion happen under one lock, so concurrent
//! challenges never share an id, and a failed challenge never consumes one.

use std::collections::BTreeMap;
use std::sync::Arc;

use tictactoe_protocol::GameListing;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::ServerError;
use crate::game_session::GameSession;
use crate::registry::{Client, ConnectionRegistry, SeatRefused};
use crate::types::GameId;

#[derive(Debug, Default)]
struct GameTable {
    next_id: GameId,
    games: BTreeMap<GameId, Arc<GameSession>>,
}

#[derive(Debug)]
pub struct GameController {
    registry: Arc<ConnectionRegistry>,
    table: Mutex<GameTable>,
}

impl GameController {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        GameController {
            registry,
            table: Mutex::new(GameTable::default()),
        }
    }

    /// Start a game between `first` (moves first) and `second`.
    ///
    /// Fails without consuming an id if `second` is not a live registered
    /// client, either player is already in a game, or both are the same user.
    /// Neither player is touched unless both can be seated.
    pub async fn create_game(
        &self,
        first: &Arc<Client>,
        second: &Arc<Client>,
    ) -> Result<Arc<GameSession>, ServerError> {
        let created = self.seat_new_game(first, second).await;

        match &created {
            Ok(session) => {
                info!(
                    game_id = session.id(),
                    first = %first.username(),
                    second = %second.username(),
                    "game created"
                );
                session.announce_start().await;
            }
            Err(err) => {
                warn!(
                    first = %first.username(),
                    second = %second.username(),
                    error = %err,
                    "challenge refused"
                );
            }
        }
        created
    }

    /// Allocate an id and seat both players under the table lock.
    async fn seat_new_game(&self, first: &Arc<Client>, second: &Arc<Client>) -> Result<Arc<GameSession>, ServerError> {
        let mut table = self.table.lock().await;

        if first.username() == second.username() {
            return Err(ServerError::SelfChallenge);
        }
        if !self.registry.is_live(second).await {
            return Err(ServerError::OpponentNotFound(second.username().to_string()));
        }
        // Only this table lock seats clients, so these hold until the seats
        // below, barring a disconnect.
        if first.in_game() {
            return Err(ServerError::AlreadyInGame);
        }
        if second.in_game() {
            return Err(ServerError::OpponentBusy(second.username().to_string()));
        }

        let id = table.next_id;
        let session = Arc::new(GameSession::new(id, first.clone(), second.clone()));

        if first.try_enter_game(&session).is_err() {
            return Err(ServerError::AlreadyInGame);
        }
        match second.try_enter_game(&session) {
            Ok(()) => {}
            Err(refused) => {
                first.cancel_seat(&session);
                return Err(match refused {
                    SeatRefused::Busy => ServerError::OpponentBusy(second.username().to_string()),
                    SeatRefused::Departed => ServerError::OpponentNotFound(second.username().to_string()),
                });
            }
        }

        table.games.insert(id, session.clone());
        table.next_id += 1;
        Ok(session)
    }

    /// Attach `client` as a spectator of game `id`.
    pub async fn subscribe_to_game(&self, id: GameId, client: &Client) -> Result<Arc<GameSession>, ServerError> {
        let session = self.lookup(id).await.ok_or(ServerError::GameNotFound(id))?;
        session.subscribe(client).await;
        Ok(session)
    }

    pub async fn lookup(&self, id: GameId) -> Option<Arc<GameSession>> {
        self.table.lock().await.games.get(&id).cloned()
    }

    /// Listing of every game, in id order.
    pub async fn list(&self) -> Vec<GameListing> {
        // Snapshot first so session locks are never taken under the table lock.
        let sessions: Vec<Arc<GameSession>> = {
            let table = self.table.lock().await;
            table.games.values().cloned().collect()
        };

        let mut listings = Vec::with_capacity(sessions.len());
        for session in sessions {
            listings.push(session.listing().await);
        }
        listings
    }

    pub async fn len(&self) -> usize {
        self.table.lock().await.games.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
