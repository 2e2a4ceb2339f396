//! Registry of logged-in clients.
//!
//! - Key: username (case-sensitive, unique among live connections)
//! - Value: shared [`Client`] handle carrying the connection's sink
//!
//! All access goes through one lock around the map, and no I/O happens
//! while it is held: sends to a client are plain channel pushes.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, RwLock};
use tracing::{debug, info};

use crate::error::ServerError;
use crate::game_session::GameSession;
use crate::types::{GameId, OutboundTx};

/// Where a logged-in client currently is.
#[derive(Debug, Clone, Default)]
pub enum Presence {
    #[default]
    Lobby,
    Playing(Arc<GameSession>),
    /// Connection ended; the client can no longer join games.
    Departed,
}

/// Why a client could not be seated in a new game.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SeatRefused {
    Busy,
    Departed,
}

/// A logged-in user.
pub struct Client {
    username: String,
    out: OutboundTx,
    joined_at: DateTime<Utc>,
    presence: watch::Sender<Presence>,
    last_game: watch::Sender<Option<GameId>>,
}

impl Client {
    pub fn new(username: impl Into<String>, out: OutboundTx) -> Self {
        let (presence, _) = watch::channel(Presence::Lobby);
        let (last_game, _) = watch::channel(None);
        Client {
            username: username.into(),
            out,
            joined_at: Utc::now(),
            presence,
            last_game,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn joined_at(&self) -> DateTime<Utc> {
        self.joined_at
    }

    /// Best-effort write of one line to this client's sink.
    pub fn send(&self, line: impl Into<String>) {
        let _ = self.out.send(line.into());
    }

    pub(crate) fn sink(&self) -> OutboundTx {
        self.out.clone()
    }

    pub fn in_game(&self) -> bool {
        matches!(*self.presence.borrow(), Presence::Playing(_))
    }

    /// The game this client is seated in, if any.
    pub fn current_game(&self) -> Option<Arc<GameSession>> {
        match &*self.presence.borrow() {
            Presence::Playing(session) => Some(session.clone()),
            _ => None,
        }
    }

    /// Id of the most recent game this client finished playing.
    pub fn last_game(&self) -> Option<GameId> {
        *self.last_game.borrow()
    }

    /// Subscribe to presence changes (game start / end).
    pub fn watch_presence(&self) -> watch::Receiver<Presence> {
        self.presence.subscribe()
    }

    /// Seat this client in `session` unless it is busy or gone.
    pub(crate) fn try_enter_game(&self, session: &Arc<GameSession>) -> Result<(), SeatRefused> {
        let mut refused = None;
        self.presence.send_if_modified(|presence| match presence {
            Presence::Lobby => {
                *presence = Presence::Playing(session.clone());
                true
            }
            Presence::Playing(_) => {
                refused = Some(SeatRefused::Busy);
                false
            }
            Presence::Departed => {
                refused = Some(SeatRefused::Departed);
                false
            }
        });
        refused.map_or(Ok(()), Err)
    }

    /// Return to the lobby if still seated in game `id`, remembering it as
    /// the last game played.
    pub(crate) fn leave_game(&self, id: GameId) {
        self.presence.send_if_modified(|presence| match presence {
            Presence::Playing(session) if session.id() == id => {
                self.last_game.send_replace(Some(id));
                *presence = Presence::Lobby;
                true
            }
            _ => false,
        });
    }

    /// Undo [`Client::try_enter_game`] for a game that was never started.
    pub(crate) fn cancel_seat(&self, session: &Arc<GameSession>) {
        self.presence.send_if_modified(|presence| match presence {
            Presence::Playing(seated) if Arc::ptr_eq(seated, session) => {
                *presence = Presence::Lobby;
                true
            }
            _ => false,
        });
    }

    /// True if this client is seated in exactly `session`.
    pub fn is_seated_in(&self, session: &GameSession) -> bool {
        match &*self.presence.borrow() {
            Presence::Playing(seated) => std::ptr::eq(Arc::as_ptr(seated), session),
            _ => false,
        }
    }

    /// Mark the client as gone, returning the game it was seated in.
    pub(crate) fn depart(&self) -> Option<Arc<GameSession>> {
        match self.presence.send_replace(Presence::Departed) {
            Presence::Playing(session) => Some(session),
            _ => None,
        }
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("username", &self.username)
            .field("joined_at", &self.joined_at)
            .field("in_game", &self.in_game())
            .finish()
    }
}

/// Username -> client map with atomic check-and-insert.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    clients: RwLock<HashMap<String, Arc<Client>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        ConnectionRegistry::default()
    }

    /// Register `username` with its sink.
    ///
    /// Exactly one of several concurrent registrations of the same name
    /// succeeds; the others get [`ServerError::AuthConflict`].
    pub async fn register(&self, username: &str, out: OutboundTx) -> Result<Arc<Client>, ServerError> {
        let client = Arc::new(Client::new(username, out));
        let online = {
            let mut guard = self.clients.write().await;
            if guard.contains_key(username) {
                None
            } else {
                guard.insert(username.to_string(), client.clone());
                Some(guard.len())
            }
        };

        match online {
            Some(online) => {
                info!(user = %username, online, "client registered");
                Ok(client)
            }
            None => {
                debug!(user = %username, "username already taken");
                Err(ServerError::AuthConflict(username.to_string()))
            }
        }
    }

    /// Remove `username`; a no-op if absent.
    pub async fn unregister(&self, username: &str) {
        let removed = {
            let mut guard = self.clients.write().await;
            guard.remove(username).map(|client| (client, guard.len()))
        };

        if let Some((client, online)) = removed {
            let connected_for = Utc::now().signed_duration_since(client.joined_at());
            info!(
                user = %username,
                online,
                connected_secs = connected_for.num_seconds(),
                "client unregistered"
            );
        }
    }

    /// Point-in-time snapshot of logged-in usernames.
    pub async fn list(&self) -> Vec<String> {
        let guard = self.clients.read().await;
        guard.keys().cloned().collect()
    }

    pub async fn lookup(&self, username: &str) -> Option<Arc<Client>> {
        let guard = self.clients.read().await;
        guard.get(username).cloned()
    }

    /// True if `client` is the handle currently registered under its name.
    pub async fn is_live(&self, client: &Arc<Client>) -> bool {
        let guard = self.clients.read().await;
        guard
            .get(client.username())
            .is_some_and(|live| Arc::ptr_eq(live, client))
    }

    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
