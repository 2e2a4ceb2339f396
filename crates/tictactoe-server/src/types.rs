//! Shared types for the game server.
//!
//! This module defines:
//! - `GameId`: identifier handed out by the game controller
//! - the per-connection outbound channel (the "sink")
//! - `ServerContext`: handles every session loop shares
//! - `ShutdownHandle`: tells every session loop to wind down

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use crate::controller::GameController;
use crate::registry::ConnectionRegistry;

/// Game identifier: starts at 0, strictly increasing, never reused.
pub type GameId = u64;

/// Outbound text lines to a given connection (without trailing newline).
pub type OutboundTx = mpsc::UnboundedSender<String>;
pub type OutboundRx = mpsc::UnboundedReceiver<String>;

/// Everything a session loop needs besides its own socket.
#[derive(Debug, Clone)]
pub struct ServerContext {
    pub registry: Arc<ConnectionRegistry>,
    pub games: Arc<GameController>,
    /// Bound on how long a read may wait for the next input line.
    pub idle_timeout: Duration,
    shutdown: watch::Receiver<bool>,
}

impl ServerContext {
    /// Build a fresh registry and controller sharing one shutdown signal.
    pub fn new(idle_timeout: Duration) -> (Self, ShutdownHandle) {
        let registry = Arc::new(ConnectionRegistry::new());
        let games = Arc::new(GameController::new(registry.clone()));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let ctx = ServerContext {
            registry,
            games,
            idle_timeout,
            shutdown: shutdown_rx,
        };
        (ctx, ShutdownHandle(shutdown_tx))
    }

    pub(crate) fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.clone()
    }
}

/// Owner side of the shutdown signal.
///
/// Dropping it also counts as a shutdown for every session loop.
#[derive(Debug)]
pub struct ShutdownHandle(watch::Sender<bool>);

impl ShutdownHandle {
    pub fn trigger(&self) {
        self.0.send_replace(true);
    }
}
