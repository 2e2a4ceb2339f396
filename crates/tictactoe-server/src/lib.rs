//! tictactoe-server
//!
//! Multi-client async TCP server: users log in under unique names,
//! challenge each other to tic-tac-toe, play under enforced turn order,
//! and watch each other's games.

pub mod config;
pub mod controller;
pub mod error;
pub mod game_session;
pub mod registry;
pub mod server;
pub mod types;

mod client;

pub use client::run_client;
pub use controller::GameController;
pub use error::{ConnectionError, ServerError};
pub use game_session::{GameSession, Phase};
pub use registry::{Client, ConnectionRegistry, Presence};
pub use types::{GameId, OutboundRx, OutboundTx, ServerContext, ShutdownHandle};
