//! Per-connection session loop.
//!
//! Two phases:
//! - login: read `login <username>` lines until a name is registered,
//! - commands: dispatch lobby commands, or route `play` lines to the
//!   client's game while it is seated in one.
//!
//! Reads are bounded by the idle timeout, except while waiting for the
//! opponent's move. No phase ever polls: lobby reads race the client's
//! presence channel (so a challenged player joins the game at once), and
//! in-game reads race the session's phase channel.

use std::sync::Arc;
use std::time::Duration;

use tictactoe_protocol::render;
use tictactoe_protocol::{parse_command, parse_login, Command};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::{ConnectionError, ServerError};
use crate::game_session::{GameSession, Phase};
use crate::registry::{Client, ConnectionRegistry};
use crate::types::{OutboundTx, ServerContext};

/// Run the session loop for a single connection.
///
/// `reader` yields the client's input lines; `out_tx` is its sink. Returns
/// `Ok(())` when the peer closes the connection, otherwise the error that
/// ended the session. Registry removal and game abort happen before this
/// returns, whatever the outcome.
pub async fn run_client<R>(reader: R, out_tx: OutboundTx, ctx: ServerContext) -> Result<(), ServerError>
where
    R: AsyncBufRead + Unpin + Send,
{
    let mut lines = LineReader::new(reader, ctx.idle_timeout, ctx.shutdown_signal());
    let _ = out_tx.send(render::format_login_prompt());

    let client = match login(&mut lines, &out_tx, &ctx.registry).await {
        Ok(client) => client,
        Err(err) => {
            send_farewell(&out_tx, &err);
            return peer_closed_is_ok(err);
        }
    };

    let result = command_loop(&mut lines, &client, &ctx).await;

    if let Some(session) = client.depart() {
        session.abort(client.username()).await;
    }
    ctx.registry.unregister(client.username()).await;

    match result {
        Ok(()) => Ok(()),
        Err(err) => {
            info!(user = %client.username(), error = %err, "session ended");
            send_farewell(&out_tx, &err);
            peer_closed_is_ok(err)
        }
    }
}

async fn login<R>(
    lines: &mut LineReader<R>,
    out_tx: &OutboundTx,
    registry: &ConnectionRegistry,
) -> Result<Arc<Client>, ServerError>
where
    R: AsyncBufRead + Unpin + Send,
{
    loop {
        let line = lines.next_line(true).await?;
        debug!(line = %line, "login line");

        let username = match parse_login(&line) {
            Ok(username) => username,
            Err(err) => {
                let _ = out_tx.send(err.to_string());
                continue;
            }
        };

        match registry.register(&username, out_tx.clone()).await {
            Ok(client) => {
                client.send(render::LOGIN_OK);
                return Ok(client);
            }
            Err(err) => {
                let _ = out_tx.send(err.to_string());
            }
        }
    }
}

async fn command_loop<R>(lines: &mut LineReader<R>, client: &Arc<Client>, ctx: &ServerContext) -> Result<(), ServerError>
where
    R: AsyncBufRead + Unpin + Send,
{
    let mut presence = client.watch_presence();

    loop {
        if let Some(session) = client.current_game() {
            if let Phase::Finished(_) = session.phase() {
                client.leave_game(session.id());
            } else {
                play_game(lines, client, &session).await?;
            }
            continue;
        }

        tokio::select! {
            changed = presence.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
            }
            line = lines.next_line(true) => {
                let line = line?;
                debug!(user = %client.username(), line = %line, "command line");

                // Seated by someone else's challenge since the read began.
                if let Some(session) = client.current_game() {
                    handle_game_line(client, &session, &line).await;
                    continue;
                }

                if let Err(err) = dispatch(client, ctx, &line).await {
                    if err.is_fatal() {
                        return Err(err);
                    }
                    client.send(err.to_string());
                }
            }
        }
    }
}

/// Handle one lobby command.
async fn dispatch(client: &Arc<Client>, ctx: &ServerContext, line: &str) -> Result<(), ServerError> {
    let Some(cmd) = parse_command(line)? else {
        return Ok(());
    };

    match cmd {
        Command::Whoami => client.send(client.username()),
        Command::AllUsers => client.send(render::format_user_list(&ctx.registry.list().await)),
        Command::AllGames => client.send(render::format_game_list(&ctx.games.list().await)),
        Command::Help => client.send(render::HELP),
        Command::Challenge(name) => {
            let opponent = ctx
                .registry
                .lookup(&name)
                .await
                .ok_or(ServerError::OpponentNotFound(name))?;
            ctx.games.create_game(client, &opponent).await?;
        }
        Command::Subscribe(id) => {
            ctx.games.subscribe_to_game(id, client).await?;
        }
        Command::Play { row, col } => {
            let last_game = match client.last_game() {
                Some(id) => ctx.games.lookup(id).await,
                None => None,
            };
            // The last game has ended, so this is rejected as finished.
            let session = last_game.ok_or(ServerError::NotInGame)?;
            session.play(client.username(), row, col).await?;
        }
        Command::Unknown(keyword) => client.send(render::format_unknown_command(&keyword)),
    }
    Ok(())
}

/// Stay in `session` until it finishes or the client is no longer seated
/// in it.
///
/// The idle timeout only applies while this client holds the turn.
async fn play_game<R>(lines: &mut LineReader<R>, client: &Arc<Client>, session: &GameSession) -> Result<(), ServerError>
where
    R: AsyncBufRead + Unpin + Send,
{
    let seat = session
        .seat_of(client.username())
        .ok_or(ServerError::NotAPlayer(session.id()))?;
    let mut phase = session.watch_phase();
    let mut presence = client.watch_presence();

    loop {
        if !client.is_seated_in(session) {
            return Ok(());
        }
        let current = *phase.borrow_and_update();
        let my_turn = match current {
            Phase::Finished(_) => return Ok(()),
            Phase::AwaitingMove(turn) => turn == seat,
        };

        tokio::select! {
            biased;
            changed = presence.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
            }
            changed = phase.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
            }
            line = lines.next_line(my_turn) => {
                let line = line?;
                handle_game_line(client, session, &line).await;
            }
        }
    }
}

async fn handle_game_line(client: &Client, session: &GameSession, line: &str) {
    match parse_command(line) {
        Ok(None) => {}
        Ok(Some(Command::Play { row, col })) => {
            if let Err(err) = session.play(client.username(), row, col).await {
                debug!(user = %client.username(), game_id = session.id(), error = %err, "move rejected");
                client.send(err.to_string());
            }
        }
        Ok(Some(_)) => client.send(render::IN_GAME_REMINDER),
        Err(err) => client.send(err.to_string()),
    }
}

fn send_farewell(out_tx: &OutboundTx, err: &ServerError) {
    if let ServerError::Connection(ConnectionError::ShuttingDown) = err {
        let _ = out_tx.send(render::SHUTTING_DOWN.to_string());
    }
    let _ = out_tx.send(render::FAREWELL.to_string());
}

fn peer_closed_is_ok(err: ServerError) -> Result<(), ServerError> {
    match err {
        ServerError::Connection(ConnectionError::Closed) => Ok(()),
        other => Err(other),
    }
}

// -----------------------------------------------------------------------------
// Line reading
// -----------------------------------------------------------------------------

/// Line source that gives up on idle timeout or server shutdown.
struct LineReader<R> {
    lines: Lines<R>,
    idle_timeout: Duration,
    shutdown: watch::Receiver<bool>,
}

impl<R> LineReader<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    fn new(reader: R, idle_timeout: Duration, shutdown: watch::Receiver<bool>) -> Self {
        LineReader {
            lines: reader.lines(),
            idle_timeout,
            shutdown,
        }
    }

    /// Next input line, trimmed.
    ///
    /// Cancel-safe, so it can race other events in `select!`.
    async fn next_line(&mut self, timed: bool) -> Result<String, ConnectionError> {
        let LineReader {
            lines,
            idle_timeout,
            shutdown,
        } = self;

        if *shutdown.borrow() {
            return Err(ConnectionError::ShuttingDown);
        }

        let read = async {
            if timed {
                match timeout(*idle_timeout, lines.next_line()).await {
                    Ok(res) => res.map_err(ConnectionError::Io),
                    Err(_) => Err(ConnectionError::IdleTimeout(*idle_timeout)),
                }
            } else {
                lines.next_line().await.map_err(ConnectionError::Io)
            }
        };

        tokio::select! {
            _ = shutdown.changed() => Err(ConnectionError::ShuttingDown),
            line = read => match line {
                Ok(Some(line)) => Ok(line.trim().to_string()),
                Ok(None) => Err(ConnectionError::Closed),
                Err(err) => {
                    if let ConnectionError::Io(io_err) = &err {
                        warn!(error = %io_err, "read failed");
                    }
                    Err(err)
                }
            },
        }
    }
}
