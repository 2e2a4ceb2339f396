//! TCP listener and top-level server wiring.
//!
//! This module:
//! - Listens on the configured address/port.
//! - Accepts new TCP connections (up to `max_clients` live sessions).
//! - Spawns, per connection:
//!   - a writer task draining the connection's outbound channel,
//!   - the session loop (see `client`) reading its lines.
//! - On shutdown, stops accepting, tells every session to wind down and
//!   waits for all of them to flush and close.

use std::future::Future;
use std::net::SocketAddr;

use anyhow::Context;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use tictactoe_protocol::render;

use crate::client;
use crate::config::Config;
use crate::types::{OutboundRx, OutboundTx, ServerContext, ShutdownHandle};

/// Run the TCP server with the given configuration until Ctrl-C.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr = config.socket_addr_string();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, idle_timeout = ?config.idle_timeout, "listening");

    let (ctx, shutdown) = ServerContext::new(config.idle_timeout);
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "unable to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
        info!("Ctrl-C received, shutting down");
    };

    serve(listener, ctx, shutdown, config.max_clients, ctrl_c).await;
    Ok(())
}

/// Accept connections on `listener` until `signal` completes.
pub async fn serve<F>(
    listener: TcpListener,
    ctx: ServerContext,
    shutdown: ShutdownHandle,
    max_clients: usize,
    signal: F,
) where
    F: Future<Output = ()>,
{
    let mut connections = JoinSet::new();
    tokio::pin!(signal);

    loop {
        tokio::select! {
            _ = &mut signal => break,
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(err) => {
                        warn!(error = %err, "unable to accept connection");
                        continue;
                    }
                };

                if connections.len() >= max_clients {
                    warn!(%peer, max_clients, "rejecting connection: server full");
                    // Detached: a rejected peer never counts as a live session.
                    tokio::spawn(reject(stream));
                    continue;
                }

                info!(%peer, "accepted connection");
                connections.spawn(handle_connection(stream, peer, ctx.clone()));
            }
        }
    }

    // Listener first, then every live connection.
    drop(listener);
    shutdown.trigger();
    while connections.join_next().await.is_some() {}
    info!("server stopped");
}

async fn handle_connection(stream: TcpStream, peer: SocketAddr, ctx: ServerContext) {
    let (read_half, write_half) = stream.into_split();
    let (out_tx, out_rx): (OutboundTx, OutboundRx) = mpsc::unbounded_channel();
    let (close_tx, close_rx) = oneshot::channel();

    let writer = tokio::spawn(async move {
        if let Err(err) = run_writer(write_half, out_rx, close_rx).await {
            debug!(%peer, error = %err, "write failed");
        }
    });

    match client::run_client(BufReader::new(read_half), out_tx, ctx).await {
        Ok(()) => info!(%peer, "client disconnected"),
        Err(err) => info!(%peer, error = %err, "client dropped"),
    }

    let _ = close_tx.send(());
    let _ = writer.await;
}

/// Write outbound lines until the channel closes or `close_rx` fires.
///
/// On close, lines already queued are still written before the sink is
/// shut down.
pub async fn run_writer<W>(
    mut sink: W,
    mut out_rx: OutboundRx,
    mut close_rx: oneshot::Receiver<()>,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    loop {
        tokio::select! {
            biased;
            line = out_rx.recv() => match line {
                Some(line) => write_line(&mut sink, &line).await?,
                None => break,
            },
            _ = &mut close_rx => {
                while let Ok(line) = out_rx.try_recv() {
                    write_line(&mut sink, &line).await?;
                }
                break;
            }
        }
    }
    sink.shutdown().await
}

async fn write_line<W>(sink: &mut W, line: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let data = format!("{line}\n");
    sink.write_all(data.as_bytes()).await?;
    sink.flush().await
}

async fn reject(mut stream: TcpStream) {
    let _ = write_line(&mut stream, render::SERVER_FULL).await;
    let _ = stream.shutdown().await;
}
