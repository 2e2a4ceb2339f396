//! Line-oriented tic-tac-toe TCP server.

use std::time::Duration;

use clap::Parser;
use tictactoe_server::config::Config;
use tictactoe_server::server;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(name = "tictactoe-server")]
#[clap(about = "Multi-client tic-tac-toe server with spectators")]
struct Cli {
    /// Interface to bind (overrides TICTACTOE_BIND_ADDR)
    #[clap(short, long)]
    bind: Option<String>,

    /// Port to listen on (overrides TICTACTOE_PORT)
    #[clap(short, long)]
    port: Option<u16>,

    /// Idle read timeout in seconds (overrides TICTACTOE_IDLE_TIMEOUT_SECS)
    #[clap(short, long)]
    timeout: Option<u64>,

    /// Maximum simultaneous connections (overrides TICTACTOE_MAX_CLIENTS)
    #[clap(short, long)]
    max_clients: Option<usize>,

    /// Enable debug logging
    #[clap(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let mut config = Config::from_env()?;
    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(secs) = cli.timeout {
        config.idle_timeout = Duration::from_secs(secs);
    }
    if let Some(max_clients) = cli.max_clients {
        config.max_clients = max_clients;
    }

    info!(
        "Starting tictactoe-server on {} (max_clients = {}, idle timeout = {:?})",
        config.socket_addr_string(),
        config.max_clients,
        config.idle_timeout
    );

    server::run(config).await
}
