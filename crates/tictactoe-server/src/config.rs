//! Configuration for the game TCP server.
//!
//! Defaults can be overridden via environment variables:
//!
//! - `TICTACTOE_BIND_ADDR`         (default: "0.0.0.0")
//! - `TICTACTOE_PORT`              (default: "8080")
//! - `TICTACTOE_MAX_CLIENTS`       (default: "1024")
//! - `TICTACTOE_IDLE_TIMEOUT_SECS` (default: "300")
//!
//! The binary lets command-line flags override these in turn.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// IP address / interface to bind to (e.g. "0.0.0.0" or "127.0.0.1").
    pub bind_addr: String,

    /// TCP port to listen on.
    pub port: u16,

    /// Maximum number of simultaneously connected clients.
    pub max_clients: usize,

    /// How long a connection may stay silent before it is dropped.
    pub idle_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: "0.0.0.0".to_string(),
            port: 8080,
            max_clients: 1024,
            idle_timeout: Duration::from_secs(300),
        }
    }
}

impl Config {
    /// Construct a `Config` from environment variables, falling back
    /// to the defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Config::default();

        let bind_addr = env::var("TICTACTOE_BIND_ADDR").unwrap_or(defaults.bind_addr);
        let port = read_env_or_default("TICTACTOE_PORT", defaults.port)?;
        let max_clients = read_env_or_default("TICTACTOE_MAX_CLIENTS", defaults.max_clients)?;
        let idle_secs = read_env_or_default("TICTACTOE_IDLE_TIMEOUT_SECS", defaults.idle_timeout.as_secs())?;

        Ok(Config {
            bind_addr,
            port,
            max_clients,
            idle_timeout: Duration::from_secs(idle_secs),
        })
    }

    /// Convenience: `addr:port` socket string.
    pub fn socket_addr_string(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn read_env_or_default<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(val) => val.parse::<T>().with_context(|| format!("invalid {key}={val:?}")),
        Err(_) => Ok(default),
    }
}
