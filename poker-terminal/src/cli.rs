use std::{io::BufRead, time::Duration};

use clap::Parser;

use crate::transport::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_ENDPOINT, Endpoint};

pub const DEFAULT_PLAYER_NAME: &str = "Player";

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Terminal client for the poker game server", long_about = None)]
pub struct Cli {
    /// Display name used in the prompt and registration templates.
    pub name: Option<String>,

    /// Server endpoint: ws://host:port/path for WebSocket, tcp://host:port for plain lines.
    #[arg(long, env = "POKER_SERVER", default_value = DEFAULT_ENDPOINT)]
    pub server: Endpoint,

    /// Seconds to wait for the connection to open.
    #[arg(long, default_value_t = DEFAULT_CONNECT_TIMEOUT.as_secs())]
    pub connect_timeout: u64,
}

impl Cli {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }
}

/// Picks the display name: the argument if given, else the first line of
/// `input`, else [`DEFAULT_PLAYER_NAME`].
pub fn resolve_player_name<R: BufRead>(given: Option<&str>, input: R) -> String {
    let given = given.map(str::trim).filter(|name| !name.is_empty());
    if let Some(name) = given {
        return name.to_string();
    }

    input
        .lines()
        .next()
        .and_then(Result::ok)
        .map(|line| line.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_PLAYER_NAME.to_string())
}
