use std::{error::Error as StdError, io, iter};

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Failures surfaced by [`crate::transport::Transport`].
///
/// `Connection` is fatal at startup, `NotConnected` and `Send` are reported by the
/// shell which keeps running, `Receive` ends the receive loop.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("unsupported endpoint `{0}` (expected ws://, wss:// or tcp://)")]
    UnsupportedEndpoint(String),

    #[error("failed to connect to {endpoint}")]
    Connection {
        endpoint: String,
        #[source]
        source: WireError,
    },

    #[error("not connected to server")]
    NotConnected,

    #[error("failed to send frame")]
    Send(#[source] WireError),

    #[error("failed to receive frame")]
    Receive(#[source] WireError),
}

/// Lower-level cause behind a [`TransportError`].
#[derive(Debug, Error)]
pub enum WireError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    WebSocket(#[from] tungstenite::Error),

    #[error(transparent)]
    Encode(#[from] serde_json::Error),
}

/// Renders an error with all of its causes, joined by `": "`.
pub fn chain(err: &(dyn StdError + 'static)) -> String {
    iter::successors(Some(err), |&err| err.source())
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_includes_every_cause() {
        let err = TransportError::Connection {
            endpoint: "ws://localhost:8081/ws/poker".into(),
            source: WireError::Io(io::Error::new(io::ErrorKind::ConnectionRefused, "refused")),
        };
        assert_eq!(
            chain(&err),
            "failed to connect to ws://localhost:8081/ws/poker: refused"
        );
    }
}
