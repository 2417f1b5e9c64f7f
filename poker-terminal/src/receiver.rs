use std::future::Future;

use tokio::{
    io::{self, AsyncWrite},
    select,
};
use tracing::{debug, warn};

use crate::{
    error::{TransportError, chain},
    message::classify,
    render::{render, write_lines},
    session::Session,
    transport::Transport,
};

/// Why the receive loop stopped.
#[derive(Debug)]
pub enum ReceiveOutcome {
    /// The orchestrator asked it to stop.
    Cancelled,
    /// The server closed the connection.
    Closed,
    /// The transport failed; the error has already been shown to the operator.
    Failed(TransportError),
}

/// Pulls messages off `transport` and renders each one to `out` in wire order
/// until `shutdown` resolves or the connection ends.
///
/// Unparseable payloads are displayed as text and never stop the loop. A closed
/// or broken connection is reported on `out` before returning.
pub async fn run_until<W, F>(
    transport: &Transport,
    session: &Session,
    out: &mut W,
    shutdown: F,
) -> io::Result<ReceiveOutcome>
where
    W: AsyncWrite + Unpin,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        let received = select! {
            biased;
            _ = &mut shutdown => {
                debug!("receive loop cancelled");
                return Ok(ReceiveOutcome::Cancelled);
            }
            received = transport.receive_next() => received,
        };

        match received {
            Ok(Some(raw)) => {
                debug!(bytes = raw.len(), "message received");
                let lines = render(&classify(&raw), session);
                write_lines(out, &lines).await?;
            }
            Ok(None) => {
                write_lines(out, &["", "❌ Connection closed by server"]).await?;
                return Ok(ReceiveOutcome::Closed);
            }
            Err(err) => {
                warn!(error = ?err, "receive loop stopped");
                let report = format!("❌ Error receiving message: {}", chain(&err));
                write_lines(out, &["", report.as_str()]).await?;
                return Ok(ReceiveOutcome::Failed(err));
            }
        }
    }
}
