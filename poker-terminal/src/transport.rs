//! Duplex connection to the game server.
//!
//! Two framings are supported, selected by the endpoint scheme:
//!
//! - `ws://` / `wss://`: WebSocket text frames. Each command is sent as a JSON
//!   object `{"command": "<line>"}`.
//! - `tcp://host:port`: newline-delimited lines in both directions, compatible
//!   with netcat-style tools.
//!
//! The connection is split once it is established. The write half and the read
//! half each sit behind their own async mutex, so a send never waits on a
//! pending receive and concurrent sends cannot interleave within one frame.

use std::{fmt, io, str::FromStr, time::Duration};

use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use serde::Serialize;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    sync::Mutex,
    time::timeout,
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{self, Message},
};
use tracing::{debug, info};

use crate::error::{TransportError, WireError};

pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8081/ws/poker";
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const LINE_ENDINGS: &[char] = &['\n', '\r'];

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Where the server lives and which framing it speaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Full WebSocket URL, e.g. `ws://localhost:8081/ws/poker`.
    WebSocket(String),
    /// `host:port` of a newline-delimited TCP server.
    Line(String),
}

impl FromStr for Endpoint {
    type Err = TransportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.starts_with("ws://") || value.starts_with("wss://") {
            return Ok(Endpoint::WebSocket(value.to_string()));
        }
        match value.strip_prefix("tcp://") {
            Some(addr) if !addr.is_empty() => {
                Ok(Endpoint::Line(addr.trim_end_matches('/').to_string()))
            }
            _ => Err(TransportError::UnsupportedEndpoint(value.to_string())),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::WebSocket(url) => f.write_str(url),
            Endpoint::Line(addr) => write!(f, "tcp://{addr}"),
        }
    }
}

#[derive(Serialize)]
struct CommandFrame<'a> {
    command: &'a str,
}

enum Outbound {
    WebSocket(SplitSink<WsStream, Message>),
    Line(OwnedWriteHalf),
}

enum Inbound {
    WebSocket(SplitStream<WsStream>),
    Line(BufReader<OwnedReadHalf>),
}

/// Owner of the one connection to the server.
///
/// Starts disconnected; [`Transport::connect`] opens it and [`Transport::close`]
/// releases it. Sending or receiving while disconnected yields
/// [`TransportError::NotConnected`].
pub struct Transport {
    endpoint: Endpoint,
    outbound: Mutex<Option<Outbound>>,
    inbound: Mutex<Option<Inbound>>,
}

impl Transport {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            outbound: Mutex::new(None),
            inbound: Mutex::new(None),
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.outbound.lock().await.is_some()
    }

    /// Opens the connection, giving up after `connect_timeout`.
    pub async fn connect(&self, connect_timeout: Duration) -> Result<(), TransportError> {
        let (outbound, inbound) = match timeout(connect_timeout, self.open()).await {
            Ok(result) => result,
            Err(_) => Err(WireError::Io(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("no answer within {}s", connect_timeout.as_secs_f32()),
            ))),
        }
        .map_err(|source| TransportError::Connection {
            endpoint: self.endpoint.to_string(),
            source,
        })?;

        *self.outbound.lock().await = Some(outbound);
        *self.inbound.lock().await = Some(inbound);
        info!(endpoint = %self.endpoint, "connected");
        Ok(())
    }

    async fn open(&self) -> Result<(Outbound, Inbound), WireError> {
        match &self.endpoint {
            Endpoint::WebSocket(url) => {
                let (stream, _) = connect_async(url.as_str()).await?;
                let (sink, stream) = stream.split();
                Ok((Outbound::WebSocket(sink), Inbound::WebSocket(stream)))
            }
            Endpoint::Line(addr) => {
                let stream = TcpStream::connect(addr.as_str()).await?;
                let (reader, writer) = stream.into_split();
                Ok((Outbound::Line(writer), Inbound::Line(BufReader::new(reader))))
            }
        }
    }

    /// Frames `command` for the endpoint's protocol and writes it in one piece.
    pub async fn send(&self, command: &str) -> Result<(), TransportError> {
        let mut outbound = self.outbound.lock().await;
        let outbound = outbound.as_mut().ok_or(TransportError::NotConnected)?;

        match outbound {
            Outbound::WebSocket(sink) => {
                let frame = serde_json::to_string(&CommandFrame { command })
                    .map_err(|err| TransportError::Send(err.into()))?;
                sink.send(Message::text(frame))
                    .await
                    .map_err(|err| TransportError::Send(err.into()))?;
            }
            Outbound::Line(writer) => {
                let mut encoded = Vec::with_capacity(command.len() + 1);
                encoded.extend_from_slice(command.as_bytes());
                encoded.push(b'\n');
                write_line(writer, &encoded)
                    .await
                    .map_err(|err| TransportError::Send(err.into()))?;
            }
        }

        debug!(command, "sent command");
        Ok(())
    }

    /// Waits for the next inbound payload.
    ///
    /// Returns `Ok(None)` once the peer has closed the connection. Dropping the
    /// returned future releases the read half without losing a frame.
    pub async fn receive_next(&self) -> Result<Option<String>, TransportError> {
        let mut inbound = self.inbound.lock().await;
        let inbound = inbound.as_mut().ok_or(TransportError::NotConnected)?;

        match inbound {
            Inbound::WebSocket(stream) => next_websocket_payload(stream).await,
            Inbound::Line(reader) => next_line(reader)
                .await
                .map_err(|err| TransportError::Receive(err.into())),
        }
    }

    /// Releases the connection. Calling it again, or before connecting, is a no-op.
    pub async fn close(&self) {
        let Some(outbound) = self.outbound.lock().await.take() else {
            debug!("close requested on a transport that is not open");
            return;
        };

        match outbound {
            Outbound::WebSocket(mut sink) => {
                if let Err(error) = sink.close().await {
                    debug!(?error, "websocket close handshake failed");
                }
            }
            Outbound::Line(mut writer) => {
                if let Err(error) = writer.shutdown().await {
                    debug!(?error, "failed to shut down tcp writer");
                }
            }
        }

        // A receive still parked on the read half keeps it until it is dropped.
        if let Ok(mut inbound) = self.inbound.try_lock() {
            *inbound = None;
        }
        info!(endpoint = %self.endpoint, "connection closed");
    }
}

async fn write_line(writer: &mut OwnedWriteHalf, encoded: &[u8]) -> io::Result<()> {
    writer.write_all(encoded).await?;
    writer.flush().await
}

async fn next_websocket_payload(
    stream: &mut SplitStream<WsStream>,
) -> Result<Option<String>, TransportError> {
    loop {
        match stream.next().await {
            None => return Ok(None),
            Some(Ok(Message::Text(text))) => return Ok(Some(text.as_str().to_owned())),
            Some(Ok(Message::Binary(bytes))) => {
                return Ok(Some(String::from_utf8_lossy(&bytes).into_owned()));
            }
            Some(Ok(Message::Close(frame))) => {
                debug!(?frame, "server sent close frame");
                return Ok(None);
            }
            Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
            Some(Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed)) => {
                return Ok(None);
            }
            Some(Err(err)) => return Err(TransportError::Receive(err.into())),
        }
    }
}

async fn next_line(reader: &mut BufReader<OwnedReadHalf>) -> io::Result<Option<String>> {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let bytes = reader.read_until(b'\n', &mut buf).await?;
        if bytes == 0 {
            return Ok(None);
        }

        // Invalid UTF-8 is replaced, never rejected.
        let line = String::from_utf8_lossy(&buf);
        let trimmed = line.trim_end_matches(LINE_ENDINGS);
        if trimmed.is_empty() {
            continue;
        }
        return Ok(Some(trimmed.to_string()));
    }
}
