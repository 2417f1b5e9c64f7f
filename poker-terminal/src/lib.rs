//! Interactive terminal client for the poker game server.
//!
//! One connection, two concurrent activities: a receive loop that renders
//! every server push as it arrives, and a shell that reads operator commands
//! and forwards them. Each module focuses on a concrete responsibility:
//!
//! - [`cli`] parses the command line and resolves the display name.
//! - [`transport`] owns the duplex connection (WebSocket or newline TCP).
//! - [`message`] classifies raw payloads into structured events or plain text.
//! - [`render`] turns events into display lines and records learned ids.
//! - [`session`] holds the ids learned from server messages.
//! - [`receiver`] is the receive loop.
//! - [`shell`] is the operator loop plus the `help`/`quick`/`info` panels.
//! - [`client`] wires everything together and tears it down on exit.

pub mod cli;
pub mod client;
pub mod error;
pub mod message;
pub mod receiver;
pub mod render;
pub mod session;
pub mod shell;
pub mod transport;
