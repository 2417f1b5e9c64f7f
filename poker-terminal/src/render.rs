//! Turns classified messages into display lines.
//!
//! Rendering never fails: absent fields fall back to `0`, an empty list, or
//! [`MISSING`]. Events that carry an identifier the shell needs later
//! (player, game, lobby) record it in the [`Session`] as they are rendered.

use serde_json::Value;
use tokio::io::{self, AsyncWrite, AsyncWriteExt};

use crate::{
    message::{Event, EventKind, Message},
    session::Session,
};

pub const MISSING: &str = "(unknown)";

const INBOUND: &str = "📥";

pub fn render(message: &Message, session: &Session) -> Vec<String> {
    match message {
        Message::Structured(event) => render_event(event, session),
        Message::PlainText(text) => vec![format!("{INBOUND} {text}"), String::new()],
    }
}

pub fn render_event(event: &Event, session: &Session) -> Vec<String> {
    let mut lines = match event.kind() {
        EventKind::PlayerRegistered => {
            let player_id = event.text(&["playerId", "id"]);
            if let Some(id) = &player_id {
                session.set_player_id(id.as_str());
            }
            vec![
                format!("{INBOUND} ✅ Player registered!"),
                format!("   Player ID: {}", or_missing(player_id)),
                format!("   Name: {}", or_missing(event.text(&["name"]))),
                format!("   Chips: {}", number(event.field("chips"))),
            ]
        }
        EventKind::GameStarted => {
            let game_id = event.text(&["gameId"]);
            if let Some(id) = &game_id {
                session.set_game_id(id.as_str());
            }
            vec![
                format!("{INBOUND} 🎮 Game started!"),
                format!("   Game ID: {}", or_missing(game_id)),
                format!("   Players: {}", list(event.field("playerIds")).join(", ")),
            ]
        }
        EventKind::LobbyCreated => {
            let lobby_id = event.text(&["lobbyId"]);
            if let Some(id) = &lobby_id {
                session.set_lobby_id(id.as_str());
            }
            vec![
                format!("{INBOUND} 🏠 Lobby created!"),
                format!("   Lobby ID: {}", or_missing(lobby_id)),
                format!("   Name: {}", or_missing(event.text(&["name"]))),
                format!("   Max Players: {}", number(event.field("maxPlayers"))),
            ]
        }
        EventKind::LobbyJoined => {
            let lobby_id = event.text(&["lobbyId"]);
            if let Some(id) = &lobby_id {
                session.set_lobby_id(id.as_str());
            }
            vec![
                format!("{INBOUND} 🏠 Joined lobby!"),
                format!("   Lobby ID: {}", or_missing(lobby_id)),
            ]
        }
        EventKind::PlayerCards => {
            let mut lines = vec![format!("{INBOUND} 🃏 Your cards:")];
            lines.extend(
                list(event.field("cards"))
                    .into_iter()
                    .map(|card| format!("   {card}")),
            );
            lines
        }
        EventKind::GameState => {
            let mut lines = vec![
                format!("{INBOUND} 🎮 Game State:"),
                format!("   Pot: {}", number(event.field("pot"))),
                format!("   Current bet: {}", number(event.field("currentBet"))),
                format!("   Active players: {}", active_players(event)),
            ];
            if let Some(cards) = event.field("communityCards") {
                lines.push(format!(
                    "   Community cards: {}",
                    list(Some(cards)).join(", ")
                ));
            }
            lines
        }
        EventKind::Error => vec![format!(
            "{INBOUND} ❌ Error: {}",
            or_missing(event.text(&["message"]))
        )],
        EventKind::Info => vec![format!(
            "{INBOUND} ℹ️  {}",
            or_missing(event.text(&["message"]))
        )],
        EventKind::Unknown => pretty(event),
    };
    lines.push(String::new());
    lines
}

/// Writes `lines` as one block so concurrent writers cannot split a rendering.
pub async fn write_lines<W, S>(out: &mut W, lines: &[S]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
    S: AsRef<str>,
{
    let mut block = String::new();
    for line in lines {
        block.push_str(line.as_ref());
        block.push('\n');
    }
    out.write_all(block.as_bytes()).await?;
    out.flush().await
}

fn pretty(event: &Event) -> Vec<String> {
    let body = serde_json::to_string_pretty(event.payload())
        .unwrap_or_else(|_| format!("{:?}", event.payload()));
    let mut lines = body.lines().map(str::to_string);
    let first = lines.next().unwrap_or_default();
    std::iter::once(format!("{INBOUND} {first}"))
        .chain(lines)
        .collect()
}

fn or_missing(value: Option<String>) -> String {
    value.unwrap_or_else(|| MISSING.to_string())
}

fn number(value: Option<&Value>) -> String {
    match value {
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::String(text)) if !text.is_empty() => text.clone(),
        _ => "0".to_string(),
    }
}

fn list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().map(item).collect(),
        _ => Vec::new(),
    }
}

fn item(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Object(card) => match (card.get("rank"), card.get("suit")) {
            (Some(Value::String(rank)), Some(Value::String(suit))) => format!("{rank} of {suit}"),
            _ => value.to_string(),
        },
        other => other.to_string(),
    }
}

fn active_players(event: &Event) -> usize {
    let value = event
        .field("activePlayers")
        .or_else(|| event.field("players"));
    match value {
        Some(Value::Array(players)) => players.len(),
        Some(Value::Number(count)) => count
            .as_u64()
            .and_then(|count| usize::try_from(count).ok())
            .unwrap_or(0),
        _ => 0,
    }
}
