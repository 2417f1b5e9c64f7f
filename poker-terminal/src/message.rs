use serde_json::{Map, Value};

/// An inbound payload, decided once at the boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Structured(Event),
    PlainText(String),
}

/// Server event kinds the renderer knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    PlayerRegistered,
    GameStarted,
    LobbyCreated,
    LobbyJoined,
    PlayerCards,
    GameState,
    Error,
    Info,
    Unknown,
}

impl EventKind {
    pub fn from_tag(tag: Option<&str>) -> Self {
        let Some(tag) = tag else {
            return EventKind::Unknown;
        };
        match tag.trim().to_ascii_uppercase().as_str() {
            "PLAYER_REGISTERED" => EventKind::PlayerRegistered,
            "GAME_STARTED" => EventKind::GameStarted,
            "LOBBY_CREATED" => EventKind::LobbyCreated,
            "LOBBY_JOINED" => EventKind::LobbyJoined,
            "PLAYER_CARDS" => EventKind::PlayerCards,
            "GAME_STATE" => EventKind::GameState,
            "ERROR" => EventKind::Error,
            "INFO" => EventKind::Info,
            _ => EventKind::Unknown,
        }
    }
}

/// A JSON object received from the server, tagged with its kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    kind: EventKind,
    payload: Map<String, Value>,
}

impl Event {
    pub fn new(payload: Map<String, Value>) -> Self {
        let kind = EventKind::from_tag(payload.get("type").and_then(Value::as_str));
        Self { kind, payload }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// Looks `key` up at the top level, then inside a nested `data` object.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.payload.get(key).or_else(|| {
            self.payload
                .get("data")
                .and_then(Value::as_object)
                .and_then(|data| data.get(key))
        })
    }

    /// First non-empty textual value among `keys`. Numbers are stringified.
    pub fn text(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|key| self.field(key))
            .find_map(|value| match value {
                Value::String(text) if !text.is_empty() => Some(text.clone()),
                Value::Number(number) => Some(number.to_string()),
                _ => None,
            })
    }
}

/// Parses a raw payload. Anything that is not a JSON object is plain text.
pub fn classify(raw: &str) -> Message {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(payload)) => Message::Structured(Event::new(payload)),
        _ => Message::PlainText(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn structured(raw: &str) -> Event {
        match classify(raw) {
            Message::Structured(event) => event,
            other => panic!("expected structured message, got {other:?}"),
        }
    }

    #[test]
    fn malformed_json_is_plain_text() {
        for raw in ["Welcome to the table", "{\"type\": ", "", "{not json}"] {
            assert_eq!(classify(raw), Message::PlainText(raw.to_string()));
        }
    }

    #[test]
    fn json_that_is_not_an_object_is_plain_text() {
        for raw in ["42", "\"hello\"", "[1, 2]", "null"] {
            assert_eq!(classify(raw), Message::PlainText(raw.to_string()));
        }
    }

    #[test]
    fn recognizes_known_tags() {
        let event = structured(r#"{"type":"PLAYER_REGISTERED","playerId":"p1"}"#);
        assert_eq!(event.kind(), EventKind::PlayerRegistered);
        assert_eq!(event.field("playerId"), Some(&Value::from("p1")));
    }

    #[test]
    fn tags_match_case_insensitively() {
        assert_eq!(structured(r#"{"type":"error","message":"x"}"#).kind(), EventKind::Error);
        assert_eq!(structured(r#"{"type":"Info"}"#).kind(), EventKind::Info);
    }

    #[test]
    fn missing_or_odd_tags_are_unknown() {
        assert_eq!(structured(r#"{"foo":1}"#).kind(), EventKind::Unknown);
        assert_eq!(structured(r#"{"type":7}"#).kind(), EventKind::Unknown);
        assert_eq!(structured(r#"{"type":"WELCOME"}"#).kind(), EventKind::Unknown);
    }

    #[test]
    fn fields_fall_back_to_data_object() {
        let event = structured(
            r#"{"type":"PLAYER_REGISTERED","message":"ok","data":{"id":"p9","name":"Bob","chips":500}}"#,
        );
        assert_eq!(event.text(&["playerId", "id"]).as_deref(), Some("p9"));
        assert_eq!(event.text(&["message"]).as_deref(), Some("ok"));
        assert_eq!(event.field("chips"), Some(&Value::from(500)));
    }

    #[test]
    fn text_skips_empty_and_non_scalar_values() {
        let event = structured(r#"{"type":"INFO","playerId":"","id":{"nested":true}}"#);
        assert_eq!(event.text(&["playerId", "id"]), None);
    }
}
