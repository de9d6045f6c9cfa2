//! Server-originated WebSocket messages other than notifications.
//!
//! Notifications are relayed as the exact text PostgreSQL produced, so they
//! have no type here.

use serde::Serialize;

/// Replies sent to a single connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Text received from the client, sent back unchanged.
    Echo { message: String },
}

impl ServerMessage {
    pub fn echo(message: impl Into<String>) -> Self {
        ServerMessage::Echo {
            message: message.into(),
        }
    }

    /// Encode as a text frame body.
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_serialization() {
        let json = ServerMessage::echo("hello").to_text().unwrap();
        assert_eq!(json, r#"{"type":"echo","message":"hello"}"#);
    }

    #[test]
    fn test_echo_keeps_client_text_verbatim() {
        let raw = r#"{"action":"INSERT"}"#;
        let json = ServerMessage::echo(raw).to_text().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["message"], raw);
    }
}
