//! WebSocket message types for the live relay.
//!
//! Defines the protocol between server and connected clients:
//! - Server → Client: one object per normalized event
//! - Client → Server: connect requests

use serde::{Deserialize, Serialize};

use crate::domain::live::{EventKind, NormalizedEvent};

// ============================================
// Server → Client Messages
// ============================================

/// Message sent to a client for every normalized event.
///
/// ```json
/// { "type": "chat", "data": { "message": "bob said: hi" } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerMessage {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub data: MessageData,
}

/// Payload of a [`ServerMessage`]. Only the message text is populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageData {
    pub message: String,
}

impl From<&NormalizedEvent> for ServerMessage {
    fn from(event: &NormalizedEvent) -> Self {
        Self {
            kind: event.kind(),
            data: MessageData {
                message: event.message(),
            },
        }
    }
}

impl From<NormalizedEvent> for ServerMessage {
    fn from(event: NormalizedEvent) -> Self {
        Self::from(&event)
    }
}

// ============================================
// Client → Server Messages
// ============================================

/// All message types that can be received from client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Start relaying the live stream of `username`.
    Connect {
        #[serde(default)]
        username: String,
    },
}

impl ClientMessage {
    /// Parses a text frame, returning `None` for anything malformed.
    ///
    /// Only JSON objects are accepted. Serde would otherwise also decode the
    /// positional form `["connect","alice"]`.
    pub fn parse(text: &str) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_str(text).ok()?;
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value).ok()
    }

    /// Identifier of a connect request, if it carries a usable one.
    pub fn connect_target(&self) -> Option<&str> {
        match self {
            ClientMessage::Connect { username } => {
                let username = username.trim();
                (!username.is_empty()).then_some(username)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn server_message_matches_wire_format() {
        let event = NormalizedEvent::Chat {
            unique_id: "bob".into(),
            comment: "hi".into(),
        };
        let value = serde_json::to_value(ServerMessage::from(event)).unwrap();
        assert_eq!(
            value,
            json!({"type": "chat", "data": {"message": "bob said: hi"}})
        );
    }

    #[test]
    fn error_message_serializes_with_error_type() {
        let value =
            serde_json::to_value(ServerMessage::from(NormalizedEvent::internal_error())).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["data"]["message"], "An internal error occurred.");
        assert_eq!(value["data"].as_object().unwrap().len(), 1);
    }

    #[test]
    fn gift_message_uses_gift_type() {
        let event = NormalizedEvent::Gift {
            unique_id: "carol".into(),
            gift_id: 5655,
            repeat_count: 2,
        };
        let json = serde_json::to_string(&ServerMessage::from(&event)).unwrap();
        assert!(json.contains(r#""type":"gift""#));
        assert!(json.contains("carol sent a gift: 5655 (x2)"));
    }

    #[test]
    fn parses_connect_request() {
        let msg = ClientMessage::parse(r#"{"type":"connect","username":"alice"}"#).unwrap();
        assert_eq!(msg.connect_target(), Some("alice"));
    }

    #[test]
    fn connect_target_is_trimmed() {
        let msg = ClientMessage::parse(r#"{"type":"connect","username":"  alice "}"#).unwrap();
        assert_eq!(msg.connect_target(), Some("alice"));
    }

    #[test]
    fn missing_or_blank_username_has_no_target() {
        let missing = ClientMessage::parse(r#"{"type":"connect"}"#).unwrap();
        assert_eq!(missing.connect_target(), None);

        let blank = ClientMessage::parse(r#"{"type":"connect","username":"   "}"#).unwrap();
        assert_eq!(blank.connect_target(), None);
    }

    #[test]
    fn malformed_frames_are_rejected() {
        assert!(ClientMessage::parse("not json").is_none());
        assert!(ClientMessage::parse(r#"{"type":"subscribe","username":"alice"}"#).is_none());
        assert!(ClientMessage::parse(r#"{"type":"connect","username":42}"#).is_none());
        assert!(ClientMessage::parse(r#"["connect","alice"]"#).is_none());
        assert!(ClientMessage::parse(r#"{"username":"alice"}"#).is_none());
    }

    #[test]
    fn non_object_frames_are_rejected() {
        for frame in [r#"["connect","alice"]"#, r#"["connect"]"#, r#""connect""#, "null", "7"] {
            assert!(ClientMessage::parse(frame).is_none(), "{frame}");
        }
    }

    #[test]
    fn extra_fields_are_ignored() {
        let msg =
            ClientMessage::parse(r#"{"type":"connect","username":"alice","room":"x"}"#).unwrap();
        assert_eq!(msg.connect_target(), Some("alice"));
    }
}
