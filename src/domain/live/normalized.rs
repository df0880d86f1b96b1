//! Normalized events delivered to clients, and the translators that build them.

use serde::{Deserialize, Serialize};

use super::events::{ChatEvent, GiftEvent, LiveEvent, RoomInfo, UserAction};

/// Message sent when a session could not even be constructed.
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred.";

/// Kind tag of a normalized event, as seen by clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Connected,
    Error,
    Follow,
    Share,
    Gift,
    Chat,
}

/// An event in the relay's client-facing vocabulary.
///
/// Constructed and sent immediately; never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedEvent {
    Connected { identifier: String, room_id: String },
    Error { message: String },
    Follow { unique_id: String },
    Share { unique_id: String },
    Gift {
        unique_id: String,
        gift_id: u64,
        repeat_count: u32,
    },
    Chat { unique_id: String, comment: String },
}

impl NormalizedEvent {
    /// Error reported when the upstream refused or could not be reached.
    pub fn connect_failed(identifier: &str) -> Self {
        NormalizedEvent::Error {
            message: format!(
                "Failed to connect to TikTok user \"{}\". Please check the username.",
                identifier
            ),
        }
    }

    /// Generic error for failures before any network I/O.
    pub fn internal_error() -> Self {
        NormalizedEvent::Error {
            message: INTERNAL_ERROR_MESSAGE.to_string(),
        }
    }

    /// Announcement that the upstream session is live.
    pub fn connected(identifier: &str, room: &RoomInfo) -> Self {
        NormalizedEvent::Connected {
            identifier: identifier.to_string(),
            room_id: room.room_id.clone(),
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            NormalizedEvent::Connected { .. } => EventKind::Connected,
            NormalizedEvent::Error { .. } => EventKind::Error,
            NormalizedEvent::Follow { .. } => EventKind::Follow,
            NormalizedEvent::Share { .. } => EventKind::Share,
            NormalizedEvent::Gift { .. } => EventKind::Gift,
            NormalizedEvent::Chat { .. } => EventKind::Chat,
        }
    }

    /// Human-readable text shown to the viewer.
    pub fn message(&self) -> String {
        match self {
            NormalizedEvent::Connected {
                identifier,
                room_id,
            } => format!("Connected to {} (room {})", identifier, room_id),
            NormalizedEvent::Error { message } => message.clone(),
            NormalizedEvent::Follow { unique_id } => format!("{} just followed!", unique_id),
            NormalizedEvent::Share { unique_id } => format!("{} shared the stream!", unique_id),
            NormalizedEvent::Gift {
                unique_id,
                gift_id,
                repeat_count,
            } => format!(
                "{} sent a gift: {} (x{})",
                unique_id, gift_id, repeat_count
            ),
            NormalizedEvent::Chat { unique_id, comment } => {
                format!("{} said: {}", unique_id, comment)
            }
        }
    }
}

/// Translates one upstream event into its normalized form.
///
/// Pure formatting: nothing is filtered, merged or buffered.
pub fn translate(event: LiveEvent) -> NormalizedEvent {
    match event {
        LiveEvent::Follow(UserAction { unique_id }) => NormalizedEvent::Follow { unique_id },
        LiveEvent::Share(UserAction { unique_id }) => NormalizedEvent::Share { unique_id },
        LiveEvent::Gift(GiftEvent {
            unique_id,
            gift_id,
            repeat_count,
        }) => NormalizedEvent::Gift {
            unique_id,
            gift_id,
            repeat_count,
        },
        LiveEvent::Chat(ChatEvent { unique_id, comment }) => {
            NormalizedEvent::Chat { unique_id, comment }
        }
    }
}
